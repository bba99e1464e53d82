use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "evalcon",
    about = "Interactive console for a remote eval endpoint",
    version
)]
pub struct Cli {
    /// Eval endpoint URL (overrides config)
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Run a single command, print its outcome, and exit
    #[arg(short = 'e', long = "eval", value_name = "COMMAND")]
    pub eval: Option<String>,

    /// Readiness timeout in milliseconds (overrides config)
    #[arg(long, value_name = "MS")]
    pub ready_timeout_ms: Option<u64>,

    /// Skip the endpoint readiness probe
    #[arg(long)]
    pub no_wait: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
