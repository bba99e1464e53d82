use std::io::{BufRead, IsTerminal, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use evalcon::cli::Cli;
use evalcon::config::ConsoleConfig;
use evalcon::eval::{self, HttpEvalClient};
use evalcon::ready;
use evalcon::session::{self, ConsoleEvent, ConsoleSession};
use evalcon::transcript::TerminalView;

fn verbosity_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "evalcon=info",
        1 => "evalcon=debug",
        _ => "evalcon=trace",
    }
}

/// Forward stdin lines to the session loop, one event per submitted line.
/// Sends `InputClosed` on EOF so the loop can drain in-flight commands.
fn spawn_input_pump(events: Sender<ConsoleEvent>) {
    thread::spawn(move || {
        let interactive = std::io::stdin().is_terminal();
        let stdin = std::io::stdin();
        let mut lines = stdin.lock().lines();
        loop {
            if interactive {
                let mut out = std::io::stdout();
                let _ = write!(out, "evalcon> ");
                let _ = out.flush();
            }
            match lines.next() {
                Some(Ok(line)) => {
                    if events.send(ConsoleEvent::Line(line)).is_err() {
                        return;
                    }
                }
                Some(Err(_)) | None => break,
            }
        }
        let _ = events.send(ConsoleEvent::InputClosed);
    });
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(verbosity_filter(cli.verbose))
        .with_target(false)
        .init();

    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let (config, config_path) = ConsoleConfig::load(&cwd)?;
    match config_path {
        Some(ref p) => info!("loaded config from {}", p.display()),
        None => debug!("no .evalcon/config.toml found, using defaults"),
    }

    let endpoint = cli.endpoint.unwrap_or(config.endpoint.url);
    let ready_timeout =
        Duration::from_millis(cli.ready_timeout_ms.unwrap_or(config.readiness.timeout_ms));
    let poll_interval = Duration::from_millis(config.readiness.poll_interval_ms);

    if !cli.no_wait {
        let authority = eval::authority(&endpoint)
            .with_context(|| format!("cannot derive host and port from endpoint '{endpoint}'"))?;
        info!("waiting for eval endpoint at {authority}");
        ready::wait_for_every(
            "eval endpoint",
            || TcpStream::connect(&authority).ok(),
            ready_timeout,
            poll_interval,
        )
        .with_context(|| format!("eval endpoint {endpoint} is not reachable"))?;
    }

    let transport = Arc::new(HttpEvalClient::new(
        endpoint,
        Duration::from_secs(config.endpoint.request_timeout_secs),
    ));
    let (tx, rx) = mpsc::channel();
    let session = ConsoleSession::new(TerminalView::stdout(), transport, tx.clone());

    if let Some(command) = cli.eval {
        drop(tx);
        return session::run_once(session, rx, &command);
    }

    let interrupt_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(ConsoleEvent::Interrupted);
    })
    .context("failed to install Ctrl-C handler")?;

    spawn_input_pump(tx);
    session::run(session, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_env_filter() {
        assert_eq!(verbosity_filter(0), "evalcon=info");
        assert_eq!(verbosity_filter(1), "evalcon=debug");
        assert_eq!(verbosity_filter(2), "evalcon=trace");
        assert_eq!(verbosity_filter(9), "evalcon=trace");
    }
}
