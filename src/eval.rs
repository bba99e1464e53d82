//! Eval endpoint transport.
//!
//! One blocking POST per command, body `{"value": "<command>"}`, declared as
//! JSON. No retries, no request IDs, no streaming. The outcome of a call is
//! classified into three explicit states; "still pending" never appears here
//! because a call only returns once it has actually finished.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

/// JSON body of one eval request.
#[derive(Debug, Serialize)]
struct EvalRequest<'a> {
    value: &'a str,
}

/// Classified result of one round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalOutcome {
    /// HTTP 200 — the body is the literal command output.
    Success { body: String },
    /// The request never reached the server or no response came back
    /// (connection refused, DNS failure, timeout).
    NoResponse,
    /// The server answered, but with something other than 200.
    Unclassified { status: u16 },
}

/// Transport seam between the console session and the network.
///
/// The session only ever sees classified outcomes, which keeps it fully
/// testable against a fake transport.
pub trait EvalTransport: Send + Sync {
    fn eval(&self, command: &str) -> EvalOutcome;
}

/// The real transport — a blocking ureq client against a fixed endpoint URL.
pub struct HttpEvalClient {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpEvalClient {
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(request_timeout).build(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl EvalTransport for HttpEvalClient {
    fn eval(&self, command: &str) -> EvalOutcome {
        let result = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .send_json(EvalRequest { value: command });

        match result {
            Ok(response) => {
                let status = response.status();
                match response.into_string() {
                    Ok(body) if status == 200 => EvalOutcome::Success { body },
                    Ok(_) => EvalOutcome::Unclassified { status },
                    Err(e) => {
                        debug!("failed to read response body: {e}");
                        EvalOutcome::NoResponse
                    }
                }
            }
            Err(ureq::Error::Status(status, _)) => EvalOutcome::Unclassified { status },
            Err(ureq::Error::Transport(e)) => {
                debug!("transport failure: {e}");
                EvalOutcome::NoResponse
            }
        }
    }
}

/// Extract `host:port` from an endpoint URL, for TCP reachability probes.
/// Defaults the port from the scheme when the URL does not carry one.
pub fn authority(endpoint: &str) -> Option<String> {
    let (default_port, rest) = if let Some(rest) = endpoint.strip_prefix("https://") {
        (443u16, rest)
    } else if let Some(rest) = endpoint.strip_prefix("http://") {
        (80u16, rest)
    } else {
        (80u16, endpoint)
    };

    let host = rest.split('/').next().unwrap_or("");
    if host.is_empty() {
        return None;
    }
    if host.contains(':') {
        Some(host.to_string())
    } else {
        Some(format!("{host}:{default_port}"))
    }
}
