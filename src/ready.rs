//! Readiness watch — attach-when-available guard.
//!
//! The console must not become interactive before its collaborator exists
//! (in the shipped binary: before the eval endpoint accepts connections).
//! A `Watch` is an explicit state machine driven by external check ticks;
//! `wait_for` is the blocking driver that ticks it at a fixed interval.
//!
//! ## State machine
//!
//! ```text
//! SEARCHING → probe succeeded          → FOUND (value handed out once)
//! SEARCHING → deadline passed          → TIMED_OUT (observable error)
//! FOUND / TIMED_OUT                    → terminal, further ticks are no-ops
//! ```

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, trace};

/// Interval between probe attempts.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default window during which the target may still appear.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(6000);

/// The watched target never appeared inside the timeout window.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{target} did not become available within {timeout_ms} ms")]
pub struct WaitTimeout {
    pub target: String,
    pub timeout_ms: u64,
}

/// Watch states. Terminal states absorb further checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Target not seen yet, deadline not reached.
    Searching,
    /// The probe succeeded; the value was handed to the caller.
    Found,
    /// The deadline passed without the probe ever succeeding.
    TimedOut,
}

/// One outstanding readiness watch.
///
/// The deadline is fixed at the first `check` call and never reset by
/// retries. A probe runs at most once per tick and never after the watch
/// reached a terminal state, so the success value is produced at most once.
pub struct Watch {
    target: String,
    timeout: Duration,
    started: Option<Instant>,
    state: WatchState,
}

impl Watch {
    pub fn new(target: impl Into<String>, timeout: Duration) -> Self {
        Self {
            target: target.into(),
            timeout,
            started: None,
            state: WatchState::Searching,
        }
    }

    /// Get the current state.
    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Name of the watched target (diagnostics only).
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Run one check tick.
    ///
    /// Probes first, then evaluates the deadline — a target that appears on
    /// the very last scheduled check is still found. Returns the probe value
    /// on the transition to `Found`, `None` otherwise.
    pub fn check<T>(&mut self, probe: impl FnOnce() -> Option<T>) -> Option<T> {
        if self.state != WatchState::Searching {
            return None;
        }

        let started = *self.started.get_or_insert_with(Instant::now);

        if let Some(value) = probe() {
            debug!(watch = %self.target, elapsed_ms = started.elapsed().as_millis() as u64, "target found");
            self.state = WatchState::Found;
            return Some(value);
        }

        if started.elapsed() >= self.timeout {
            debug!(watch = %self.target, timeout_ms = self.timeout.as_millis() as u64, "watch timed out");
            self.state = WatchState::TimedOut;
        } else {
            trace!(watch = %self.target, "target not present yet");
        }
        None
    }
}

/// Block until `probe` yields a value, checking every [`POLL_INTERVAL`].
///
/// The first check runs immediately; when it succeeds no sleep is ever
/// scheduled. The timeout window is measured from the first attempt.
pub fn wait_for<T>(
    target: &str,
    probe: impl FnMut() -> Option<T>,
    timeout: Duration,
) -> Result<T, WaitTimeout> {
    wait_for_every(target, probe, timeout, POLL_INTERVAL)
}

/// [`wait_for`] with a caller-chosen check interval.
pub fn wait_for_every<T>(
    target: &str,
    mut probe: impl FnMut() -> Option<T>,
    timeout: Duration,
    interval: Duration,
) -> Result<T, WaitTimeout> {
    let mut watch = Watch::new(target, timeout);
    loop {
        if let Some(value) = watch.check(&mut probe) {
            return Ok(value);
        }
        if watch.state() == WatchState::TimedOut {
            return Err(WaitTimeout {
                target: target.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        std::thread::sleep(interval);
    }
}
