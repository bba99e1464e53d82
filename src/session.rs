//! Console session — input wiring, request correlation, transcript ordering.
//!
//! The session owns the transcript and a table of in-flight commands. A
//! submission appends its Command entry synchronously (so command order is
//! always submission order), then hands the request to a worker thread; the
//! classified outcome comes back over the session's event channel whenever
//! the call actually finishes. Completions are not serialized — slow
//! responses may land after later commands, and each pending command is
//! consumed exactly once.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::Instant;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::eval::{EvalOutcome, EvalTransport};
use crate::transcript::{EntryKind, Transcript, TranscriptView};

/// Events the session's loop runs on. Produced by the stdin pump, the
/// request worker threads, and the Ctrl-C handler.
#[derive(Debug)]
pub enum ConsoleEvent {
    /// The user submitted one input line.
    Line(String),
    /// A request worker finished and classified its outcome.
    Completed(Completion),
    /// Stdin reached EOF.
    InputClosed,
    /// Ctrl-C.
    Interrupted,
}

/// A finished request, keyed back to the command that issued it.
#[derive(Debug)]
pub struct Completion {
    pub sequence: u64,
    pub outcome: EvalOutcome,
}

/// One in-flight request, correlated to the command text that produced it.
/// Created at submission, consumed exactly once at resolution.
#[derive(Debug)]
struct PendingCommand {
    command_text: String,
    issued_at: Instant,
}

pub struct ConsoleSession<V: TranscriptView> {
    transcript: Transcript,
    view: V,
    transport: Arc<dyn EvalTransport>,
    events: Sender<ConsoleEvent>,
    pending: HashMap<u64, PendingCommand>,
}

impl<V: TranscriptView> ConsoleSession<V> {
    /// Build a session around explicit handles: the view it renders to, the
    /// transport it issues requests through, and the sender its workers
    /// report completions on.
    pub fn new(view: V, transport: Arc<dyn EvalTransport>, events: Sender<ConsoleEvent>) -> Self {
        Self {
            transcript: Transcript::new(),
            view,
            transport,
            events,
            pending: HashMap::new(),
        }
    }

    /// Submit one command.
    ///
    /// Empty input is a no-op: no transcript entry, no request. Otherwise the
    /// Command entry is appended before this returns, and exactly one request
    /// is issued on a worker thread. Returns the entry's sequence number,
    /// which the eventual [`Completion`] will carry back.
    pub fn submit(&mut self, text: &str) -> Option<u64> {
        if text.is_empty() {
            return None;
        }

        let sequence = self.append(EntryKind::Command, text.to_string());
        self.pending.insert(
            sequence,
            PendingCommand {
                command_text: text.to_string(),
                issued_at: Instant::now(),
            },
        );
        debug!(sequence, "command submitted");

        let transport = Arc::clone(&self.transport);
        let events = self.events.clone();
        let command = text.to_string();
        thread::spawn(move || {
            let outcome = transport.eval(&command);
            // The loop may already be gone during teardown; nothing to do then.
            let _ = events.send(ConsoleEvent::Completed(Completion { sequence, outcome }));
        });

        Some(sequence)
    }

    /// Apply one completion to the transcript.
    ///
    /// A completion with no matching pending command (already consumed, or
    /// never issued) is dropped with a warning.
    pub fn resolve(&mut self, completion: Completion) {
        let Some(pending) = self.pending.remove(&completion.sequence) else {
            warn!(sequence = completion.sequence, "completion without a pending command");
            return;
        };
        let elapsed_ms = pending.issued_at.elapsed().as_millis() as u64;

        match completion.outcome {
            EvalOutcome::Success { body } => {
                debug!(sequence = completion.sequence, elapsed_ms, "command succeeded");
                self.append(EntryKind::Response, body);
            }
            EvalOutcome::NoResponse => {
                debug!(sequence = completion.sequence, elapsed_ms, "no response");
                self.append(
                    EntryKind::Error,
                    format!(
                        "no response received for command: {}",
                        pending.command_text
                    ),
                );
            }
            EvalOutcome::Unclassified { status } => {
                warn!(sequence = completion.sequence, status, elapsed_ms, "unexpected status");
                self.append(
                    EntryKind::Error,
                    format!(
                        "unexpected status {status} for command: {}",
                        pending.command_text
                    ),
                );
            }
        }
    }

    fn append(&mut self, kind: EntryKind, text: String) -> u64 {
        let entry = self.transcript.append(kind, text);
        let sequence = entry.sequence;
        self.view.render(entry);
        sequence
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Number of commands still waiting for their outcome.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// Interactive loop: apply events until the user interrupts, or until input
/// closed and every in-flight command has resolved.
pub fn run<V: TranscriptView>(
    mut session: ConsoleSession<V>,
    events: Receiver<ConsoleEvent>,
) -> Result<()> {
    let mut input_open = true;
    for event in &events {
        match event {
            ConsoleEvent::Line(line) => {
                session.submit(&line);
            }
            ConsoleEvent::Completed(completion) => {
                session.resolve(completion);
                if !input_open && session.pending_count() == 0 {
                    break;
                }
            }
            ConsoleEvent::InputClosed => {
                input_open = false;
                if session.pending_count() == 0 {
                    break;
                }
            }
            ConsoleEvent::Interrupted => {
                info!("interrupted, leaving console");
                break;
            }
        }
    }
    Ok(())
}

/// One-shot mode: submit a single command, wait for its outcome, and fail
/// the process if the transcript ends on an Error entry.
pub fn run_once<V: TranscriptView>(
    mut session: ConsoleSession<V>,
    events: Receiver<ConsoleEvent>,
    command: &str,
) -> Result<()> {
    session.submit(command);
    while session.pending_count() > 0 {
        match events.recv() {
            Ok(ConsoleEvent::Completed(completion)) => session.resolve(completion),
            Ok(_) => {}
            Err(_) => break,
        }
    }

    match session.transcript().entries().last() {
        Some(entry) if entry.kind == EntryKind::Error => {
            anyhow::bail!("command failed: {}", entry.text)
        }
        _ => Ok(()),
    }
}
