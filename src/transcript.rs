//! Append-only transcript of the console session.
//!
//! Every submitted command and every resolved outcome becomes exactly one
//! entry. Entries are immutable once appended and the log is never reordered
//! or edited; `sequence` numbers are assigned monotonically at append time
//! and double as the correlation key for in-flight requests.

use std::io::{self, Write};

/// What a transcript line represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Text the user submitted.
    Command,
    /// Successful output returned by the eval endpoint.
    Response,
    /// A failure rendered to the user.
    Error,
}

/// One rendered transcript line.
///
/// `text` is carried verbatim — the transcript trusts its own input and
/// performs no escaping or rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub kind: EntryKind,
    pub text: String,
    pub sequence: u64,
}

/// The ordered, append-only entry log.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    next_sequence: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry and return a reference to it.
    pub fn append(&mut self, kind: EntryKind, text: String) -> &TranscriptEntry {
        let entry = TranscriptEntry {
            kind,
            text,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.entries.push(entry);
        self.entries.last().expect("entry was just pushed")
    }

    /// All entries, in append order.
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rendering seam between the session and whatever displays the transcript.
///
/// Handed to the session at construction time, so the session never reaches
/// for an ambient output surface and tests can capture rendering verbatim.
pub trait TranscriptView {
    /// Called once per appended entry, in append order.
    fn render(&mut self, entry: &TranscriptEntry);
}

/// Terminal renderer — writes each entry as the last line of output, so the
/// newest entry is always the one in view.
pub struct TerminalView<W: Write> {
    out: W,
}

impl TerminalView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the view, handing back the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TranscriptView for TerminalView<W> {
    fn render(&mut self, entry: &TranscriptEntry) {
        let result = match entry.kind {
            EntryKind::Command => writeln!(self.out, ">  {}", entry.text),
            EntryKind::Response => writeln!(self.out, "{}", entry.text),
            EntryKind::Error => writeln!(self.out, "(error) {}", entry.text),
        };
        if result.is_ok() {
            let _ = self.out.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sequences_are_monotonic_from_zero() {
        let mut transcript = Transcript::new();
        let first = transcript.append(EntryKind::Command, "ping".to_string()).sequence;
        let second = transcript.append(EntryKind::Response, "PONG".to_string()).sequence;
        let third = transcript.append(EntryKind::Error, "boom".to_string()).sequence;

        assert_eq!((first, second, third), (0, 1, 2));
    }

    #[test]
    fn entries_keep_append_order() {
        let mut transcript = Transcript::new();
        transcript.append(EntryKind::Command, "get a".to_string());
        transcript.append(EntryKind::Response, "1".to_string());

        let kinds: Vec<EntryKind> = transcript.entries().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EntryKind::Command, EntryKind::Response]);
    }

    #[test]
    fn text_is_passed_through_verbatim() {
        let mut transcript = Transcript::new();
        let raw = "<span class=\"black\">get a</span>";
        let entry = transcript.append(EntryKind::Command, raw.to_string());
        assert_eq!(entry.text, raw);
    }

    #[test]
    fn terminal_view_prefixes_by_kind() {
        let mut view = TerminalView::new(Vec::new());
        view.render(&TranscriptEntry {
            kind: EntryKind::Command,
            text: "get a".to_string(),
            sequence: 0,
        });
        view.render(&TranscriptEntry {
            kind: EntryKind::Response,
            text: "1".to_string(),
            sequence: 1,
        });
        view.render(&TranscriptEntry {
            kind: EntryKind::Error,
            text: "no response received for command: get a".to_string(),
            sequence: 2,
        });

        let rendered = String::from_utf8(view.into_inner()).unwrap();
        assert_eq!(
            rendered,
            ">  get a\n1\n(error) no response received for command: get a\n"
        );
    }

    fn arb_kind() -> impl Strategy<Value = EntryKind> {
        prop_oneof![
            Just(EntryKind::Command),
            Just(EntryKind::Response),
            Just(EntryKind::Error),
        ]
    }

    proptest! {
        #[test]
        fn appending_n_entries_yields_n_unmutated_entries(
            items in proptest::collection::vec((arb_kind(), ".*"), 0..64)
        ) {
            let mut transcript = Transcript::new();
            for (kind, text) in &items {
                transcript.append(*kind, text.clone());
            }

            prop_assert_eq!(transcript.len(), items.len());
            for (i, entry) in transcript.entries().iter().enumerate() {
                prop_assert_eq!(entry.sequence, i as u64);
                prop_assert_eq!(entry.kind, items[i].0);
                prop_assert_eq!(&entry.text, &items[i].1);
            }
        }
    }
}
