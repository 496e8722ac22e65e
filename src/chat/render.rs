//! Output rendering for the chat application.
//!
//! A [`Renderer`] prints individual transcript entries and notices, and a
//! [`TranscriptView`] decides which entries still need printing after each
//! event.

use std::io::{self, Stdout, Write};

use time::OffsetDateTime;

use crate::chat::store::SessionSnapshot;
use crate::types::{DisplayMessage, ModelHistoryEntry, Sender};

/// ANSI escape code for bold text (used for sender labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for informational lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the bot label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the user label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering chat output.
pub trait Renderer: Send {
    /// Print one transcript entry.
    fn print_message(&mut self, message: &DisplayMessage);

    /// Print a transient error notice.  Never part of the transcript.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when the transcript was reset.
    fn print_cleared(&mut self);
}

/// Formats a transcript entry as `Label: text`.
pub fn format_message(message: &DisplayMessage, use_color: bool) -> String {
    let label = message.sender.label();
    if use_color {
        let color = match message.sender {
            Sender::User => ANSI_GREEN,
            Sender::Bot => ANSI_CYAN,
        };
        format!("{ANSI_BOLD}{color}{label}:{ANSI_RESET} {}", message.text)
    } else {
        format!("{label}: {}", message.text)
    }
}

/// Formats the model-facing history, one `role: text` line per entry.
pub fn format_history(history: &[ModelHistoryEntry]) -> String {
    if history.is_empty() {
        return "(history is empty)".to_string();
    }
    history
        .iter()
        .enumerate()
        .map(|(idx, entry)| format!("{:>3} {}: {}", idx + 1, entry.role, entry.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain text renderer with optional ANSI styling.
///
/// Transcript and info go to stdout, errors to stderr.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_message(&mut self, message: &DisplayMessage) {
        println!("{}", format_message(message, self.use_color));
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        if self.use_color {
            eprintln!("{ANSI_RED}{error}{ANSI_RESET}");
        } else {
            eprintln!("{error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        if self.use_color {
            println!("{ANSI_DIM}{info}{ANSI_RESET}");
        } else {
            println!("{info}");
        }
        self.flush();
    }

    fn print_cleared(&mut self) {
        self.print_info("--- Conversation cleared ---");
    }
}

/// Tracks how much of a session's transcript has been printed.
///
/// Call [`TranscriptView::render`] after every event.  New entries are
/// printed once; a reset is detected and announced before printing resumes.
#[derive(Debug, Default)]
pub struct TranscriptView {
    rendered: usize,
    session_started: Option<OffsetDateTime>,
}

impl TranscriptView {
    /// Creates a view that has printed nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries printed since the last reset.
    pub fn rendered(&self) -> usize {
        self.rendered
    }

    /// Prints whatever `snapshot` holds that this view has not printed yet.
    pub fn render(&mut self, snapshot: &SessionSnapshot, renderer: &mut dyn Renderer) {
        let reset = match self.session_started {
            Some(started) => {
                started != snapshot.created_at || snapshot.display.len() < self.rendered
            }
            None => false,
        };
        if reset {
            renderer.print_cleared();
            self.rendered = 0;
        }
        self.session_started = Some(snapshot.created_at);
        for message in &snapshot.display[self.rendered..] {
            renderer.print_message(message);
        }
        self.rendered = snapshot.display.len();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Captures everything rendered.
    #[derive(Default)]
    pub(crate) struct RecordingRenderer {
        pub(crate) lines: Vec<String>,
    }

    impl Renderer for RecordingRenderer {
        fn print_message(&mut self, message: &DisplayMessage) {
            self.lines.push(format_message(message, false));
        }

        fn print_error(&mut self, error: &str) {
            self.lines.push(format!("!{error}"));
        }

        fn print_info(&mut self, info: &str) {
            self.lines.push(info.to_string());
        }

        fn print_cleared(&mut self) {
            self.lines.push("<cleared>".to_string());
        }
    }

    fn snapshot(display: Vec<DisplayMessage>, created_at: OffsetDateTime) -> SessionSnapshot {
        SessionSnapshot {
            display,
            history: Vec::new(),
            pending: String::new(),
            created_at,
        }
    }

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
    }

    #[test]
    fn labels_follow_sender() {
        assert_eq!(
            format_message(&DisplayMessage::user("hi"), false),
            "You: hi"
        );
        assert_eq!(
            format_message(&DisplayMessage::bot("hello"), false),
            "Chatbot: hello"
        );
        assert!(format_message(&DisplayMessage::bot("hello"), true).contains(ANSI_CYAN));
    }

    #[test]
    fn history_lists_roles() {
        let history = vec![
            ModelHistoryEntry::user("question"),
            ModelHistoryEntry::model("hint"),
        ];
        assert_eq!(format_history(&history), "  1 user: question\n  2 model: hint");
        assert_eq!(format_history(&[]), "(history is empty)");
    }

    #[test]
    fn view_prints_only_new_entries() {
        let started = OffsetDateTime::now_utc();
        let mut view = TranscriptView::new();
        let mut out = RecordingRenderer::default();

        view.render(&snapshot(vec![DisplayMessage::user("a")], started), &mut out);
        view.render(
            &snapshot(
                vec![DisplayMessage::user("a"), DisplayMessage::bot("b")],
                started,
            ),
            &mut out,
        );
        view.render(
            &snapshot(
                vec![DisplayMessage::user("a"), DisplayMessage::bot("b")],
                started,
            ),
            &mut out,
        );
        assert_eq!(out.lines, vec!["You: a", "Chatbot: b"]);
        assert_eq!(view.rendered(), 2);
    }

    #[test]
    fn view_announces_reset() {
        let started = OffsetDateTime::now_utc();
        let mut view = TranscriptView::new();
        let mut out = RecordingRenderer::default();

        view.render(&snapshot(vec![DisplayMessage::user("a")], started), &mut out);
        view.render(&snapshot(Vec::new(), started), &mut out);
        view.render(&snapshot(vec![DisplayMessage::user("c")], started), &mut out);
        assert_eq!(out.lines, vec!["You: a", "<cleared>", "You: c"]);
    }

    #[test]
    fn view_detects_reset_by_session_start() {
        let started = OffsetDateTime::now_utc();
        let later = started + time::Duration::seconds(1);
        let mut view = TranscriptView::new();
        let mut out = RecordingRenderer::default();

        view.render(&snapshot(vec![DisplayMessage::user("a")], started), &mut out);
        view.render(&snapshot(vec![DisplayMessage::user("b")], later), &mut out);
        assert_eq!(out.lines, vec!["You: a", "<cleared>", "You: b"]);
    }
}
