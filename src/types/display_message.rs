use std::fmt;

use serde::{Deserialize, Serialize};

/// Who authored a line of the transcript.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sender {
    /// The person asking questions.
    User,

    /// The tutoring model.
    Bot,
}

impl Sender {
    /// The label shown in front of the message in the transcript.
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Bot => "Chatbot",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of the UI-facing transcript.
///
/// Display messages are append-only; once pushed onto a session they are
/// never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMessage {
    /// The author of the message.
    pub sender: Sender,

    /// The message text exactly as submitted or received.
    pub text: String,
}

impl DisplayMessage {
    /// Create a new `DisplayMessage`.
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }

    /// Create a message authored by the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    /// Create a message authored by the bot.
    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }
}
