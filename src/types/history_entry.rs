use std::fmt;

use serde::{Deserialize, Serialize};

/// Role tag of a model-facing history entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    /// A turn written by the user.
    User,

    /// A turn written by the model.
    Model,
}

impl fmt::Display for HistoryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryRole::User => f.write_str("user"),
            HistoryRole::Model => f.write_str("model"),
        }
    }
}

/// One role-tagged turn of the conversation as it is replayed to the model.
///
/// The remote side keeps no state between calls, so the whole sequence of
/// entries is sent with every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelHistoryEntry {
    /// Whose turn this is.
    pub role: HistoryRole,

    /// The text of the turn.
    pub content: String,
}

impl ModelHistoryEntry {
    /// Create a new `ModelHistoryEntry`.
    pub fn new(role: HistoryRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user entry.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(HistoryRole::User, content)
    }

    /// Create a model entry.
    pub fn model(content: impl Into<String>) -> Self {
        Self::new(HistoryRole::Model, content)
    }

    /// True for entries written by the user.
    pub fn is_user(&self) -> bool {
        self.role == HistoryRole::User
    }
}

/// Counts user entries that have no model entry directly after them.
///
/// Each failed round trip leaves one such entry behind.
pub fn orphaned_user_entries(history: &[ModelHistoryEntry]) -> usize {
    history
        .iter()
        .enumerate()
        .filter(|(idx, entry)| {
            entry.is_user()
                && history
                    .get(idx + 1)
                    .map(|next| next.role != HistoryRole::Model)
                    .unwrap_or(true)
        })
        .count()
}
