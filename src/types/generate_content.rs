//! Request and response bodies of the `generateContent` call.

use serde::{Deserialize, Serialize};

use crate::types::{GenerationConfig, HistoryRole, ModelHistoryEntry};

/// A single text part of a content block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// The text of the part.  Non-text parts deserialize with no text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// A role-tagged block of parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// The author of the content; omitted for system instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<HistoryRole>,

    /// The parts making up the content.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Create a content block with a single text part.
    pub fn new(role: Option<HistoryRole>, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::text(text)],
        }
    }

    /// Concatenates the text of every part.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}

impl From<&ModelHistoryEntry> for Content {
    fn from(entry: &ModelHistoryEntry) -> Self {
        Content::new(Some(entry.role), entry.content.clone())
    }
}

/// The body posted to `models/{model}:generateContent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// The full conversation, oldest turn first.
    pub contents: Vec<Content>,

    /// Instruction applied to the whole conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,

    /// Sampling parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Builds a request that replays `history`, ending with `message`.
    ///
    /// `history` normally already ends with the user entry for `message`; if
    /// it does not, that entry is appended so the model always sees the
    /// question last.
    pub fn from_history(history: &[ModelHistoryEntry], message: &str) -> Self {
        let mut contents: Vec<Content> = history.iter().map(Content::from).collect();
        let ends_with_message = history
            .last()
            .map(|last| last.is_user() && last.content == message)
            .unwrap_or(false);
        if !ends_with_message {
            contents.push(Content::new(Some(HistoryRole::User), message));
        }
        Self {
            contents,
            system_instruction: None,
            generation_config: None,
        }
    }

    /// Sets the system instruction.
    pub fn with_system_instruction(mut self, instruction: Option<&str>) -> Self {
        self.system_instruction = instruction
            .filter(|text| !text.trim().is_empty())
            .map(|text| Content::new(None, text));
        self
    }

    /// Sets the sampling parameters.
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }
}

/// One generated reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The generated content, absent when generation was stopped early.
    #[serde(default)]
    pub content: Option<Content>,

    /// Why generation stopped, e.g. `STOP`, `MAX_TOKENS`, `SAFETY`.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Feedback about the prompt itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Set when the prompt was blocked.
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Token accounting for a request.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Tokens in the prompt, history included.
    #[serde(default)]
    pub prompt_token_count: u64,

    /// Tokens in the generated candidates.
    #[serde(default)]
    pub candidates_token_count: u64,

    /// Sum of prompt and candidate tokens.
    #[serde(default)]
    pub total_token_count: u64,
}

/// The body returned by `generateContent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Generated replies; the first one is used.
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    /// Prompt feedback, present when the prompt was filtered.
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,

    /// Token accounting.
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

/// What a response amounts to once interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The model replied with this text.
    Text(String),

    /// The prompt or reply was filtered for the given reason.
    Blocked(String),

    /// The response carried no candidates at all.
    Empty,
}

impl GenerateContentResponse {
    /// Interprets the response as a single completion.
    pub fn outcome(&self) -> CompletionOutcome {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.clone())
        {
            return CompletionOutcome::Blocked(reason);
        }
        let Some(candidate) = self.candidates.first() else {
            return CompletionOutcome::Empty;
        };
        let text = candidate
            .content
            .as_ref()
            .map(Content::text)
            .unwrap_or_default();
        if text.is_empty() {
            let reason = candidate
                .finish_reason
                .clone()
                .unwrap_or_else(|| "NO_TEXT".to_string());
            return CompletionOutcome::Blocked(reason);
        }
        CompletionOutcome::Text(text)
    }
}
