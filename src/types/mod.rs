// Public modules
pub mod display_message;
pub mod generate_content;
pub mod generation_config;
pub mod history_entry;
pub mod model;

// Re-exports
pub use display_message::{DisplayMessage, Sender};
pub use generate_content::{
    Candidate, CompletionOutcome, Content, GenerateContentRequest, GenerateContentResponse, Part,
    PromptFeedback, UsageMetadata,
};
pub use generation_config::GenerationConfig;
pub use history_entry::{HistoryRole, ModelHistoryEntry, orphaned_user_entries};
pub use model::{KnownModel, Model};
