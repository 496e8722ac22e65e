//! The tutoring chat: session state, the round-trip controller, and the
//! pieces of the terminal front end.
//!
//! - [`store`]: per-session display log, model history and pending input
//! - [`controller`]: submit and reset, with their ordering and failure rules
//! - [`interrupt`]: cancelling a request in flight
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: slash command parsing
//! - [`render`]: transcript and notice output

pub mod commands;
pub mod config;
pub mod controller;
pub mod interrupt;
pub mod render;
pub mod store;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, TUTOR_INSTRUCTIONS};
pub use controller::{ChatController, ChatStats, SubmitOutcome, failure_notice};
pub use interrupt::Interrupt;
pub use render::{PlainTextRenderer, Renderer, TranscriptView, format_history, format_message};
pub use store::{SessionId, SessionRegistry, SessionSnapshot, SessionStore};
