// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod observability;
pub mod secrets;
pub mod types;

// Re-exports
pub use client::{Gemini, ModelClient};
pub use client_logger::{ClientLogger, TracingLogger};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use types::*;
