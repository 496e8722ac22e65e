//! Logging trait for model client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! every request and response passing through the [`Gemini`](crate::Gemini)
//! client, and [`TracingLogger`], which forwards them to `tracing`.

use crate::{Error, GenerateContentRequest, GenerateContentResponse, Model};

/// A trait for logging model client operations.
///
/// Implement this trait to record API interactions.  All methods are called
/// on the request path, so implementations should not block.
pub trait ClientLogger: Send + Sync {
    /// Log a request just before it is sent.
    fn log_request(&self, model: &Model, request: &GenerateContentRequest);

    /// Log a successfully decoded response.
    fn log_response(&self, model: &Model, response: &GenerateContentResponse);

    /// Log a failed request.
    fn log_error(&self, model: &Model, error: &Error);
}

/// Forwards client operations to `tracing` at debug level.
///
/// Message text is never logged, only its shape.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl ClientLogger for TracingLogger {
    fn log_request(&self, model: &Model, request: &GenerateContentRequest) {
        tracing::debug!(
            model = %model,
            turns = request.contents.len(),
            has_system_instruction = request.system_instruction.is_some(),
            "sending generateContent request"
        );
    }

    fn log_response(&self, model: &Model, response: &GenerateContentResponse) {
        let usage = response.usage_metadata.unwrap_or_default();
        tracing::debug!(
            model = %model,
            candidates = response.candidates.len(),
            prompt_tokens = usage.prompt_token_count,
            reply_tokens = usage.candidates_token_count,
            "received generateContent response"
        );
    }

    fn log_error(&self, model: &Model, error: &Error) {
        tracing::warn!(
            model = %model,
            status = ?error.status_code(),
            retryable = error.is_retryable(),
            "generateContent failed: {error}"
        );
    }
}
