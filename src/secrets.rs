//! Retrieval of the model service credential.
//!
//! The key comes from a YAML secrets file when one is named, otherwise from
//! the `GEMINI_API_KEY` environment variable.  A missing or blank key is an
//! [`Error::Config`], which the binary treats as fatal before it serves.

use std::env;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Layout of the secrets file.
///
/// ```yaml
/// gemini_api_key: "AIza..."
/// ```
#[derive(Debug, Deserialize)]
struct SecretsFile {
    #[serde(alias = "GEMINI_API_KEY")]
    gemini_api_key: Option<String>,
}

/// Rejects blank keys and strips surrounding whitespace.
pub fn validate_api_key(key: String) -> Result<String> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(Error::config(format!("{API_KEY_ENV} is empty")));
    }
    Ok(trimmed.to_string())
}

/// Reads the key from the environment.
pub fn api_key_from_env() -> Result<String> {
    let key = env::var(API_KEY_ENV)
        .map_err(|_| Error::config(format!("{API_KEY_ENV} is not set")))?;
    validate_api_key(key)
}

/// Reads the key from a YAML secrets file.
pub fn api_key_from_file(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        Error::config(format!(
            "cannot read secrets file {}: {err}",
            path.display()
        ))
    })?;
    let secrets: SecretsFile = serde_yaml::from_str(&content).map_err(|err| {
        Error::config(format!(
            "cannot parse secrets file {}: {err}",
            path.display()
        ))
    })?;
    let key = secrets.gemini_api_key.ok_or_else(|| {
        Error::config(format!(
            "gemini_api_key is not set in {}",
            path.display()
        ))
    })?;
    validate_api_key(key)
}

/// Resolves the key: the secrets file if given, else the environment.
pub fn resolve_api_key(secrets_file: Option<&Path>) -> Result<String> {
    match secrets_file {
        Some(path) => api_key_from_file(path),
        None => api_key_from_env(),
    }
}
