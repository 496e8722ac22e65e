use serde::{Deserialize, Serialize};

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Default nucleus sampling value.
pub const DEFAULT_TOP_P: f32 = 0.95;

/// Default top-k sampling limit.
pub const DEFAULT_TOP_K: u32 = 64;

/// Default maximum tokens per reply.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;

/// Default MIME type requested for replies.
pub const DEFAULT_RESPONSE_MIME_TYPE: &str = "text/plain";

/// Sampling parameters sent with every request.
///
/// Unset values are omitted from the request so the service applies its
/// own defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling probability mass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Number of highest-probability tokens considered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Maximum tokens in the reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// MIME type of the reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}

impl GenerationConfig {
    /// Creates a config with every field unset.
    pub fn empty() -> Self {
        Self {
            temperature: None,
            top_p: None,
            top_k: None,
            max_output_tokens: None,
            response_mime_type: None,
        }
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the top-p value.
    pub fn with_top_p(mut self, top_p: Option<f32>) -> Self {
        self.top_p = top_p;
        self
    }

    /// Sets the top-k value.
    pub fn with_top_k(mut self, top_k: Option<u32>) -> Self {
        self.top_k = top_k;
        self
    }

    /// Sets the maximum tokens per reply.
    pub fn with_max_output_tokens(mut self, max_output_tokens: Option<u32>) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Sets the reply MIME type.
    pub fn with_response_mime_type(mut self, mime_type: Option<String>) -> Self {
        self.response_mime_type = mime_type;
        self
    }
}

impl Default for GenerationConfig {
    /// The sampling parameters the tutor was tuned with.
    fn default() -> Self {
        Self {
            temperature: Some(DEFAULT_TEMPERATURE),
            top_p: Some(DEFAULT_TOP_P),
            top_k: Some(DEFAULT_TOP_K),
            max_output_tokens: Some(DEFAULT_MAX_OUTPUT_TOKENS),
            response_mime_type: Some(DEFAULT_RESPONSE_MIME_TYPE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_serialization() {
        let json = serde_json::to_value(GenerationConfig::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "temperature": 0.3f32,
                "topP": 0.95f32,
                "topK": 64,
                "maxOutputTokens": 8192,
                "responseMimeType": "text/plain",
            })
        );
    }

    #[test]
    fn unset_fields_are_omitted() {
        let config = GenerationConfig::empty().with_top_k(Some(40));
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"topK":40}"#);
    }
}
