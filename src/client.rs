use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_BLOCKED_RESPONSES, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS,
};
use crate::secrets;
use crate::types::{
    CompletionOutcome, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Model,
    ModelHistoryEntry,
};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The request/response facade the chat controller talks to.
///
/// Implementations keep no conversation state: `history` is the complete
/// model-facing history, already ending with the user entry for `message`,
/// and it is replayed in full on every call.
#[async_trait::async_trait]
pub trait ModelClient: Send + Sync {
    /// Returns the model's reply to `message` given `history`.
    async fn complete(&self, history: &[ModelHistoryEntry], message: &str) -> Result<String>;
}

/// Client for the Gemini `generateContent` API.
///
/// The system instruction and sampling parameters are fixed when the client
/// is built and sent with every request.
#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
    model: Model,
    system_instruction: Option<String>,
    generation_config: GenerationConfig,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl std::fmt::Debug for Gemini {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gemini")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("model", &self.model)
            .field("generation_config", &self.generation_config)
            .finish_non_exhaustive()
    }
}

impl Gemini {
    /// Create a new Gemini client.
    ///
    /// The API key can be provided directly or read from the GEMINI_API_KEY
    /// environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => secrets::validate_api_key(key)?,
            None => secrets::api_key_from_env()?,
        };

        let base_url = normalize_base_url(base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
            model: Model::default(),
            system_instruction: None,
            generation_config: GenerationConfig::default(),
            logger: None,
        })
    }

    /// Sets the model used for every request.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the system instruction sent with every request.
    pub fn with_system_instruction(mut self, instruction: Option<String>) -> Self {
        self.system_instruction = instruction;
        self
    }

    /// Sets the sampling parameters sent with every request.
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = config;
        self
    }

    /// Attaches a logger that observes every request and response.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Returns the configured model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| Error::config("API key contains characters not allowed in a header"))?;
        headers.insert("x-goog-api-key", key);
        Ok(headers)
    }

    /// Builds the request body for one round trip.
    pub fn build_request(
        &self,
        history: &[ModelHistoryEntry],
        message: &str,
    ) -> GenerateContentRequest {
        GenerateContentRequest::from_history(history, message)
            .with_system_instruction(self.system_instruction.as_deref())
            .with_generation_config(self.generation_config.clone())
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        match response.text().await {
            Ok(body) => error_from_status(status_code, &body, retry_after),
            Err(e) => Error::http_client(
                format!("Failed to read error response: {}", e),
                Some(Box::new(e)),
            ),
        }
    }

    /// Send a request to the API and return the decoded response.
    pub async fn send(&self, request: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        let url = format!("{}models/{}:generateContent", self.base_url, self.model);

        if let Some(logger) = &self.logger {
            logger.log_request(&self.model, request);
        }

        let response = self
            .client
            .post(&url)
            .headers(self.default_headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {}", e),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        tracing::debug!(status = response.status().as_u16(), "generateContent returned");
        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        let decoded = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| {
                Error::serialization(
                    format!("Failed to parse response: {}", e),
                    Some(Box::new(e)),
                )
            })?;
        if let Some(logger) = &self.logger {
            logger.log_response(&self.model, &decoded);
        }
        Ok(decoded)
    }
}

#[async_trait::async_trait]
impl ModelClient for Gemini {
    async fn complete(&self, history: &[ModelHistoryEntry], message: &str) -> Result<String> {
        let request = self.build_request(history, message);
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = self.send(&request).await.and_then(completion_text);
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            CLIENT_REQUEST_ERRORS.click();
            if err.is_blocked() {
                CLIENT_BLOCKED_RESPONSES.click();
            }
            if let Some(logger) = &self.logger {
                logger.log_error(&self.model, err);
            }
        }
        result
    }
}

/// Extracts the reply text from a decoded response.
pub fn completion_text(response: GenerateContentResponse) -> Result<String> {
    match response.outcome() {
        CompletionOutcome::Text(text) => Ok(text),
        CompletionOutcome::Blocked(reason) => Err(Error::blocked(
            "the model did not return any text for this message",
            reason,
        )),
        CompletionOutcome::Empty => Err(Error::serialization(
            "response contained no candidates",
            None,
        )),
    }
}

/// Maps a non-success HTTP status and its body onto an [`Error`].
pub fn error_from_status(status_code: u16, body: &str, retry_after: Option<u64>) -> Error {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: Option<ErrorDetail>,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
        status: Option<String>,
        #[serde(default)]
        details: Vec<serde_json::Value>,
    }

    let parsed = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error);
    let status = parsed.as_ref().and_then(|e| e.status.clone());
    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| body.trim().to_string());
    let key_invalid = parsed
        .as_ref()
        .map(|e| {
            e.details
                .iter()
                .any(|d| d.get("reason").and_then(|r| r.as_str()) == Some("API_KEY_INVALID"))
        })
        .unwrap_or(false);

    // Gemini reports a bad key as a 400 with a reason in the details.
    if key_invalid || status.as_deref() == Some("UNAUTHENTICATED") {
        return Error::authentication(message);
    }

    match status_code {
        400 => Error::bad_request(message),
        401 => Error::authentication(message),
        403 => Error::permission(message),
        404 => Error::not_found(message),
        408 => Error::timeout(message, None),
        429 => Error::rate_limit(message, retry_after),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message, retry_after),
        _ => Error::api(status_code, status, message),
    }
}

fn normalize_base_url(base_url: &str) -> Result<String> {
    let mut url = url::Url::parse(base_url)?;
    if url.cannot_be_a_base() {
        return Err(Error::url(
            format!("{base_url} cannot be used as a base URL"),
            None,
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;
    use std::env;

    #[test]
    fn client_creation() {
        let client = Gemini::new(Some("test-key".to_string())).unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url, DEFAULT_API_URL);
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);
        assert_eq!(client.model(), &Model::Known(KnownModel::LearnLm15ProExperimental));

        let client = Gemini::with_options(
            Some("test-key".to_string()),
            Some("http://localhost:8080/v1beta".to_string()),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:8080/v1beta/");
        assert_eq!(client.timeout, Duration::from_secs(5));
    }

    #[test]
    fn blank_key_is_rejected() {
        let err = Gemini::new(Some("   ".to_string())).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = Gemini::with_options(
            Some("test-key".to_string()),
            Some("not a url".to_string()),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn request_carries_instruction_and_sampling() {
        let client = Gemini::new(Some("test-key".to_string()))
            .unwrap()
            .with_system_instruction(Some("Guide, do not solve.".to_string()));
        let history = vec![ModelHistoryEntry::user("How do I read the color sensor?")];
        let request = client.build_request(&history, "How do I read the color sensor?");
        assert_eq!(request.contents.len(), 1);
        assert_eq!(
            request.system_instruction.as_ref().map(|c| c.text()),
            Some("Guide, do not solve.".to_string())
        );
        assert_eq!(request.generation_config, Some(GenerationConfig::default()));
    }

    #[test]
    fn status_mapping() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        let err = error_from_status(429, body, Some(7));
        assert!(err.is_rate_limit());
        assert_eq!(
            err.to_string(),
            "Rate limit exceeded: Quota exceeded (retry after 7 seconds)"
        );

        assert!(error_from_status(503, "overloaded", None).is_server_error());
        assert!(matches!(
            error_from_status(404, "{}", None),
            Error::NotFound { .. }
        ));
        assert!(matches!(
            error_from_status(418, "teapot", None),
            Error::Api {
                status_code: 418,
                ..
            }
        ));
    }

    #[test]
    fn invalid_key_maps_to_authentication() {
        let body = r#"{
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{"@type": "type.googleapis.com/google.rpc.ErrorInfo", "reason": "API_KEY_INVALID"}]
            }
        }"#;
        let err = error_from_status(400, body, None);
        assert!(err.is_authentication());
        assert!(err.to_string().contains("API key not valid"));
    }

    #[test]
    fn blocked_and_empty_responses_fail() {
        let blocked: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        assert!(completion_text(blocked).unwrap_err().is_blocked());

        let empty: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            completion_text(empty).unwrap_err(),
            Error::Serialization { .. }
        ));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let client = Gemini::with_options(
            Some("test-key".to_string()),
            Some("http://127.0.0.1:9/".to_string()),
            Some(Duration::from_secs(2)),
        )
        .unwrap();
        let history = vec![ModelHistoryEntry::user("hello")];
        let err = client.complete(&history, "hello").await.unwrap_err();
        assert!(err.is_retryable() || matches!(err, Error::HttpClient { .. }));
        assert!(!err.is_config());
    }

    #[tokio::test]
    #[ignore] // Ignore by default as this requires a real API key
    async fn live_completion() {
        let api_key = env::var("GEMINI_API_KEY").ok();
        if api_key.is_none() {
            println!("Skipping live_completion: GEMINI_API_KEY not set");
            return;
        }

        let client = Gemini::new(api_key)
            .unwrap()
            .with_model(Model::Known(KnownModel::Gemini20Flash));
        let history = vec![ModelHistoryEntry::user("Reply with the single word: ready")];
        let reply = client
            .complete(&history, "Reply with the single word: ready")
            .await
            .unwrap();
        assert!(!reply.is_empty());
    }
}
