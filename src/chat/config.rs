//! Configuration types for the chat application.
//!
//! CLI arguments are parsed with `arrrg` into [`ChatArgs`], then resolved and
//! validated into a [`ChatConfig`].

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::error::{Error, Result};
use crate::types::{GenerationConfig, Model};

/// Instructions that keep the model in its tutoring role.
pub const TUTOR_INSTRUCTIONS: &str = include_str!("tutor_instructions.txt");

/// Seconds to wait for the model service when not overridden.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Command-line arguments for the bricktutor-chat tool.
///
/// Floating point values are taken as strings and parsed during
/// resolution, so the struct stays `Eq`.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: learnlm-1.5-pro-experimental)", "MODEL")]
    pub model: Option<String>,

    /// File holding replacement system instructions.
    #[arrrg(optional, "Read system instructions from FILE", "FILE")]
    pub system_file: Option<String>,

    /// Sampling temperature.
    #[arrrg(optional, "Sampling temperature, 0.0-2.0 (default: 0.3)", "TEMP")]
    pub temperature: Option<String>,

    /// Nucleus sampling value.
    #[arrrg(optional, "Top-p, 0.0-1.0 (default: 0.95)", "P")]
    pub top_p: Option<String>,

    /// Top-k sampling limit.
    #[arrrg(optional, "Top-k (default: 64)", "K")]
    pub top_k: Option<u32>,

    /// Maximum tokens per reply.
    #[arrrg(optional, "Max output tokens per reply (default: 8192)", "TOKENS")]
    pub max_output_tokens: Option<u32>,

    /// Request timeout.
    #[arrrg(optional, "Request timeout in seconds (default: 30)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// Alternate API endpoint.
    #[arrrg(optional, "Base URL of the model API", "URL")]
    pub base_url: Option<String>,

    /// YAML file holding `gemini_api_key`.
    #[arrrg(optional, "Read the API key from a YAML secrets file", "FILE")]
    pub secrets_file: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Resolved configuration for a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The model to use for generating replies.
    pub model: Model,

    /// Instructions sent with every request.
    pub system_instruction: Option<String>,

    /// Sampling parameters.
    pub generation: GenerationConfig,

    /// How long a round trip may take.
    pub timeout: Duration,

    /// Override for the API endpoint.
    pub base_url: Option<String>,

    /// Where to read the API key from, instead of the environment.
    pub secrets_file: Option<PathBuf>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a config with the tutor defaults.
    pub fn new() -> Self {
        Self {
            model: Model::default(),
            system_instruction: Some(TUTOR_INSTRUCTIONS.to_string()),
            generation: GenerationConfig::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            base_url: None,
            secrets_file: None,
            use_color: true,
        }
    }

    /// Resolves parsed arguments, reading any referenced files.
    pub fn from_args(args: ChatArgs) -> Result<Self> {
        let mut config = ChatConfig::new();
        if let Some(model) = args.model {
            let model = model.parse::<Model>().unwrap_or_else(|never| match never {});
            config = config.with_model(model);
        }
        if let Some(path) = args.system_file {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| Error::config(format!("cannot read system file {path}: {e}")))?;
            config = config.with_system_instruction(Some(text));
        }
        let mut generation = config.generation.clone();
        if let Some(temperature) = args.temperature {
            generation = generation.with_temperature(Some(parse_bounded(
                "temperature",
                &temperature,
                0.0,
                2.0,
            )?));
        }
        if let Some(top_p) = args.top_p {
            generation = generation.with_top_p(Some(parse_bounded("top_p", &top_p, 0.0, 1.0)?));
        }
        if args.top_k.is_some() {
            generation = generation.with_top_k(args.top_k);
        }
        if let Some(max) = args.max_output_tokens {
            if max == 0 {
                return Err(Error::validation(
                    "max_output_tokens must be positive",
                    Some("max_output_tokens".to_string()),
                ));
            }
            generation = generation.with_max_output_tokens(Some(max));
        }
        config = config.with_generation(generation);
        if let Some(secs) = args.timeout_secs {
            if secs == 0 {
                return Err(Error::validation(
                    "timeout_secs must be positive",
                    Some("timeout_secs".to_string()),
                ));
            }
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config.base_url = args.base_url;
        config.secrets_file = args.secrets_file.map(PathBuf::from);
        if args.no_color {
            config = config.without_color();
        }
        Ok(config)
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the system instructions; blank text disables them.
    pub fn with_system_instruction(mut self, instruction: Option<String>) -> Self {
        self.system_instruction = instruction.filter(|s| !s.trim().is_empty());
        self
    }

    /// Sets the sampling parameters.
    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the API endpoint.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = Error;

    fn try_from(args: ChatArgs) -> Result<Self> {
        ChatConfig::from_args(args)
    }
}

fn parse_bounded(param: &str, value: &str, min: f32, max: f32) -> Result<f32> {
    let parsed: f32 = value.trim().parse().map_err(|_| {
        Error::validation(
            format!("{param} must be a number, got {value:?}"),
            Some(param.to_string()),
        )
    })?;
    if !(min..=max).contains(&parsed) {
        return Err(Error::validation(
            format!("{param} must be between {min} and {max}, got {parsed}"),
            Some(param.to_string()),
        ));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;
    use crate::types::generation_config::DEFAULT_TEMPERATURE;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.model, Model::Known(KnownModel::LearnLm15ProExperimental));
        assert!(config.use_color);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.generation.temperature, Some(DEFAULT_TEMPERATURE));
        assert_eq!(config.generation.top_k, Some(64));
        assert!(
            config
                .system_instruction
                .as_deref()
                .is_some_and(|s| s.contains("Pybricks"))
        );
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::try_from(ChatArgs::default()).unwrap();
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            model: Some("gemini-2.0-flash".to_string()),
            temperature: Some("0.7".to_string()),
            top_p: Some("0.5".to_string()),
            top_k: Some(10),
            max_output_tokens: Some(1024),
            timeout_secs: Some(5),
            base_url: Some("http://localhost:8080/v1beta/".to_string()),
            secrets_file: Some("secrets.yaml".to_string()),
            no_color: true,
            ..ChatArgs::default()
        };
        let config = ChatConfig::try_from(args).unwrap();
        assert_eq!(config.model, Model::Known(KnownModel::Gemini20Flash));
        assert_eq!(config.generation.temperature, Some(0.7));
        assert_eq!(config.generation.top_p, Some(0.5));
        assert_eq!(config.generation.top_k, Some(10));
        assert_eq!(config.generation.max_output_tokens, Some(1024));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.secrets_file, Some(PathBuf::from("secrets.yaml")));
        assert!(!config.use_color);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let args = ChatArgs {
            temperature: Some("2.5".to_string()),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(args).unwrap_err().is_config());

        let args = ChatArgs {
            top_p: Some("lots".to_string()),
            ..ChatArgs::default()
        };
        let err = ChatConfig::try_from(args).unwrap_err();
        assert!(err.to_string().contains("top_p"));

        let args = ChatArgs {
            timeout_secs: Some(0),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(args).is_err());
    }

    #[test]
    fn missing_system_file_is_config_error() {
        let args = ChatArgs {
            system_file: Some("/nonexistent/bricktutor/system.txt".to_string()),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(args).unwrap_err().is_config());
    }

    #[test]
    fn blank_system_instruction_is_dropped() {
        let config = ChatConfig::new().with_system_instruction(Some("  \n".to_string()));
        assert!(config.system_instruction.is_none());
    }
}
