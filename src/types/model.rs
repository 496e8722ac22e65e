use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Represents a Gemini model identifier.
///
/// This can be a predefined model or a custom string value for models
/// that are not listed here (previews, tuned models, new releases).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Model {
    /// Known model versions
    Known(KnownModel),

    /// Custom model identifier
    Custom(String),
}

/// Known Gemini model versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KnownModel {
    /// LearnLM 1.5 Pro (experimental), tuned for tutoring.
    #[serde(rename = "learnlm-1.5-pro-experimental")]
    LearnLm15ProExperimental,

    /// Gemini 1.5 Pro
    #[serde(rename = "gemini-1.5-pro")]
    Gemini15Pro,

    /// Gemini 1.5 Flash
    #[serde(rename = "gemini-1.5-flash")]
    Gemini15Flash,

    /// Gemini 2.0 Flash
    #[serde(rename = "gemini-2.0-flash")]
    Gemini20Flash,

    /// Gemini 2.5 Flash
    #[serde(rename = "gemini-2.5-flash")]
    Gemini25Flash,

    /// Gemini 2.5 Pro
    #[serde(rename = "gemini-2.5-pro")]
    Gemini25Pro,
}

impl KnownModel {
    /// Every known model, in display order.
    pub const ALL: [KnownModel; 6] = [
        KnownModel::LearnLm15ProExperimental,
        KnownModel::Gemini15Pro,
        KnownModel::Gemini15Flash,
        KnownModel::Gemini20Flash,
        KnownModel::Gemini25Flash,
        KnownModel::Gemini25Pro,
    ];

    /// The identifier used in request paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownModel::LearnLm15ProExperimental => "learnlm-1.5-pro-experimental",
            KnownModel::Gemini15Pro => "gemini-1.5-pro",
            KnownModel::Gemini15Flash => "gemini-1.5-flash",
            KnownModel::Gemini20Flash => "gemini-2.0-flash",
            KnownModel::Gemini25Flash => "gemini-2.5-flash",
            KnownModel::Gemini25Pro => "gemini-2.5-pro",
        }
    }
}

impl Model {
    /// The identifier used in request paths.
    pub fn as_str(&self) -> &str {
        match self {
            Model::Known(known) => known.as_str(),
            Model::Custom(custom) => custom,
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::Known(KnownModel::LearnLm15ProExperimental)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = std::convert::Infallible;

    /// Parses a model name, accepting an optional `models/` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let name = name.strip_prefix("models/").unwrap_or(name);
        Ok(KnownModel::ALL
            .iter()
            .find(|known| known.as_str() == name)
            .map(|known| Model::Known(*known))
            .unwrap_or_else(|| Model::Custom(name.to_string())))
    }
}

impl From<KnownModel> for Model {
    fn from(model: KnownModel) -> Self {
        Model::Known(model)
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        Model::Custom(model)
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        Model::Custom(model.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_serialization() {
        let model = Model::Known(KnownModel::LearnLm15ProExperimental);
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#""learnlm-1.5-pro-experimental""#);

        let model: Model = serde_json::from_str(r#""gemini-2.0-flash""#).unwrap();
        assert_eq!(model, Model::Known(KnownModel::Gemini20Flash));
    }

    #[test]
    fn custom_model_serialization() {
        let model: Model = serde_json::from_str(r#""gemini-exp-1206""#).unwrap();
        assert_eq!(model, Model::Custom("gemini-exp-1206".to_string()));
    }

    #[test]
    fn parse_models() {
        assert_eq!(
            "gemini-1.5-flash".parse::<Model>().unwrap(),
            Model::Known(KnownModel::Gemini15Flash)
        );
        assert_eq!(
            "models/learnlm-1.5-pro-experimental".parse::<Model>().unwrap(),
            Model::Known(KnownModel::LearnLm15ProExperimental)
        );
        assert_eq!(
            "tunedModels/robot-tutor".parse::<Model>().unwrap(),
            Model::Custom("tunedModels/robot-tutor".to_string())
        );
    }

    #[test]
    fn default_is_learnlm() {
        assert_eq!(Model::default().to_string(), "learnlm-1.5-pro-experimental");
    }
}
