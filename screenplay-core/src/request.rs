use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "allenai/olmo-3.1-32b-think:free";
pub const DEFAULT_SCREENPLAY_LANGUAGE: &str = "Hebrew";
pub const DEFAULT_LANGUAGES: [&str; 2] = ["English", "Spanish"];

/// Body of `POST /api/screenplay/generate`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub story_pitch: Option<String>,
    #[serde(default)]
    pub languages_used: Option<Vec<String>>,
    #[serde(default)]
    pub default_screenplay_language: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, rename = "customApiKey")]
    pub custom_api_key: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl GenerationRequest {
    pub fn pitch(&self) -> Option<&str> {
        non_empty(&self.story_pitch)
    }

    /// Dialogue languages, falling back to English and Spanish.
    pub fn languages(&self) -> Vec<String> {
        match &self.languages_used {
            Some(languages) => languages.clone(),
            None => DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn screenplay_language(&self) -> &str {
        non_empty(&self.default_screenplay_language).unwrap_or(DEFAULT_SCREENPLAY_LANGUAGE)
    }

    pub fn model(&self) -> &str {
        non_empty(&self.model).unwrap_or(DEFAULT_MODEL)
    }

    pub fn custom_api_key(&self) -> Option<&str> {
        non_empty(&self.custom_api_key)
    }

    pub fn prompt(&self) -> String {
        match self.pitch() {
            Some(pitch) => format!("Create a screenplay based on this pitch: {}", pitch),
            None => format!(
                "Create a creative original screenplay. \
                 Use these languages for character dialogue: {}. \
                 The default screenplay language (for all text except character dialogue) should be: {}.",
                self.languages().join(", "),
                self.screenplay_language()
            ),
        }
    }
}
