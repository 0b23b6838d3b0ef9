use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

/// Everything that can go wrong while producing a screenplay or serving the format.
#[derive(Debug, Error)]
pub enum ScreenplayError {
    #[error("Failed to read {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No API key available: set apiKey in config.json or send customApiKey")]
    MissingApiKey,

    #[error("OpenRouter request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenRouter returned {status}")]
    UpstreamStatus { status: u16, body: Value },

    #[error("Malformed completion response: {0}")]
    MalformedCompletion(String),

    #[error("Completion content is not valid JSON: {0}")]
    ContentParse(#[source] serde_json::Error),
}

impl ScreenplayError {
    /// Coarse classification used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigRead { .. }
            | Self::ConfigParse { .. }
            | Self::InvalidConfig(_)
            | Self::MissingApiKey => "config",
            Self::Http(_) | Self::UpstreamStatus { .. } => "upstream",
            Self::MalformedCompletion(_) | Self::ContentParse(_) => "parse",
        }
    }

    /// Payload returned by the upstream API, if the failure carried one.
    pub fn upstream_body(&self) -> Option<&Value> {
        match self {
            Self::UpstreamStatus { body, .. } => Some(body),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScreenplayError>;
