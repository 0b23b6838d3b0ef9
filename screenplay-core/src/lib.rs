pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod generator;
pub mod request;

// Re-export commonly used types
pub use client::{
    ChatMessage, CompletionClient, CompletionRequest, CompletionResponse, OpenRouterClient,
    OpenRouterOptions, Plugin,
};
pub use config::{ApiKey, Credentials};
pub use error::{Result, ScreenplayError};
pub use format::FormatStore;
pub use generator::ScreenplayGenerator;
pub use request::{DEFAULT_MODEL, GenerationRequest};
