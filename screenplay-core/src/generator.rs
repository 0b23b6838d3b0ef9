use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::client::{CompletionClient, CompletionRequest};
use crate::config::Credentials;
use crate::error::{Result, ScreenplayError};
use crate::format::{FormatStore, with_request_defaults};
use crate::request::GenerationRequest;

/// Turns a [`GenerationRequest`] into a screenplay document.
///
/// Holds only read-only state, so one instance is shared by every request.
#[derive(Clone)]
pub struct ScreenplayGenerator {
    credentials: Arc<Credentials>,
    formats: Arc<FormatStore>,
    client: Arc<dyn CompletionClient>,
}

impl ScreenplayGenerator {
    pub fn new(
        credentials: Credentials,
        formats: FormatStore,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            credentials: Arc::new(credentials),
            formats: Arc::new(formats),
            client,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The response-format template exactly as loaded from disk.
    pub async fn format(&self) -> Result<Arc<Value>> {
        self.formats.template().await
    }

    /// Builds the completion request that [`generate`](Self::generate) would send.
    pub async fn build_completion(&self, request: &GenerationRequest) -> Result<CompletionRequest> {
        let template = self.formats.template().await?;
        let format = with_request_defaults(&template, request)?;
        Ok(CompletionRequest::structured(
            request.model(),
            request.prompt(),
            format,
        ))
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<Value> {
        let api_key = self.credentials.resolve(request.custom_api_key())?;
        let completion = self.build_completion(request).await?;

        info!(
            model = %completion.model,
            has_pitch = request.pitch().is_some(),
            custom_key = request.custom_api_key().is_some(),
            "Generating screenplay"
        );

        let response = self.client.complete(&api_key, &completion).await?;
        let content = response.first_content()?;
        let screenplay: Value =
            serde_json::from_str(content).map_err(ScreenplayError::ContentParse)?;

        info!(
            completion_id = response.id.as_deref().unwrap_or("unknown"),
            "Screenplay generated"
        );
        Ok(screenplay)
    }
}
