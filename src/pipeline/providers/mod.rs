//! Provider dispatch: one capability, two backends.
//!
//! [`Provider`] is the tagged variant over the two backends. The orchestrator
//! only ever calls [`Provider::fill_template`]; request and response shapes
//! stay inside [`ollama`] and [`anthropic`].
//!
//! The two variants assemble the prompt at different points. The local path
//! builds it before calling [`OllamaClient::generate`]; the cloud client
//! builds it inside its own message payload.

pub mod anthropic;
pub mod ollama;

pub use anthropic::AnthropicClient;
pub use ollama::OllamaClient;

use crate::config::{ConnectionSettings, ConversionConfig, ProviderKind};
use crate::error::XmlFillError;
use crate::prompts::build_extraction_prompt;
use tracing::info;

/// A configured conversion backend.
#[derive(Debug, Clone)]
pub enum Provider {
    Local(OllamaClient),
    Cloud(AnthropicClient),
}

impl Provider {
    /// Build the provider selected in `settings`, checking its required field.
    ///
    /// Local needs a non-empty model; cloud needs a non-empty API key.
    pub fn from_settings(
        settings: &ConnectionSettings,
        config: &ConversionConfig,
    ) -> Result<Self, XmlFillError> {
        match settings.provider {
            ProviderKind::Local => {
                let model = settings.local_model.trim();
                if model.is_empty() {
                    return Err(XmlFillError::MissingModel);
                }
                info!("Using Ollama with model: {}", model);
                Ok(Provider::Local(OllamaClient::new(
                    settings.endpoint.trim(),
                    model,
                    config,
                )))
            }
            ProviderKind::Cloud => {
                let key = settings.api_key.trim();
                if key.is_empty() {
                    return Err(XmlFillError::MissingApiKey);
                }
                info!("Using Anthropic with model: {}", settings.cloud_model);
                Ok(Provider::Cloud(AnthropicClient::new(
                    key,
                    settings.cloud_model.trim(),
                    config,
                )))
            }
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::Local(_) => ProviderKind::Local,
            Provider::Cloud(_) => ProviderKind::Cloud,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::Local(c) => c.model(),
            Provider::Cloud(c) => c.model(),
        }
    }

    /// Fill `template` from `document`; returns the raw, unnormalised model text.
    pub async fn fill_template(
        &self,
        document: &str,
        template: &str,
    ) -> Result<String, XmlFillError> {
        match self {
            Provider::Local(client) => {
                let prompt = build_extraction_prompt(document, template);
                client.generate(&prompt).await
            }
            Provider::Cloud(client) => client.fill_template(document, template).await,
        }
    }
}
