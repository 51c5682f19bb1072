//! Anthropic Messages API client.
//!
//! The key travels only in the `x-api-key` header. It is never put in the
//! URL and never logged.

use crate::config::ConversionConfig;
use crate::error::XmlFillError;
use crate::prompts::build_extraction_prompt;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

const PROVIDER: &str = "Anthropic";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// A client bound to one API key and model.
#[derive(Clone)]
pub struct AnthropicClient {
    base_url: String,
    api_version: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AnthropicClient {
    pub fn new(api_key: &str, model: &str, config: &ConversionConfig) -> Self {
        Self {
            base_url: config.anthropic_url.trim_end_matches('/').to_string(),
            api_version: config.anthropic_version.clone(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens: config.cloud_max_tokens,
            timeout: config.cloud_timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model to fill `template` from `document`; return the first content block's text.
    ///
    /// The extraction prompt is assembled here, as the single user message.
    pub async fn fill_template(
        &self,
        document: &str,
        template: &str,
    ) -> Result<String, XmlFillError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| XmlFillError::Internal(format!("failed to build HTTP client: {e}")))?;

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: build_extraction_prompt(document, template),
            }],
        };

        info!("Sending request to Anthropic ({})...", self.model);
        let resp = client
            .post(format!("{}/v1/messages", self.base_url))
            .header("content-type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = resp.status();
        info!("Anthropic response status: {}", status.as_u16());
        if status != StatusCode::OK {
            let body = match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Failed to read Anthropic error body: {}", e);
                    format!("<unreadable body: {e}>")
                }
            };
            return Err(XmlFillError::CloudApi {
                status: status.as_u16(),
                body,
            });
        }

        let body: MessagesResponse = resp.json().await.map_err(|e| self.map_transport(e))?;
        let text = body
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| XmlFillError::EmptyResponse {
                provider: PROVIDER.to_string(),
            })?;
        debug!("Raw output length: {} characters", text.len());
        Ok(text)
    }

    fn map_transport(&self, e: reqwest::Error) -> XmlFillError {
        if e.is_timeout() {
            warn!("Anthropic request timed out after {:?}", self.timeout);
            XmlFillError::Timeout {
                provider: PROVIDER.to_string(),
                secs: self.timeout.as_secs(),
            }
        } else {
            // reqwest errors carry the URL, never headers, so the key cannot leak here.
            XmlFillError::Transport {
                provider: PROVIDER.to_string(),
                detail: e.to_string(),
            }
        }
    }
}
