//! Ollama client: text generation and the `/api/tags` connectivity probe.

use crate::config::{ConversionConfig, SamplingOptions};
use crate::error::XmlFillError;
use crate::output::ProbeReport;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const PROVIDER: &str = "Ollama";

/// `POST /api/generate` request body.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: SamplingOptions,
}

/// `POST /api/generate` response body. Only `response` is used.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// `GET /api/tags` response body.
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

/// A client bound to one Ollama endpoint and model.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    endpoint: String,
    model: String,
    sampling: SamplingOptions,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(endpoint: &str, model: &str, config: &ConversionConfig) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            sampling: config.sampling,
            timeout: config.generate_timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `prompt` to `/api/generate` with streaming disabled and return the raw completion.
    pub async fn generate(&self, prompt: &str) -> Result<String, XmlFillError> {
        let client = http_client(self.timeout)?;
        let url = format!("{}/api/generate", self.endpoint);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: self.sampling,
        };

        info!("Sending request to Ollama ({})...", self.model);
        let resp = client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = resp.status();
        info!("Ollama response status: {}", status.as_u16());
        if status != StatusCode::OK {
            return Err(XmlFillError::LocalApi {
                status: status.as_u16(),
            });
        }

        let body: GenerateResponse = resp.json().await.map_err(|e| self.map_transport(e))?;
        debug!("Raw output length: {} characters", body.response.len());
        Ok(body.response)
    }

    fn map_transport(&self, e: reqwest::Error) -> XmlFillError {
        if e.is_timeout() {
            warn!("Ollama request timed out after {:?}", self.timeout);
            XmlFillError::Timeout {
                provider: PROVIDER.to_string(),
                secs: self.timeout.as_secs(),
            }
        } else {
            XmlFillError::Transport {
                provider: PROVIDER.to_string(),
                detail: e.to_string(),
            }
        }
    }
}

/// List the models installed on the Ollama server at `endpoint`.
pub async fn list_models(endpoint: &str, timeout: Duration) -> Result<Vec<String>, XmlFillError> {
    let client = http_client(timeout)?;
    let url = format!("{}/api/tags", endpoint.trim_end_matches('/'));

    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|e| XmlFillError::Transport {
            provider: PROVIDER.to_string(),
            detail: e.to_string(),
        })?;

    if resp.status() != StatusCode::OK {
        return Err(XmlFillError::LocalApi {
            status: resp.status().as_u16(),
        });
    }

    let tags: TagsResponse = resp.json().await.map_err(|e| XmlFillError::Transport {
        provider: PROVIDER.to_string(),
        detail: e.to_string(),
    })?;

    Ok(tags.models.into_iter().map(|m| m.name).collect())
}

/// Test whether an Ollama server answers at `endpoint`.
///
/// Never fails: every error becomes a disconnected [`ProbeReport`] with no models.
pub async fn probe(endpoint: &str, timeout: Duration) -> ProbeReport {
    match list_models(endpoint, timeout).await {
        Ok(models) => {
            info!("Ollama at {} lists {} model(s)", endpoint, models.len());
            ProbeReport::connected(models)
        }
        Err(XmlFillError::LocalApi { status }) => {
            warn!("Ollama probe at {} returned HTTP {}", endpoint, status);
            ProbeReport::disconnected("❌ Cannot connect to Ollama".to_string())
        }
        Err(e) => {
            warn!("Ollama probe at {} failed: {}", endpoint, e);
            let detail = match e {
                XmlFillError::Transport { detail, .. } => detail,
                other => other.to_string(),
            };
            ProbeReport::disconnected(format!("❌ Error: {detail}"))
        }
    }
}

fn http_client(timeout: Duration) -> Result<Client, XmlFillError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| XmlFillError::Internal(format!("failed to build HTTP client: {e}")))
}
