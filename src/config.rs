//! Configuration types for document-to-XML conversion.
//!
//! Two structs split the knobs by lifetime:
//!
//! * [`ConnectionSettings`]: what the user picks per request (provider,
//!   Ollama endpoint and model, Anthropic key and model). These come straight
//!   from the form (web UI) or flags (CLI) and are never persisted.
//! * [`ConversionConfig`]: process-wide tunables (sampling options, token
//!   limits, timeouts, Anthropic base URL), built via
//!   [`ConversionConfigBuilder`].

use crate::error::XmlFillError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default Ollama server address.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default Ollama model, pre-filled in the model field.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";

/// Default Anthropic model.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// Anthropic models offered in the UI.
pub const ANTHROPIC_MODELS: &[&str] = &["claude-sonnet-4-20250514", "claude-opus-4-20250514"];

/// Anthropic API root.
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com";

/// Value of the `anthropic-version` header.
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Default output artefact, relative to the working directory.
pub const DEFAULT_OUTPUT_FILE: &str = "filled_template.xml";

// ── Provider selection ───────────────────────────────────────────────────

/// Which backend fills the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// A locally hosted Ollama server. (default)
    #[default]
    Local,
    /// The Anthropic Messages API.
    Cloud,
}

impl ProviderKind {
    /// Human-readable label used in the UI and in log lines.
    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::Local => "Ollama (Local)",
            ProviderKind::Cloud => "Anthropic (Cloud)",
        }
    }

    /// Short backend name used in error messages.
    pub fn backend_name(self) -> &'static str {
        match self {
            ProviderKind::Local => "Ollama",
            ProviderKind::Cloud => "Anthropic",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProviderKind::Local => "local",
            ProviderKind::Cloud => "cloud",
        })
    }
}

impl FromStr for ProviderKind {
    type Err = XmlFillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "ollama" | "ollama (local)" => Ok(ProviderKind::Local),
            "cloud" | "anthropic" | "anthropic (cloud)" => Ok(ProviderKind::Cloud),
            other => Err(XmlFillError::InvalidConfig(format!(
                "unknown provider '{other}' (expected local/ollama or cloud/anthropic)"
            ))),
        }
    }
}

// ── Per-request settings ─────────────────────────────────────────────────

/// Connection settings supplied by the user for one conversion.
///
/// Both groups are kept side by side so switching provider in the UI does
/// not lose what was typed into the other group. Only the group matching
/// `provider` is validated and used.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    pub provider: ProviderKind,
    /// Ollama base URL, e.g. `http://localhost:11434`.
    pub endpoint: String,
    /// Ollama model name. Empty means "not selected".
    pub local_model: String,
    /// Anthropic API key. Never logged.
    #[serde(skip_serializing, default)]
    pub api_key: String,
    pub cloud_model: String,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            endpoint: DEFAULT_OLLAMA_URL.to_string(),
            local_model: DEFAULT_OLLAMA_MODEL.to_string(),
            api_key: String::new(),
            cloud_model: DEFAULT_ANTHROPIC_MODEL.to_string(),
        }
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("local_model", &self.local_model)
            .field(
                "api_key",
                &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" },
            )
            .field("cloud_model", &self.cloud_model)
            .finish()
    }
}

impl ConnectionSettings {
    /// Settings for the local provider.
    pub fn local(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::Local,
            endpoint: endpoint.into(),
            local_model: model.into(),
            ..Self::default()
        }
    }

    /// Settings for the cloud provider.
    pub fn cloud(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::Cloud,
            api_key: api_key.into(),
            cloud_model: model.into(),
            ..Self::default()
        }
    }

    /// Model identifier of the selected provider.
    pub fn model(&self) -> &str {
        match self.provider {
            ProviderKind::Local => &self.local_model,
            ProviderKind::Cloud => &self.cloud_model,
        }
    }
}

// ── Process-wide tunables ────────────────────────────────────────────────

/// Sampling parameters sent to Ollama in the `options` object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingOptions {
    /// Default: 0.1. Extraction wants the model faithful, not creative.
    pub temperature: f32,
    /// Nucleus sampling threshold. Default: 0.9.
    pub top_p: f32,
    /// Maximum generated tokens. Default: 2000.
    pub num_predict: u32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.9,
            num_predict: 2000,
        }
    }
}

/// Configuration for a conversion, independent of who is asking.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use xmlfill::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .generate_timeout(Duration::from_secs(600))
///     .cloud_max_tokens(8000)
///     .build()
///     .unwrap();
/// assert_eq!(config.cloud_max_tokens, 8000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionConfig {
    /// Ollama sampling options.
    pub sampling: SamplingOptions,

    /// `max_tokens` for the Anthropic request. Default: 4000.
    pub cloud_max_tokens: u32,

    /// Deadline for `POST /api/generate`. Default: 5 minutes.
    ///
    /// Local models on consumer hardware are slow; a long document through an
    /// 8B model routinely needs more than a minute.
    pub generate_timeout: Duration,

    /// Deadline for `POST /v1/messages`. Default: 2 minutes.
    pub cloud_timeout: Duration,

    /// Deadline for the `GET /api/tags` connectivity probe. Default: 5 seconds.
    pub probe_timeout: Duration,

    /// Anthropic API root; overridable for proxies and tests.
    pub anthropic_url: String,

    /// `anthropic-version` header value.
    pub anthropic_version: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingOptions::default(),
            cloud_max_tokens: 4000,
            generate_timeout: Duration::from_secs(300),
            cloud_timeout: Duration::from_secs(120),
            probe_timeout: Duration::from_secs(5),
            anthropic_url: DEFAULT_ANTHROPIC_URL.to_string(),
            anthropic_version: ANTHROPIC_API_VERSION.to_string(),
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn temperature(mut self, t: f32) -> Self {
        self.config.sampling.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.sampling.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn num_predict(mut self, n: u32) -> Self {
        self.config.sampling.num_predict = n;
        self
    }

    pub fn cloud_max_tokens(mut self, n: u32) -> Self {
        self.config.cloud_max_tokens = n;
        self
    }

    pub fn generate_timeout(mut self, d: Duration) -> Self {
        self.config.generate_timeout = d;
        self
    }

    pub fn cloud_timeout(mut self, d: Duration) -> Self {
        self.config.cloud_timeout = d;
        self
    }

    pub fn probe_timeout(mut self, d: Duration) -> Self {
        self.config.probe_timeout = d;
        self
    }

    pub fn anthropic_url(mut self, url: impl Into<String>) -> Self {
        self.config.anthropic_url = url.into();
        self
    }

    pub fn anthropic_version(mut self, version: impl Into<String>) -> Self {
        self.config.anthropic_version = version.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, XmlFillError> {
        let c = &self.config;
        if c.sampling.num_predict == 0 {
            return Err(XmlFillError::InvalidConfig(
                "num_predict must be ≥ 1".into(),
            ));
        }
        if c.cloud_max_tokens == 0 {
            return Err(XmlFillError::InvalidConfig(
                "cloud max_tokens must be ≥ 1".into(),
            ));
        }
        for (name, d) in [
            ("generate", c.generate_timeout),
            ("cloud", c.cloud_timeout),
            ("probe", c.probe_timeout),
        ] {
            if d.is_zero() {
                return Err(XmlFillError::InvalidConfig(format!(
                    "{name} timeout must be non-zero"
                )));
            }
        }
        if !c.anthropic_url.starts_with("http://") && !c.anthropic_url.starts_with("https://") {
            return Err(XmlFillError::InvalidConfig(format!(
                "Anthropic URL must be http(s), got '{}'",
                c.anthropic_url
            )));
        }
        Ok(self.config)
    }
}
