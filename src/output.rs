//! Result types handed back to the interface layer.

use crate::config::ProviderKind;
use crate::error::{ErrorKind, XmlFillError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Status line shown after a successful conversion.
pub const SUCCESS_STATUS: &str = "✅ Conversion successful!";

/// Outcome of one conversion. Never an `Err`: failures are a status line.
///
/// `output` is `Some` (and non-empty) exactly when `error_kind` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOutcome {
    /// The filled XML, or `None` on failure.
    pub output: Option<String>,
    /// Human-readable status, always present.
    pub status: String,
    /// Classification of the failure, if any.
    pub error_kind: Option<ErrorKind>,
    /// Where the output was written, when it was.
    pub saved_to: Option<PathBuf>,
    pub stats: ConversionStats,
}

impl ConversionOutcome {
    pub(crate) fn success(output: String, stats: ConversionStats) -> Self {
        Self {
            output: Some(output),
            status: SUCCESS_STATUS.to_string(),
            error_kind: None,
            saved_to: None,
            stats,
        }
    }

    pub(crate) fn failure(err: &XmlFillError, stats: ConversionStats) -> Self {
        Self {
            output: None,
            status: err.status_message(),
            error_kind: Some(err.kind()),
            saved_to: None,
            stats,
        }
    }

    pub fn is_success(&self) -> bool {
        self.output.is_some()
    }
}

/// Sizes and timing for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
    /// Characters (bytes) of loaded document text.
    pub document_chars: usize,
    pub template_chars: usize,
    /// Raw completion length before fence stripping.
    pub raw_output_chars: usize,
    pub output_chars: usize,
    pub duration_ms: u64,
}

/// Result of the Ollama connectivity probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub connected: bool,
    /// Installed model names, in server order. Empty when not connected.
    pub models: Vec<String>,
    /// Human-readable status line.
    pub status: String,
}

impl ProbeReport {
    pub fn connected(models: Vec<String>) -> Self {
        let status = format!(
            "✅ Connected! Found {} model(s): {}",
            models.len(),
            models.join(", ")
        );
        Self {
            connected: true,
            models,
            status,
        }
    }

    pub fn disconnected(status: String) -> Self {
        Self {
            connected: false,
            models: Vec::new(),
            status,
        }
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }
}
