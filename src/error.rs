//! Error types for the xmlfill library.
//!
//! Every failure in the conversion pipeline is an [`XmlFillError`]. The
//! orchestrator never lets one escape to the interface layer: it is folded
//! into a human-readable status line via [`XmlFillError::status_message`] and
//! paired with an absent output (see [`crate::output::ConversionOutcome`]).
//!
//! [`ErrorKind`] is the coarse classification callers match on when they only
//! care about *which* stage failed, e.g. to decide whether a retry with a
//! smaller model is worth suggesting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of an [`XmlFillError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required input (file, model, API key) was missing.
    Validation,
    /// A file could not be read or written.
    Io,
    /// PDF text extraction failed.
    Extraction,
    /// The model call exceeded its deadline.
    Timeout,
    /// A backend answered with a non-200 status.
    Provider,
    /// The model produced nothing usable.
    EmptyResponse,
    /// Anything else.
    Unclassified,
}

/// All errors produced by the xmlfill library.
#[derive(Debug, Error)]
pub enum XmlFillError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// Document or template path missing from the request.
    #[error("Please upload both document and XML template")]
    MissingInput,

    /// Local provider selected without a model name.
    #[error("Please select an Ollama model")]
    MissingModel,

    /// Cloud provider selected without an API key.
    #[error("Please enter your Anthropic API key")]
    MissingApiKey,

    // ── Input errors ──────────────────────────────────────────────────────
    /// A document or template could not be read as UTF-8 text.
    #[error("Error processing files: could not read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// pdfium could not bind, open the PDF, or extract a page's text.
    #[error("Error converting PDF to text: {detail}")]
    ExtractionFailed { path: PathBuf, detail: String },

    // ── Provider errors ───────────────────────────────────────────────────
    /// The model call exceeded the configured timeout.
    #[error(
        "Request to {provider} timed out after {secs}s. \
Try using a smaller/faster model or shorter documents."
    )]
    Timeout { provider: String, secs: u64 },

    /// Ollama answered with a non-200 status.
    #[error("Ollama API error: {status}")]
    LocalApi { status: u16 },

    /// Anthropic answered with a non-200 status; the body is kept for diagnosis.
    #[error("Anthropic API error: {status} - {body}")]
    CloudApi { status: u16, body: String },

    /// The model returned an empty completion (after fence stripping).
    #[error("Model returned empty response")]
    EmptyResponse { provider: String },

    /// Connection refused, DNS, TLS, reset, or a body that is not the expected JSON.
    #[error("Error calling {provider}: {detail}")]
    Transport { provider: String, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the filled XML file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error, including panics caught at the orchestrator.
    #[error("Unexpected error: {0}")]
    Internal(String),
}

impl XmlFillError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingInput | Self::MissingModel | Self::MissingApiKey => ErrorKind::Validation,
            Self::ReadFailed { .. } | Self::OutputWriteFailed { .. } => ErrorKind::Io,
            Self::ExtractionFailed { .. } => ErrorKind::Extraction,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::LocalApi { .. } | Self::CloudApi { .. } => ErrorKind::Provider,
            Self::EmptyResponse { .. } => ErrorKind::EmptyResponse,
            Self::Transport { .. } | Self::InvalidConfig(_) | Self::Internal(_) => {
                ErrorKind::Unclassified
            }
        }
    }

    /// The status line shown to the user for this failure.
    pub fn status_message(&self) -> String {
        format!("❌ {self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_api_status_has_code() {
        let e = XmlFillError::LocalApi { status: 500 };
        assert!(e.status_message().contains("500"), "got: {}", e.status_message());
        assert_eq!(e.kind(), ErrorKind::Provider);
    }

    #[test]
    fn cloud_api_status_has_code_and_body() {
        let e = XmlFillError::CloudApi {
            status: 401,
            body: "{\"error\":\"invalid x-api-key\"}".into(),
        };
        let msg = e.status_message();
        assert!(msg.contains("401"));
        assert!(msg.contains("invalid x-api-key"));
    }

    #[test]
    fn timeout_suggests_smaller_model() {
        let e = XmlFillError::Timeout {
            provider: "Ollama".into(),
            secs: 300,
        };
        assert!(e.to_string().contains("smaller/faster model"));
        assert_eq!(e.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn validation_kinds() {
        for e in [
            XmlFillError::MissingInput,
            XmlFillError::MissingModel,
            XmlFillError::MissingApiKey,
        ] {
            assert_eq!(e.kind(), ErrorKind::Validation);
            assert!(e.status_message().starts_with("❌ Please"));
        }
    }

    #[test]
    fn transport_is_unclassified() {
        let e = XmlFillError::Transport {
            provider: "Anthropic".into(),
            detail: "connection reset".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Unclassified);
        assert!(e.to_string().contains("Error calling Anthropic"));
    }
}
