//! # xmlfill
//!
//! Fill an XML template with data extracted from a document by a language
//! model, either a local Ollama server or the Anthropic cloud API.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document + template
//!  │
//!  ├─ 1. Validate  both files present, provider field filled in
//!  ├─ 2. Load      PDF page text via pdfium, everything else as UTF-8
//!  ├─ 3. Prompt    document and template embedded in one instruction
//!  ├─ 4. Dispatch  one request to Ollama or Anthropic
//!  ├─ 5. Normalize strip markdown fences, trim
//!  └─ 6. Output    XML string + status line, optionally saved to disk
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xmlfill::{convert_to_file, ConnectionSettings, ConversionConfig, ConversionRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = ConnectionSettings::local("http://localhost:11434", "llama3.1");
//!     let request = ConversionRequest::new("invoice.pdf", "invoice.xml", settings);
//!     let outcome = convert_to_file(&request, &ConversionConfig::default(), "filled_template.xml").await;
//!     eprintln!("{}", outcome.status);
//!     if let Some(xml) = outcome.output {
//!         println!("{xml}");
//!     }
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `xmlfill` binary (clap + anyhow + tracing-subscriber) |
//! | `web`   | on      | Browser UI served by `xmlfill serve` (axum) |
//!
//! Library-only use:
//! ```toml
//! xmlfill = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod ui;
#[cfg(feature = "web")]
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConnectionSettings, ConversionConfig, ConversionConfigBuilder, ProviderKind, SamplingOptions,
};
pub use convert::{convert, convert_sync, convert_to_file, probe, ConversionRequest};
pub use error::{ErrorKind, XmlFillError};
pub use output::{ConversionOutcome, ConversionStats, ProbeReport, SUCCESS_STATUS};
pub use pipeline::providers::Provider;
pub use ui::ViewState;
