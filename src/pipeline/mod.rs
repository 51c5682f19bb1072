//! Pipeline stages for document-to-XML conversion.
//!
//! Each submodule implements exactly one step.
//!
//! ## Data Flow
//!
//! ```text
//! loader ──▶ prompt ──▶ providers ──▶ normalize
//! (text/PDF)  (prompts)  (HTTP)       (fence strip)
//! ```
//!
//! 1. [`loader`]: read the document (pdfium for PDF) and the template
//! 2. [`crate::prompts`]: embed both in the extraction prompt
//! 3. [`providers`]: one blocking request to Ollama or Anthropic; the only
//!    stage with network I/O
//! 4. [`normalize`]: strip markdown fence artefacts from the completion

pub mod loader;
pub mod normalize;
pub mod providers;
