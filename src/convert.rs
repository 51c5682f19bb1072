//! Conversion orchestrator.
//!
//! [`convert`] runs one single-pass conversion:
//!
//! ```text
//! validate ─▶ load ─▶ dispatch ─▶ normalize ─▶ outcome
//! ```
//!
//! It never returns an error and never lets a panic escape: every failure,
//! whichever stage raised it, ends up as a status line on a
//! [`ConversionOutcome`] with `output: None`. There is no retry; the user
//! triggers the conversion again.

use crate::config::{ConnectionSettings, ConversionConfig};
use crate::error::XmlFillError;
use crate::output::{ConversionOutcome, ConversionStats, ProbeReport};
use crate::pipeline::{loader, normalize, providers};
use crate::pipeline::providers::Provider;
use futures::FutureExt;
use std::any::Any;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

/// Everything the user supplied for one conversion.
#[derive(Debug, Clone, Default)]
pub struct ConversionRequest {
    /// Source document (PDF, text, markdown, JSON, CSV).
    pub document: Option<PathBuf>,
    /// XML template.
    pub template: Option<PathBuf>,
    pub settings: ConnectionSettings,
}

impl ConversionRequest {
    pub fn new(
        document: impl Into<PathBuf>,
        template: impl Into<PathBuf>,
        settings: ConnectionSettings,
    ) -> Self {
        Self {
            document: Some(document.into()),
            template: Some(template.into()),
            settings,
        }
    }
}

/// Convert the request's document into a filled copy of its template.
///
/// # Returns
/// Always a [`ConversionOutcome`]. `output` is `Some` only on success, paired
/// with [`crate::output::SUCCESS_STATUS`].
pub async fn convert(request: &ConversionRequest, config: &ConversionConfig) -> ConversionOutcome {
    let start = Instant::now();
    let mut stats = ConversionStats::default();

    let result = AssertUnwindSafe(run_pipeline(request, config, &mut stats))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(XmlFillError::Internal(panic_message(panic.as_ref()))));

    stats.duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(xml) => {
            info!(
                "Conversion successful: {} chars in {}ms",
                xml.len(),
                stats.duration_ms
            );
            ConversionOutcome::success(xml, stats)
        }
        Err(e) => {
            warn!("Conversion failed ({:?}): {}", e.kind(), e);
            ConversionOutcome::failure(&e, stats)
        }
    }
}

/// Convert and, on success, write the XML to `output_path`.
///
/// Uses atomic write (temp file + rename) so a reader never sees a partial
/// file. Concurrent calls targeting the same path are last-write-wins. On
/// failure the file is left untouched.
pub async fn convert_to_file(
    request: &ConversionRequest,
    config: &ConversionConfig,
    output_path: impl AsRef<Path>,
) -> ConversionOutcome {
    let mut outcome = convert(request, config).await;
    let path = output_path.as_ref();

    let Some(xml) = outcome.output.as_deref() else {
        return outcome;
    };

    match write_atomic(path, xml).await {
        Ok(()) => {
            info!("Saved filled XML to {}", path.display());
            outcome.saved_to = Some(path.to_path_buf());
            outcome
        }
        Err(e) => {
            error!("{}", e);
            ConversionOutcome::failure(&e, outcome.stats)
        }
    }
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(request: &ConversionRequest, config: &ConversionConfig) -> ConversionOutcome {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(convert(request, config)),
        Err(e) => ConversionOutcome::failure(
            &XmlFillError::Internal(format!("Failed to create tokio runtime: {e}")),
            ConversionStats::default(),
        ),
    }
}

/// Probe the Ollama server at `endpoint` using the configured probe timeout.
pub async fn probe(endpoint: &str, config: &ConversionConfig) -> ProbeReport {
    providers::ollama::probe(endpoint.trim(), config.probe_timeout).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run_pipeline(
    request: &ConversionRequest,
    config: &ConversionConfig,
    stats: &mut ConversionStats,
) -> Result<String, XmlFillError> {
    // ── Step 1: Validate ─────────────────────────────────────────────────
    let (document_path, template_path) = match (
        present(request.document.as_deref()),
        present(request.template.as_deref()),
    ) {
        (Some(d), Some(t)) => (d, t),
        _ => return Err(XmlFillError::MissingInput),
    };

    // ── Step 2: Load ─────────────────────────────────────────────────────
    info!(
        "Reading files: document={} template={}",
        document_path.display(),
        template_path.display()
    );
    if !loader::is_supported_document(document_path) {
        warn!(
            "Document {} has an unexpected extension; reading as UTF-8 text",
            document_path.display()
        );
    }
    if !loader::is_supported_template(template_path) {
        warn!(
            "Template {} is not an .xml file; using it as-is",
            template_path.display()
        );
    }
    let document = loader::load_document(document_path).await?;
    let template = loader::load_template(template_path).await?;
    stats.document_chars = document.len();
    stats.template_chars = template.len();
    info!(
        "Document size: {} characters, template size: {} characters",
        document.len(),
        template.len()
    );

    // ── Step 3: Dispatch ─────────────────────────────────────────────────
    let provider = Provider::from_settings(&request.settings, config)?;
    stats.provider = Some(provider.kind());
    stats.model = Some(provider.model().to_string());
    let raw = provider.fill_template(&document, &template).await?;
    stats.raw_output_chars = raw.len();

    // ── Step 4: Normalize ────────────────────────────────────────────────
    let xml = normalize::normalize_response(&raw);
    stats.output_chars = xml.len();
    debug!("Cleaned output length: {} characters", xml.len());
    debug!("First 200 chars: {}", preview(&xml, 200));

    if xml.is_empty() {
        return Err(XmlFillError::EmptyResponse {
            provider: provider.kind().backend_name().to_string(),
        });
    }
    Ok(xml)
}

fn present(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !p.as_os_str().is_empty())
}

/// At most `max` bytes of `s`, cut on a char boundary.
fn preview(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in conversion pipeline".to_string()
    }
}

async fn write_atomic(path: &Path, contents: &str) -> Result<(), XmlFillError> {
    let target = path.to_path_buf();
    let contents = contents.to_owned();
    tokio::task::spawn_blocking(move || write_atomic_blocking(&target, &contents))
        .await
        .map_err(|e| XmlFillError::Internal(format!("output write task failed: {e}")))?
}

/// Each call writes its own uniquely named temp file next to `path`, then
/// renames it over `path`.
fn write_atomic_blocking(path: &Path, contents: &str) -> Result<(), XmlFillError> {
    let write_err = |source| XmlFillError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(write_err)?;
            parent
        }
        None => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
