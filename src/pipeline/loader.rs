//! Document and template loading.
//!
//! Everything except PDF is read as UTF-8 text. PDFs go through pdfium: each
//! page's text layer is extracted and followed by a newline. pdfium is a
//! blocking C library, so extraction runs on `spawn_blocking`.
//!
//! The pdfium library is located via `PDFIUM_LIB_PATH` (path to the shared
//! library file) or, if unset, the system library search path.

use crate::error::XmlFillError;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Document extensions offered by the upload widget.
pub const SUPPORTED_DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "txt", "md", "json", "csv"];

/// Template extensions offered by the upload widget.
pub const SUPPORTED_TEMPLATE_EXTENSIONS: &[&str] = &["xml"];

/// Whether `path` names a PDF (case-insensitive extension check).
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Whether `path` has one of [`SUPPORTED_DOCUMENT_EXTENSIONS`].
///
/// Loading does not enforce this; callers use it to warn early.
pub fn is_supported_document(path: &Path) -> bool {
    has_extension(path, SUPPORTED_DOCUMENT_EXTENSIONS)
}

/// Whether `path` has one of [`SUPPORTED_TEMPLATE_EXTENSIONS`].
pub fn is_supported_template(path: &Path) -> bool {
    has_extension(path, SUPPORTED_TEMPLATE_EXTENSIONS)
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| allowed.iter().any(|a| e.eq_ignore_ascii_case(a)))
}

/// Load a source document as plain text.
pub async fn load_document(path: &Path) -> Result<String, XmlFillError> {
    let text = if is_pdf(path) {
        extract_pdf_text(path).await?
    } else {
        read_text(path).await?
    };
    info!("Loaded document {}: {} chars", path.display(), text.len());
    Ok(text)
}

/// Load an XML template. Always read as text, never parsed.
pub async fn load_template(path: &Path) -> Result<String, XmlFillError> {
    let text = read_text(path).await?;
    info!("Loaded template {}: {} chars", path.display(), text.len());
    Ok(text)
}

async fn read_text(path: &Path) -> Result<String, XmlFillError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| XmlFillError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })
}

/// Extract the text layer of every page, each followed by `"\n"`.
pub async fn extract_pdf_text(path: &Path) -> Result<String, XmlFillError> {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || extract_pdf_text_blocking(&owned))
        .await
        .map_err(|e| XmlFillError::ExtractionFailed {
            path: path.to_path_buf(),
            detail: format!("extraction task panicked: {e}"),
        })?
}

fn extract_pdf_text_blocking(path: &Path) -> Result<String, XmlFillError> {
    let extraction_error = |detail: String| XmlFillError::ExtractionFailed {
        path: path.to_path_buf(),
        detail,
    };

    let pdfium = bind_pdfium().map_err(|e| extraction_error(format!("{e:?}")))?;
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| extraction_error(format!("{e:?}")))?;

    let pages = document.pages();
    debug!("PDF {} has {} pages", path.display(), pages.len());

    let mut text = String::new();
    for (idx, page) in pages.iter().enumerate() {
        let page_text = page
            .text()
            .map_err(|e| extraction_error(format!("page {}: {e:?}", idx + 1)))?;
        text.push_str(&page_text.all());
        text.push('\n');
    }
    Ok(text)
}

fn bind_pdfium() -> Result<Pdfium, PdfiumError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(lib) if !lib.is_empty() => Pdfium::bind_to_library(lib)?,
        _ => Pdfium::bind_to_system_library()?,
    };
    Ok(Pdfium::new(bindings))
}
