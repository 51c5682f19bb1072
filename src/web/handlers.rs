//! Request handlers. Every POST redirects back to the page.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use std::path::{Path, PathBuf};

use super::page;
use super::AppState;
use crate::config::{ConnectionSettings, ProviderKind};
use crate::convert::{self, ConversionRequest};

/// One uploaded file.
struct Upload {
    file_name: String,
    bytes: Bytes,
}

/// The page form, as posted by any of its buttons.
struct Submission {
    settings: ConnectionSettings,
    document: Option<Upload>,
    template: Option<Upload>,
}

/// Main page.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let view = state.view.read().await;
    Html(page::render(&view))
}

/// Test Connection button.
///
/// The page posts only `endpoint` here. Script clients asking for JSON get
/// the [`crate::output::ProbeReport`] back and stay on the page; plain form
/// posts are redirected.
pub async fn probe(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let base = state.view.read().await.settings.clone();
    let submission = match read_submission(multipart, base).await {
        Ok(s) => s,
        Err(e) => return bad_form(e),
    };

    let report = convert::probe(&submission.settings.endpoint, &state.config).await;

    let mut view = state.view.write().await;
    *view = std::mem::take(&mut *view)
        .with_settings(submission.settings)
        .apply_probe(&report);

    if wants_json(&headers) {
        Json(report).into_response()
    } else {
        Redirect::to("/").into_response()
    }
}

/// Convert button.
pub async fn convert(State(state): State<AppState>, multipart: Multipart) -> Response {
    let base = state.view.read().await.settings.clone();
    let submission = match read_submission(multipart, base).await {
        Ok(s) => s,
        Err(e) => return bad_form(e),
    };

    // Uploads live only for the duration of this conversion.
    let upload_dir = match tempfile::tempdir() {
        Ok(d) => d,
        Err(e) => return server_error(&e),
    };
    let document_name = submission.document.as_ref().map(|u| u.file_name.clone());
    let template_name = submission.template.as_ref().map(|u| u.file_name.clone());

    let document = match save_upload(upload_dir.path(), "document", submission.document).await {
        Ok(p) => p,
        Err(e) => return server_error(&e),
    };
    let template = match save_upload(upload_dir.path(), "template", submission.template).await {
        Ok(p) => p,
        Err(e) => return server_error(&e),
    };

    let request = ConversionRequest {
        document,
        template,
        settings: submission.settings,
    };
    let outcome = convert::convert_to_file(&request, &state.config, &state.output_path).await;

    let mut view = state.view.write().await;
    *view = std::mem::take(&mut *view)
        .with_settings(request.settings)
        .with_uploads(document_name, template_name)
        .apply_conversion(&outcome);
    Redirect::to("/").into_response()
}

/// Clear All button.
pub async fn clear(State(state): State<AppState>) -> Redirect {
    let mut view = state.view.write().await;
    *view = std::mem::take(&mut *view).clear();
    Redirect::to("/")
}

/// Serve the last successful output as an attachment.
pub async fn download(State(state): State<AppState>) -> Response {
    let Some(path) = state.view.read().await.download.clone() else {
        return (StatusCode::NOT_FOUND, "No output file yet").into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(crate::config::DEFAULT_OUTPUT_FILE);
            (
                [
                    (header::CONTENT_TYPE, "application/xml".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", file_name),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!("Output file {} unavailable: {}", path.display(), e);
            (StatusCode::NOT_FOUND, "Output file not found").into_response()
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Parse the page form. Text fields override `base`; the API key is never
/// carried over from an earlier submission.
async fn read_submission(
    mut multipart: Multipart,
    base: ConnectionSettings,
) -> Result<Submission, MultipartError> {
    let mut submission = Submission {
        settings: ConnectionSettings {
            api_key: String::new(),
            ..base
        },
        document: None,
        template: None,
    };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        match name.as_str() {
            "document" | "template" => {
                let bytes = field.bytes().await?;
                // An empty file input still posts a part with no file name.
                let Some(file_name) = file_name.and_then(|f| sanitize_file_name(&f)) else {
                    continue;
                };
                let upload = Some(Upload { file_name, bytes });
                if name == "document" {
                    submission.document = upload;
                } else {
                    submission.template = upload;
                }
            }
            "provider" => {
                let value = field.text().await?;
                if let Ok(kind) = value.parse::<ProviderKind>() {
                    submission.settings.provider = kind;
                }
            }
            "endpoint" => submission.settings.endpoint = field.text().await?.trim().to_string(),
            "local_model" => {
                submission.settings.local_model = field.text().await?.trim().to_string()
            }
            "api_key" => submission.settings.api_key = field.text().await?.trim().to_string(),
            "cloud_model" => {
                submission.settings.cloud_model = field.text().await?.trim().to_string()
            }
            other => tracing::debug!("Ignoring form field {:?}", other),
        }
    }

    Ok(submission)
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

/// Keep only the final path component of a browser-supplied file name.
fn sanitize_file_name(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

/// Write an upload under `dir/slot/`, keeping its file name so the
/// extension still selects the loader.
async fn save_upload(
    dir: &Path,
    slot: &str,
    upload: Option<Upload>,
) -> std::io::Result<Option<PathBuf>> {
    let Some(upload) = upload else {
        return Ok(None);
    };
    let slot_dir = dir.join(slot);
    tokio::fs::create_dir_all(&slot_dir).await?;
    let path = slot_dir.join(&upload.file_name);
    tokio::fs::write(&path, &upload.bytes).await?;
    Ok(Some(path))
}

fn bad_form(e: MultipartError) -> Response {
    tracing::warn!("Malformed form submission: {}", e);
    (StatusCode::BAD_REQUEST, format!("Malformed form: {}", e)).into_response()
}

fn server_error(e: &std::io::Error) -> Response {
    tracing::error!("Failed to store uploads: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to store uploads: {}", e),
    )
        .into_response()
}
