//! Browser front end.
//!
//! A single page with the provider toggle, connection settings, the two file
//! uploads and the output panel. Convert and Clear All post the main form;
//! Test Connection has its own form carrying only the Ollama URL, so file
//! uploads never travel with a probe. Each handler applies the matching
//! [`crate::ui`] transition and redirects back to `/`, except a probe asking
//! for JSON, which gets the report and leaves the page in place.

mod handlers;
mod page;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::ConversionConfig;
use crate::ui::ViewState;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConversionConfig>,
    /// Where successful conversions are written and served from.
    pub output_path: PathBuf,
    /// One interface state for the whole server. Concurrent users share it.
    pub view: Arc<RwLock<ViewState>>,
}

impl AppState {
    pub fn new(config: ConversionConfig, output_path: impl Into<PathBuf>) -> Self {
        Self {
            config: Arc::new(config),
            output_path: output_path.into(),
            view: Arc::new(RwLock::new(ViewState::default())),
        }
    }

    /// Start from the given connection settings instead of the defaults.
    pub fn with_view(self, view: ViewState) -> Self {
        Self {
            view: Arc::new(RwLock::new(view)),
            ..self
        }
    }
}

/// Start the web server.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
