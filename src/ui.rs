//! Toolkit-independent interface state.
//!
//! Every user action is a plain function from the current [`ViewState`] (plus
//! whatever the action produced) to the next one. The web front end in
//! `crate::web` only renders a `ViewState` and routes clicks to these
//! functions, so the behaviour is testable without a browser.
//!
//! | Action            | Function                     |
//! |-------------------|------------------------------|
//! | provider radio    | [`ViewState::select_provider`] |
//! | Test Connection   | [`ViewState::apply_probe`]     |
//! | Convert           | [`ViewState::apply_conversion`] |
//! | Clear All         | [`ViewState::clear`]           |

use crate::config::{ConnectionSettings, ProviderKind};
use crate::output::{ConversionOutcome, ProbeReport};
use serde::Serialize;
use std::path::PathBuf;

/// Which settings group is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettingsVisibility {
    pub local: bool,
    pub cloud: bool,
}

impl SettingsVisibility {
    pub fn for_provider(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Local => Self {
                local: true,
                cloud: false,
            },
            ProviderKind::Cloud => Self {
                local: false,
                cloud: true,
            },
        }
    }
}

/// Everything the interface displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    /// Form values as last submitted. The API key is never rendered back.
    pub settings: ConnectionSettings,
    pub visibility: SettingsVisibility,
    /// Display names of the uploaded files, if any.
    pub document_name: Option<String>,
    pub template_name: Option<String>,
    /// Result of the last Test Connection click.
    pub connection_status: String,
    /// Model suggestions for the Ollama model field.
    pub model_choices: Vec<String>,
    /// Conversion status line.
    pub status: String,
    /// Generated XML panel. Empty after a failure.
    pub output_xml: String,
    /// Downloadable file; `None` keeps the download control disabled.
    pub download: Option<PathBuf>,
}

impl Default for ViewState {
    fn default() -> Self {
        let settings = ConnectionSettings::default();
        Self {
            visibility: SettingsVisibility::for_provider(settings.provider),
            settings,
            document_name: None,
            template_name: None,
            connection_status: String::new(),
            model_choices: Vec::new(),
            status: String::new(),
            output_xml: String::new(),
            download: None,
        }
    }
}

impl ViewState {
    /// Provider radio changed: show the matching settings group only.
    pub fn select_provider(mut self, kind: ProviderKind) -> Self {
        self.settings.provider = kind;
        self.visibility = SettingsVisibility::for_provider(kind);
        self
    }

    /// Record the submitted form values.
    pub fn with_settings(self, settings: ConnectionSettings) -> Self {
        let kind = settings.provider;
        Self { settings, ..self }.select_provider(kind)
    }

    /// Test Connection finished.
    ///
    /// On success the model suggestions are replaced by the server's models
    /// and the first one becomes the selected model. On failure both are cleared.
    pub fn apply_probe(mut self, report: &ProbeReport) -> Self {
        self.connection_status = report.status.clone();
        self.model_choices = report.models.clone();
        self.settings.local_model = report.models.first().cloned().unwrap_or_default();
        self
    }

    /// Convert finished.
    ///
    /// Success fills the output panel and enables the download when a file
    /// was written. Failure empties the panel and disables the download.
    pub fn apply_conversion(mut self, outcome: &ConversionOutcome) -> Self {
        self.status = outcome.status.clone();
        match &outcome.output {
            Some(xml) => {
                self.output_xml = xml.clone();
                self.download = outcome.saved_to.clone();
            }
            None => {
                self.output_xml.clear();
                self.download = None;
            }
        }
        self
    }

    /// Record uploaded file names for display.
    pub fn with_uploads(mut self, document: Option<String>, template: Option<String>) -> Self {
        self.document_name = document;
        self.template_name = template;
        self
    }

    /// Clear All: drop both files, the output, the status and the download.
    ///
    /// Provider choice, connection settings and probe results are kept.
    pub fn clear(self) -> Self {
        Self {
            document_name: None,
            template_name: None,
            output_xml: String::new(),
            status: String::new(),
            download: None,
            ..self
        }
    }

    pub fn download_enabled(&self) -> bool {
        self.download.is_some()
    }
}
