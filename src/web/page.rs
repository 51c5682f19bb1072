//! HTML for the single page.

use crate::config::{ProviderKind, ANTHROPIC_MODELS};
use crate::ui::ViewState;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #f6f7fb; color: #1f2430; }
header { padding: 1.5rem 2rem 0.5rem; }
main { display: grid; grid-template-columns: 2fr 3fr; gap: 1.5rem; padding: 1rem 2rem; }
section { background: #fff; border-radius: 8px; padding: 1rem 1.25rem; box-shadow: 0 1px 3px rgba(0,0,0,.08); }
label { display: block; font-weight: 600; margin-top: .75rem; }
.info { font-weight: normal; color: #667; font-size: .85em; }
input[type=text], input[type=password], select { width: 100%; padding: .4rem; box-sizing: border-box; }
.status { display: block; min-height: 1.4em; padding: .4rem; background: #f0f1f5; border-radius: 4px; margin-top: .3rem; white-space: pre-wrap; }
textarea { width: 100%; height: 32rem; font-family: ui-monospace, monospace; font-size: .85em; box-sizing: border-box; }
button { margin-top: .75rem; padding: .4rem .9rem; cursor: pointer; }
button.primary { font-size: 1.1em; padding: .6rem 1.4rem; }
.disabled { color: #999; pointer-events: none; }
footer { padding: 0 2rem 2rem; }
"#;

const SCRIPT: &str = r#"
function toggleProvider(value) {
    document.getElementById('local-settings').style.display = value === 'local' ? '' : 'none';
    document.getElementById('cloud-settings').style.display = value === 'cloud' ? '' : 'none';
}

function mirrorEndpoint(value) {
    document.getElementById('endpoint-mirror').value = value;
}

async function testConnection(event) {
    event.preventDefault();
    const form = event.target;
    let resp;
    try {
        resp = await fetch(form.action, {
            method: 'POST',
            body: new FormData(form),
            headers: { 'Accept': 'application/json' },
        });
    } catch (e) {
        form.submit();
        return;
    }
    if (!resp.ok) {
        form.submit();
        return;
    }
    const report = await resp.json();
    document.getElementById('connection-status').textContent = report.status;
    const list = document.getElementById('ollama-models');
    list.replaceChildren(...report.models.map(m => {
        const option = document.createElement('option');
        option.value = m;
        return option;
    }));
    document.getElementById('local-model').value = report.models.length ? report.models[0] : '';
}
"#;

/// Escape HTML special characters for safe rendering.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn display(visible: bool) -> &'static str {
    if visible {
        ""
    } else {
        "display:none"
    }
}

fn checked(on: bool) -> &'static str {
    if on {
        "checked"
    } else {
        ""
    }
}

fn provider_radio(view: &ViewState, kind: ProviderKind) -> String {
    format!(
        r#"<label class="info"><input type="radio" name="provider" value="{value}" onchange="toggleProvider(this.value)" {checked}> {label}</label>"#,
        value = kind,
        checked = checked(view.settings.provider == kind),
        label = kind.label(),
    )
}

fn uploaded(name: &Option<String>) -> String {
    match name {
        Some(n) => format!(r#"<span class="info">last upload: {}</span>"#, html_escape(n)),
        None => String::new(),
    }
}

/// Render the page for `view`.
///
/// The API key input is always emitted empty.
pub fn render(view: &ViewState) -> String {
    let model_options: String = view
        .model_choices
        .iter()
        .map(|m| format!(r#"<option value="{}">"#, html_escape(m)))
        .collect();

    let cloud_options: String = ANTHROPIC_MODELS
        .iter()
        .map(|m| {
            let selected = if *m == view.settings.cloud_model { "selected" } else { "" };
            format!(r#"<option value="{m}" {selected}>{m}</option>"#)
        })
        .collect();

    let download = if view.download_enabled() {
        r#"<a href="/download" download>⬇️ Download XML</a>"#
    } else {
        r#"<span class="disabled">⬇️ Download XML</span>"#
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Document to XML Converter</title>
    <style>{style}</style>
    <script>{script}</script>
</head>
<body>
<header>
    <h1>📄 Document to Standard XML Converter</h1>
    <p>Upload your document and XML template to automatically extract and fill data using AI</p>
</header>
<form id="probe-form" method="post" action="/probe" enctype="multipart/form-data" onsubmit="testConnection(event)"></form>
<form method="post" action="/convert" enctype="multipart/form-data">
<input type="hidden" name="endpoint" id="endpoint-mirror" value="{endpoint}">
<main>
    <section>
        <label>📄 Upload Document
            <input type="file" name="document" accept=".pdf,.txt,.md,.json,.csv">
        </label>
        {document_name}
        <label>📋 Upload XML Template
            <input type="file" name="template" accept=".xml">
        </label>
        {template_name}

        <label>AI Provider <span class="info">Choose between local Ollama or cloud-based Anthropic</span></label>
        {local_radio}
        {cloud_radio}

        <div id="local-settings" style="{local_display}">
            <h3>Ollama Configuration</h3>
            <label>Ollama URL <span class="info">URL where Ollama is running</span>
                <input type="text" name="endpoint" form="probe-form" value="{endpoint}" oninput="mirrorEndpoint(this.value)">
            </label>
            <button type="submit" form="probe-form">🔍 Test Connection</button>
            <span class="status" id="connection-status">{connection_status}</span>
            <label>Select Model <span class="info">Choose from available local models</span>
                <input type="text" name="local_model" id="local-model" list="ollama-models" value="{local_model}">
            </label>
            <datalist id="ollama-models">{model_options}</datalist>
            <p class="info"><strong>Setup Ollama:</strong> install from ollama.ai, run
            <code>ollama pull llama3.1</code>; it listens on port 11434.
            Recommended models: llama3.1, mistral, qwen2.5</p>
        </div>

        <div id="cloud-settings" style="{cloud_display}">
            <h3>Anthropic Configuration</h3>
            <label>API Key <span class="info">Enter your Anthropic API key</span>
                <input type="password" name="api_key" value="" autocomplete="off">
            </label>
            <label>Select Model
                <select name="cloud_model">{cloud_options}</select>
            </label>
            <p class="info">💡 Get your API key from console.anthropic.com</p>
        </div>

        <button type="submit" class="primary" formaction="/convert">🚀 Convert to XML</button>
        <span class="status" id="status">{status}</span>
    </section>

    <section>
        <h3>✨ Filled XML Result</h3>
        <textarea readonly id="output-xml">{output_xml}</textarea>
        <div>
            {download}
            <button type="submit" formaction="/clear" formnovalidate>🔄 Clear All</button>
        </div>
    </section>
</main>
</form>
<footer>
    <h3>📖 How It Works</h3>
    <ol>
        <li><strong>Upload</strong> your source document and XML template</li>
        <li><strong>Configure</strong> your AI provider (local Ollama or cloud Anthropic)</li>
        <li><strong>Convert</strong>: the AI analyzes your document and fills the XML template</li>
        <li><strong>Download</strong> your completed XML file</li>
    </ol>
</footer>
</body>
</html>"#,
        style = STYLE,
        script = SCRIPT,
        document_name = uploaded(&view.document_name),
        template_name = uploaded(&view.template_name),
        local_radio = provider_radio(view, ProviderKind::Local),
        cloud_radio = provider_radio(view, ProviderKind::Cloud),
        local_display = display(view.visibility.local),
        cloud_display = display(view.visibility.cloud),
        endpoint = html_escape(&view.settings.endpoint),
        connection_status = html_escape(&view.connection_status),
        local_model = html_escape(&view.settings.local_model),
        model_options = model_options,
        cloud_options = cloud_options,
        status = html_escape(&view.status),
        output_xml = html_escape(&view.output_xml),
        download = download,
    )
}
