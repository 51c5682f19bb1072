//! CLI binary for xmlfill.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConnectionSettings` / `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use xmlfill::config::{
    DEFAULT_ANTHROPIC_MODEL, DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL, DEFAULT_OUTPUT_FILE,
};
use xmlfill::{
    convert_to_file, probe, ConnectionSettings, ConversionConfig, ConversionRequest, ProviderKind,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Fill a template from a PDF with a local model
  xmlfill convert --document invoice.pdf --template invoice.xml

  # Pick another local model and write elsewhere
  xmlfill convert -d notes.md -t order.xml --model mistral -o order_filled.xml

  # Use Anthropic
  ANTHROPIC_API_KEY=sk-ant-... xmlfill convert -d invoice.pdf -t invoice.xml --provider cloud

  # List installed Ollama models
  xmlfill probe

  # Browser UI on http://127.0.0.1:7860
  xmlfill serve

SUPPORTED DOCUMENTS:
  .pdf (page text via pdfium), .txt, .md, .json, .csv
  Anything else is read as UTF-8 text.

ENVIRONMENT VARIABLES:
  OLLAMA_URL          Ollama base URL (default http://localhost:11434)
  OLLAMA_MODEL        Local model name (default llama3.1)
  ANTHROPIC_API_KEY   Anthropic API key
  ANTHROPIC_MODEL     Cloud model (claude-sonnet-4-20250514, claude-opus-4-20250514)
  XMLFILL_OUTPUT      Output file (default filled_template.xml)
  PDFIUM_LIB_PATH     Path to libpdfium; the system library is used otherwise
  RUST_LOG            Override the log filter

SETUP:
  1. Install Ollama from https://ollama.ai
  2. Run: ollama pull llama3.1
  3. Ollama listens on port 11434
"#;

/// Fill XML templates with data extracted from documents by an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "xmlfill",
    version,
    about = "Fill XML templates with data extracted from documents by a local or cloud LLM",
    long_about = "Extract data from a document (PDF, text, markdown, JSON, CSV) and fill an \
XML template with it, using a local Ollama server or the Anthropic API.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "XMLFILL_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "XMLFILL_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill a template from a document.
    Convert(ConvertArgs),
    /// Check the Ollama server and list its models.
    Probe(ProbeArgs),
    /// Serve the browser UI.
    #[cfg(feature = "web")]
    Serve(ServeArgs),
}

/// Provider selection and credentials.
#[derive(Args, Debug, Clone)]
struct ConnectionArgs {
    /// Provider: local (Ollama) or cloud (Anthropic).
    #[arg(long, env = "XMLFILL_PROVIDER", default_value = "local")]
    provider: ProviderKind,

    /// Ollama base URL.
    #[arg(long, env = "OLLAMA_URL", default_value = DEFAULT_OLLAMA_URL)]
    endpoint: String,

    /// Ollama model name.
    #[arg(long, env = "OLLAMA_MODEL", default_value = DEFAULT_OLLAMA_MODEL)]
    model: String,

    /// Anthropic API key.
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,

    /// Anthropic model.
    #[arg(long, env = "ANTHROPIC_MODEL", default_value = DEFAULT_ANTHROPIC_MODEL)]
    cloud_model: String,
}

impl ConnectionArgs {
    fn settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            provider: self.provider,
            endpoint: self.endpoint.clone(),
            local_model: self.model.clone(),
            api_key: self.api_key.clone(),
            cloud_model: self.cloud_model.clone(),
        }
    }
}

/// Sampling and timeout knobs.
#[derive(Args, Debug, Clone)]
struct TuningArgs {
    /// Sampling temperature for Ollama.
    #[arg(long, env = "XMLFILL_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max tokens Ollama may generate.
    #[arg(long, env = "XMLFILL_NUM_PREDICT", default_value_t = 2000)]
    num_predict: u32,

    /// Max tokens Anthropic may generate.
    #[arg(long, env = "XMLFILL_MAX_TOKENS", default_value_t = 4000)]
    max_tokens: u32,

    /// Ollama generate timeout in seconds.
    #[arg(long, env = "XMLFILL_GENERATE_TIMEOUT", default_value_t = 300)]
    generate_timeout: u64,

    /// Anthropic request timeout in seconds.
    #[arg(long, env = "XMLFILL_CLOUD_TIMEOUT", default_value_t = 120)]
    cloud_timeout: u64,

    /// Connection test timeout in seconds.
    #[arg(long, env = "XMLFILL_PROBE_TIMEOUT", default_value_t = 5)]
    probe_timeout: u64,
}

impl TuningArgs {
    fn config(&self) -> Result<ConversionConfig> {
        ConversionConfig::builder()
            .temperature(self.temperature)
            .num_predict(self.num_predict)
            .cloud_max_tokens(self.max_tokens)
            .generate_timeout(Duration::from_secs(self.generate_timeout))
            .cloud_timeout(Duration::from_secs(self.cloud_timeout))
            .probe_timeout(Duration::from_secs(self.probe_timeout))
            .build()
            .context("Invalid configuration")
    }
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Source document.
    #[arg(short, long)]
    document: PathBuf,

    /// XML template.
    #[arg(short, long)]
    template: PathBuf,

    /// Where to write the filled XML.
    #[arg(short, long, env = "XMLFILL_OUTPUT", default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Print the XML to stdout as well.
    #[arg(long)]
    print: bool,

    /// Print the full outcome (status, output, stats) as JSON.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(flatten)]
    tuning: TuningArgs,
}

#[derive(Args, Debug)]
struct ProbeArgs {
    /// Ollama base URL.
    #[arg(long, env = "OLLAMA_URL", default_value = DEFAULT_OLLAMA_URL)]
    endpoint: String,

    /// Connection test timeout in seconds.
    #[arg(long, env = "XMLFILL_PROBE_TIMEOUT", default_value_t = 5)]
    probe_timeout: u64,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[cfg(feature = "web")]
#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind.
    #[arg(long, env = "XMLFILL_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind.
    #[arg(long, env = "XMLFILL_PORT", default_value_t = 7860)]
    port: u16,

    /// Where successful conversions are written.
    #[arg(short, long, env = "XMLFILL_OUTPUT", default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(flatten)]
    tuning: TuningArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Convert(args) => run_convert(args, cli.quiet).await,
        Command::Probe(args) => run_probe(args).await,
        #[cfg(feature = "web")]
        Command::Serve(args) => run_serve(args).await,
    }
}

async fn run_convert(args: ConvertArgs, quiet: bool) -> Result<()> {
    let config = args.tuning.config()?;
    let settings = args.connection.settings();
    let backend = settings.provider.backend_name();
    let model = settings.model().to_string();
    let request = ConversionRequest::new(&args.document, &args.template, settings);

    let spinner = (!quiet && !args.json).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Converting");
        bar.set_message(format!("{backend} · {model}"));
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let outcome = convert_to_file(&request, &config, &args.output).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialise outcome")?
        );
    } else if let Some(ref xml) = outcome.output {
        if args.print {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(xml.as_bytes())
                .context("Failed to write to stdout")?;
            if !xml.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
        if !quiet {
            eprintln!(
                "{}  {} chars  {}ms  →  {}",
                green(&outcome.status),
                outcome.stats.output_chars,
                outcome.stats.duration_ms,
                bold(&args.output.display().to_string()),
            );
            eprintln!(
                "   {}",
                dim(&format!(
                    "document {} chars  /  template {} chars",
                    outcome.stats.document_chars, outcome.stats.template_chars
                )),
            );
        }
    }

    if !outcome.is_success() {
        if !args.json {
            eprintln!("{}", red(&outcome.status));
        }
        anyhow::bail!("Conversion failed");
    }
    Ok(())
}

async fn run_probe(args: ProbeArgs) -> Result<()> {
    let config = ConversionConfig::builder()
        .probe_timeout(Duration::from_secs(args.probe_timeout))
        .build()
        .context("Invalid configuration")?;

    let report = probe(&args.endpoint, &config).await;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if report.connected {
        println!("{}", green(&report.status));
        for model in &report.models {
            println!("  {model}");
        }
    } else {
        eprintln!("{}", red(&report.status));
    }

    if !report.connected {
        anyhow::bail!("Cannot reach Ollama at {}", args.endpoint);
    }
    Ok(())
}

#[cfg(feature = "web")]
async fn run_serve(args: ServeArgs) -> Result<()> {
    use xmlfill::web::{serve, AppState};
    use xmlfill::ViewState;

    let config = args.tuning.config()?;
    let view = ViewState::default().with_settings(args.connection.settings());
    let state = AppState::new(config, args.output).with_view(view);

    eprintln!(
        "{} Open {} in a browser",
        green("◆"),
        bold(&format!("http://{}:{}", args.host, args.port))
    );
    serve(state, &args.host, args.port).await
}
