//! CLI binary for edgequake-pdfreview.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `ReviewRequest` + `ReviewConfig` and prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdfreview::{
    list_models, prepare_request, review, review_to_file, DocumentCategory, ProgressCallback,
    ReviewConfig, ReviewProgressCallback, ReviewRequest, SafetyThreshold, UserMode,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one spinner whose prefix tracks the current
/// phase, plus a log line per document read and per model attempt.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Checking inputs…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl ReviewProgressCallback for CliProgressCallback {
    fn on_connecting(&self) {
        self.bar.set_prefix("Connecting");
        self.bar.set_message("Preparing the generation backend…");
    }

    fn on_reading(&self, category: DocumentCategory) {
        self.bar.set_prefix("Reading");
        self.bar.set_message(category.label().to_string());
    }

    fn on_document_ready(&self, category: DocumentCategory, chars: usize) {
        self.bar.println(format!(
            "  {} {:<30}  {}",
            green("✓"),
            category.label(),
            dim(&format!("{chars:>7} chars")),
        ));
    }

    fn on_sending(&self, model: &str, attempt: usize, total: usize) {
        self.bar.set_prefix("Sending");
        self.bar
            .set_message(format!("{model}  {}", dim(&format!("({attempt}/{total})"))));
    }

    fn on_attempt_failed(&self, model: &str, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} {:<30}  {}", red("✗"), model, red(&msg)));
    }

    fn on_success(&self, model: &str, response_len: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} Response from {}  {}",
            green("✔"),
            bold(model),
            dim(&format!("{response_len} chars"))
        );
    }

    fn on_exhausted(&self, attempted: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} model(s) tried, none answered",
            red("✘"),
            bold(&attempted.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Student ethics application with the supervisor's comments
  pdfreview --mode student --doc application=application.pdf \
            --notes "Interviews are with adult staff only."

  # External researcher: protocol, consent form, and home approval letter
  pdfreview --mode researcher --doc protocol=protocol.pdf \
            --doc consent-form=consent.pdf --doc approval=irb_letter.pdf -o review.md

  # Try a custom model order
  pdfreview --models gemini-1.5-pro,gemini-pro --mode researcher --doc protocol=p.pdf

  # Route through another provider
  pdfreview --provider openai --models gpt-4.1-mini --mode student --doc application=a.pdf

  # Show what would be sent, without calling any model
  pdfreview --show-request --mode student --doc application=a.pdf

  # List models available to your key
  pdfreview --list-models

CATEGORIES:
  Mode         Slug               Input   Required
  ──────────   ────────────────   ─────   ────────
  student      application        PDF     yes
  student      info-sheet         PDF
  student      supervisor-notes   text    (--notes)
  researcher   protocol           PDF     yes
  researcher   consent-form       PDF
  researcher   approval           PDF
  researcher   notes              text    (--notes)

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Generative Language API key (GOOGLE_API_KEY also accepted)
  PDFREVIEW_MODELS        Comma-separated model candidates
  PDFREVIEW_PROVIDER      edgequake-llm provider instead of Gemini
  OPENAI_API_KEY, ANTHROPIC_API_KEY   Keys for --provider backends
"#;

/// Pre-screen ethics submissions by sending PDF text to a hosted LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pdfreview",
    version,
    about = "Pre-screen ethics submissions by sending PDF text to a hosted LLM",
    long_about = "Extract text from the PDFs a student or external researcher submits, combine it \
with a fixed review prompt, and send it to a list of models in order until one answers.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Who is submitting: student or researcher.
    #[arg(long, env = "PDFREVIEW_MODE", value_enum, default_value = "student")]
    mode: ModeArg,

    /// Document to upload, as <category>=<path-or-url>. Repeatable.
    #[arg(long = "doc", value_name = "CATEGORY=PATH")]
    docs: Vec<String>,

    /// Pasted notes for the mode's text category.
    #[arg(long, conflicts_with = "notes_file")]
    notes: Option<String>,

    /// Read pasted notes from a file.
    #[arg(long)]
    notes_file: Option<PathBuf>,

    /// Write the response to this file instead of stdout.
    #[arg(short, long, env = "PDFREVIEW_OUTPUT")]
    output: Option<PathBuf>,

    /// Generative Language API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Comma-separated model candidates, tried in order.
    #[arg(long, env = "PDFREVIEW_MODELS", value_delimiter = ',')]
    models: Vec<String>,

    /// Use an edgequake-llm provider (openai, anthropic, ollama, …) instead of Gemini.
    #[arg(long, env = "PDFREVIEW_PROVIDER")]
    provider: Option<String>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "PDFREVIEW_TEMPERATURE", default_value_t = 0.4)]
    temperature: f32,

    /// Nucleus sampling mass (0.0–1.0).
    #[arg(long, env = "PDFREVIEW_TOP_P", default_value_t = 0.95)]
    top_p: f32,

    /// Top-k sampling.
    #[arg(long, env = "PDFREVIEW_TOP_K", default_value_t = 40)]
    top_k: u32,

    /// Max output tokens.
    #[arg(long, env = "PDFREVIEW_MAX_OUTPUT_TOKENS", default_value_t = 8192)]
    max_output_tokens: u32,

    /// Safety threshold for every harm category.
    #[arg(long, env = "PDFREVIEW_SAFETY", value_enum, default_value = "medium")]
    safety: SafetyArg,

    /// Per-document character cap.
    #[arg(long, env = "PDFREVIEW_MAX_CHARS", default_value_t = 40_000)]
    max_chars: usize,

    /// Path to a text file containing a custom instruction prompt.
    #[arg(long, env = "PDFREVIEW_PROMPT")]
    prompt: Option<PathBuf>,

    /// HTTP download timeout in seconds for URL documents.
    #[arg(long, env = "PDFREVIEW_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-call timeout in seconds (default: none).
    #[arg(long, env = "PDFREVIEW_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// List models that support generateContent and exit.
    #[arg(long)]
    list_models: bool,

    /// Print the assembled request instead of sending it.
    #[arg(long)]
    show_request: bool,

    /// Output structured JSON (ReviewOutput) instead of the response text.
    #[arg(long, env = "PDFREVIEW_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDFREVIEW_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFREVIEW_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFREVIEW_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Student,
    #[value(alias = "external", alias = "external-researcher")]
    Researcher,
}

impl From<ModeArg> for UserMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Student => UserMode::Student,
            ModeArg::Researcher => UserMode::Researcher,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SafetyArg {
    Off,
    High,
    Medium,
    Low,
}

impl From<SafetyArg> for SafetyThreshold {
    fn from(v: SafetyArg) -> Self {
        match v {
            SafetyArg::Off => SafetyThreshold::BlockNone,
            SafetyArg::High => SafetyThreshold::BlockOnlyHigh,
            SafetyArg::Medium => SafetyThreshold::BlockMediumAndAbove,
            SafetyArg::Low => SafetyThreshold::BlockLowAndAbove,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; it
    // already reports every phase.
    let show_progress =
        !cli.quiet && !cli.no_progress && !cli.json && !cli.show_request && !cli.list_models;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ReviewProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).await?;

    // ── List-models mode ─────────────────────────────────────────────────
    if cli.list_models {
        let models = list_models(&config).await.context("Failed to list models")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&models).context("Failed to serialise models")?
            );
        } else {
            println!("Models supporting generateContent:");
            for m in &models {
                match m.display_name {
                    Some(ref d) => println!("  {:<32} {}", m.id(), dim(d)),
                    None => println!("  {}", m.id()),
                }
            }
        }
        return Ok(());
    }

    let request = build_request(&cli).await?;

    // ── Show-request mode ────────────────────────────────────────────────
    if cli.show_request {
        let text = prepare_request(&request, &config)
            .await
            .context("Failed to assemble request")?;
        write_stdout(&text)?;
        return Ok(());
    }

    // ── Run review ───────────────────────────────────────────────────────
    let output = if let Some(ref output_path) = cli.output {
        let output = review_to_file(&request, output_path, &config)
            .await
            .context("Review failed")?;
        if !cli.quiet {
            eprintln!(
                "{}  {}  →  {}",
                green("✔"),
                output.model,
                bold(&output_path.display().to_string()),
            );
        }
        output
    } else {
        let output = review(&request, &config).await.context("Review failed")?;
        if cli.json {
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
            println!("{json}");
        } else {
            write_stdout(&output.text)?;
        }
        output
    };

    if !cli.quiet && !cli.json {
        for doc in output.documents.iter().filter(|d| d.truncated) {
            eprintln!(
                "{} {} truncated to {} of {} chars",
                cyan("⚠"),
                doc.label,
                cli.max_chars,
                doc.chars
            );
        }
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  {} attempt(s), {}ms total",
            dim(&output.stats.input_tokens.to_string()),
            dim(&output.stats.output_tokens.to_string()),
            output.stats.attempts,
            output.stats.total_duration_ms,
        );
    }

    Ok(())
}

fn write_stdout(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

/// Map CLI args to `ReviewConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ReviewConfig> {
    let mut builder = ReviewConfig::builder()
        .temperature(cli.temperature)
        .top_p(cli.top_p)
        .top_k(cli.top_k)
        .max_output_tokens(cli.max_output_tokens)
        .safety_threshold(cli.safety.into())
        .max_chars_per_document(cli.max_chars)
        .download_timeout_secs(cli.download_timeout);

    let api_key = cli
        .api_key
        .clone()
        .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
        .filter(|k| !k.trim().is_empty());
    if let Some(key) = api_key {
        builder = builder.api_key(key);
    }
    if !cli.models.is_empty() {
        builder = builder.models(cli.models.iter().cloned());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(ref path) = cli.prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.instruction_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Map `--mode`, `--doc`, and `--notes` to a `ReviewRequest`.
async fn build_request(cli: &Cli) -> Result<ReviewRequest> {
    let mut request = ReviewRequest::new(cli.mode.into());

    for doc in &cli.docs {
        let (slug, path) = parse_doc_arg(doc)?;
        request = request.with_pdf(slug, path)?;
    }

    let notes = match (&cli.notes, &cli.notes_file) {
        (Some(text), _) => Some(text.clone()),
        (None, Some(path)) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read notes from {:?}", path))?,
        ),
        (None, None) => None,
    };
    if let Some(text) = notes {
        request = request.with_notes(text)?;
    }

    Ok(request)
}

/// Split `category=path` into its parts.
fn parse_doc_arg(s: &str) -> Result<(&str, &str)> {
    let (slug, path) = s
        .split_once('=')
        .with_context(|| format!("Invalid --doc '{s}': expected <category>=<path-or-url>"))?;
    let (slug, path) = (slug.trim(), path.trim());
    if slug.is_empty() || path.is_empty() {
        anyhow::bail!("Invalid --doc '{s}': category and path must both be non-empty");
    }
    Ok((slug, path))
}
