//! CLI binary for dekhovalue.
//!
//! A thin shim over the library crate: `serve` runs the HTTP endpoint,
//! `analyze` runs one local video and prints a quote, `models` lists what
//! the key can use.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use dekhovalue::quote::{demo_result, format_inr, render_quote};
use dekhovalue::server::{self, DEFAULT_MAX_UPLOAD_BYTES};
use dekhovalue::{
    analyze_file, available_models, recommend_model, AnalysisProgressCallback, AnalyzerConfig,
    ExtractionResult, ProgressCallback, Strictness,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::net::SocketAddr;
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that narrates the run: staging, upload, processing, extraction.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Staging");
        bar.set_message("Reading video…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_staged(&self, bytes: u64) {
        self.bar.println(format!(
            "  {} Staged {}",
            green("✓"),
            dim(&format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0)))
        ));
        self.bar.set_prefix("Uploading");
        self.bar.set_message("Sending video to Gemini…");
    }

    fn on_uploaded(&self, name: &str) {
        self.bar
            .println(format!("  {} Uploaded {}", green("✓"), dim(name)));
        self.bar.set_prefix("Processing");
        self.bar.set_message("Waiting for the video to become active…");
    }

    fn on_status_check(&self, attempt: u32, state: &str) {
        self.bar.set_message(format!("check {attempt}: {state}"));
    }

    fn on_extraction_start(&self) {
        self.bar.println(format!("  {} Video ready", green("✓")));
        self.bar.set_prefix("Analyzing");
        self.bar.set_message("Identifying assets…");
    }

    fn on_complete(&self, item_count: Option<usize>) {
        self.bar.finish_and_clear();
        match item_count {
            Some(n) => eprintln!("{} {} assets identified", green("✔"), bold(&n.to_string())),
            None => eprintln!("{} Analysis failed", red("✘")),
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP endpoint (POST /api/analyze, multipart field "video")
  dekhovalue serve --bind 0.0.0.0:3000

  # Analyze a local walk-through video and print a quote
  dekhovalue analyze living-room.mp4

  # Raw JSON instead of the quote
  dekhovalue analyze --json bedroom.mov > inventory.json

  # Serve, passing unexpected risk labels through unchanged
  dekhovalue serve --lenient

  # Show the sample quote without calling the API
  dekhovalue analyze --demo

  # Which models can this key use?
  dekhovalue models

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY      Google Gemini API key (also read from .env.local / .env)
  GEMINI_BASE_URL     Override the API base URL
  DEKHOVALUE_MODEL    Override the model ID (default gemini-2.5-flash-lite)
  DEKHOVALUE_BIND     Listen address for `serve`
  DEKHOVALUE_LENIENT  Skip risk-label and amount validation (true/false)
  RUST_LOG            Log filter, e.g. dekhovalue=debug
"#;

/// Turn a room video into an insurance inventory with Gemini.
#[derive(Parser, Debug)]
#[command(
    name = "dekhovalue",
    version,
    about = "Turn a room video into an insurance inventory and coverage quote",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Gemini API key.
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model ID (e.g. gemini-2.5-flash-lite, gemini-2.5-flash).
    #[arg(long, global = true, env = "DEKHOVALUE_MODEL")]
    model: Option<String>,

    /// Gemini REST base URL.
    #[arg(long, global = true, env = "GEMINI_BASE_URL")]
    base_url: Option<String>,

    /// Accept unknown risk labels and negative amounts (pass them through).
    #[arg(long, global = true, env = "DEKHOVALUE_LENIENT")]
    lenient: bool,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, global = true, env = "DEKHOVALUE_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DEKHOVALUE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DEKHOVALUE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve POST /api/analyze and GET /health.
    Serve(ServeArgs),
    /// Analyze one local video file.
    Analyze(AnalyzeArgs),
    /// List models that support content generation.
    Models,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "DEKHOVALUE_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Largest accepted request body, in MiB.
    #[arg(long, env = "DEKHOVALUE_MAX_UPLOAD_MB",
          default_value_t = (DEFAULT_MAX_UPLOAD_BYTES / (1024 * 1024)) as u64)]
    max_upload_mb: u64,

    /// Directory for staged uploads (default: OS temp dir).
    #[arg(long, env = "DEKHOVALUE_STAGING_DIR")]
    staging_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Video file to analyze.
    #[arg(required_unless_present = "demo")]
    input: Option<PathBuf>,

    /// Print the sample quote without calling the API.
    #[arg(long, conflicts_with = "input")]
    demo: bool,

    /// Output the raw inventory JSON instead of a quote.
    #[arg(long)]
    json: bool,

    /// Seconds between readiness checks.
    #[arg(long, default_value_t = 2)]
    poll_interval: u64,

    /// Give up if the video is not ready after this many seconds.
    #[arg(long, default_value_t = 300)]
    max_wait: u64,

    /// Path to a text file containing a custom extraction prompt.
    #[arg(long)]
    prompt: Option<PathBuf>,

    /// Disable the progress spinner.
    #[arg(long, env = "DEKHOVALUE_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Local env files first so clap's `env = ...` attributes see them.
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback an interactive analyze run needs,
    // so library INFO logs are muted while it is active.
    let spinner_active = match &cli.command {
        Command::Analyze(a) => !cli.quiet && !a.no_progress && !a.json && !a.demo,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || spinner_active {
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

    match &cli.command {
        Command::Serve(args) => run_serve(&cli, args).await,
        Command::Analyze(args) => run_analyze(&cli, args, spinner_active).await,
        Command::Models => run_models(&cli).await,
    }
}

async fn run_serve(cli: &Cli, args: &ServeArgs) -> Result<()> {
    let mut builder = base_builder(cli);
    if let Some(ref dir) = args.staging_dir {
        builder = builder.staging_dir(dir);
    }
    let config = builder.build().context("Invalid configuration")?;
    let max_bytes = usize::try_from(args.max_upload_mb.saturating_mul(1024 * 1024))
        .context("--max-upload-mb is too large for this platform")?;

    server::serve(config, args.bind, max_bytes)
        .await
        .with_context(|| format!("Server on {} failed", args.bind))
}

async fn run_analyze(cli: &Cli, args: &AnalyzeArgs, show_progress: bool) -> Result<()> {
    if args.demo {
        return print_result(&demo_result(), args.json);
    }
    let Some(ref input) = args.input else {
        anyhow::bail!("an input video is required unless --demo is given");
    };

    let mut builder = base_builder(cli)
        .poll_interval(Duration::from_secs(args.poll_interval))
        .max_processing_wait(Duration::from_secs(args.max_wait));

    if let Some(ref path) = args.prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.prompt(prompt);
    }
    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    let output = analyze_file(input, &config)
        .await
        .context("Analysis failed")?;

    print_result(&output.result, args.json)?;

    if !cli.quiet && !args.json {
        let s = &output.stats;
        eprintln!(
            "   {}",
            dim(&format!(
                "upload {}ms  /  processing {}ms ({} checks)  /  extraction {}ms  /  {}ms total",
                s.upload_duration_ms,
                s.processing_duration_ms,
                s.status_checks,
                s.extraction_duration_ms,
                s.total_duration_ms
            ))
        );
        if let Some(diff) = output.result.value_discrepancy() {
            eprintln!(
                "   {}",
                red(&format!(
                    "note: listed total differs from the item sum by Rs. {}",
                    format_inr(diff)
                ))
            );
        }
    }
    Ok(())
}

async fn run_models(cli: &Cli) -> Result<()> {
    let config = base_builder(cli).build().context("Invalid configuration")?;
    let models = available_models(&config)
        .await
        .context("Failed to list models")?;

    if models.is_empty() {
        eprintln!("{} No models with generateContent support", red("✘"));
        return Ok(());
    }

    println!("Models supporting generateContent:");
    for m in &models {
        match m.display_name {
            Some(ref d) => println!("  {:<40} {}", m.id(), dim(d)),
            None => println!("  {}", m.id()),
        }
    }
    if let Some(best) = recommend_model(&models, &config.model) {
        println!();
        println!("Recommended: {}", bold(best.id()));
    }
    Ok(())
}

/// Map the global flags onto a config builder.
fn base_builder(cli: &Cli) -> dekhovalue::AnalyzerConfigBuilder {
    let strictness = if cli.lenient {
        Strictness::Lenient
    } else {
        Strictness::Strict
    };
    let mut builder = AnalyzerConfig::builder()
        .request_timeout(Duration::from_secs(cli.api_timeout))
        .strictness(strictness);
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref url) = cli.base_url {
        builder = builder.base_url(url);
    }
    builder
}

fn print_result(result: &ExtractionResult, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(result).context("Failed to serialise output")?;
        println!("{out}");
    } else {
        print!("{}", render_quote(result, Local::now().date_naive()));
    }
    Ok(())
}
