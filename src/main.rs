//! `websketch` command line
//!
//! Captures a page (URL, `file://` URL or path) into WebSketch IR and manages
//! the persisted capture limits.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use websketch_capture::dom::html::HtmlDocument;
use websketch_capture::fetch::{self, DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT};
use websketch_capture::{
    CaptureHost, CaptureRequest, JsonFileStore, LimitsProvider, PartialLimits, Viewport,
    WithOverrides,
};

#[derive(Parser)]
#[command(name = "websketch")]
#[command(version)]
#[command(about = "Capture web pages into WebSketch IR", long_about = None)]
struct Cli {
    /// Settings file holding the persisted limits
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "WEBSKETCH_SETTINGS",
        default_value = "websketch-settings.json"
    )]
    settings: PathBuf,

    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture a page and print the response JSON
    Capture(CaptureArgs),

    /// Show or change the persisted limits
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Args)]
struct CaptureArgs {
    /// URL, file:// URL or path of the page
    source: String,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,

    /// Write the JSON here instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,

    /// Viewport width in CSS pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Viewport height in CSS pixels
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// HTTP timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// One-off limits for this capture; not persisted
    #[command(flatten)]
    limits: LimitArgs,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the effective limits
    Show,
    /// Persist new values for the given limits
    Set(LimitArgs),
    /// Restore every limit to its default
    Reset,
}

#[derive(Args, Clone, Copy)]
struct LimitArgs {
    /// Maximum element depth below the root
    #[arg(long, value_name = "N", value_parser = parse_positive)]
    max_depth: Option<usize>,

    /// Maximum number of captured elements
    #[arg(long, value_name = "N", value_parser = parse_positive)]
    max_nodes: Option<usize>,

    /// Maximum own-text length in characters
    #[arg(long, value_name = "N", value_parser = parse_positive)]
    max_string_length: Option<usize>,
}

impl LimitArgs {
    fn into_partial(self) -> PartialLimits {
        PartialLimits {
            max_depth: self.max_depth,
            max_nodes: self.max_nodes,
            max_string_length: self.max_string_length,
        }
    }
}

fn parse_positive(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err("must be a positive integer".to_string()),
        Ok(value) => Ok(value),
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let provider = LimitsProvider::new(JsonFileStore::new(&cli.settings));

    match cli.command {
        Command::Capture(args) => run_capture(args, provider).await,
        Command::Settings { action } => run_settings(action, &provider),
    }
}

async fn run_capture(args: CaptureArgs, provider: LimitsProvider<JsonFileStore>) -> anyhow::Result<()> {
    let viewport = Viewport {
        width: args.width,
        height: args.height,
    };

    let source = args.source.clone();
    let timeout_ms = args.timeout_ms;
    let page = tokio::task::spawn_blocking(move || {
        fetch::load_source(&source, DEFAULT_USER_AGENT, timeout_ms)
    })
    .await
    .context("page loader panicked")?
    .with_context(|| format!("Failed to load {}", args.source))?;
    log::info!("Loaded {} ({} bytes)", page.url, page.html.len());

    let limits = Arc::new(WithOverrides::new(provider, args.limits.into_partial()));
    let host = CaptureHost::spawn(move || Ok(HtmlDocument::from_page(page, viewport)), limits).await?;
    let response = host.handle(CaptureRequest::CapturePage).await;
    host.close().await?;

    if let Some(summary) = response.capture.as_ref().and_then(|c| c.truncation_summary()) {
        log::warn!("{}", summary);
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    match args.output {
        Some(path) => {
            std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote capture to {}", path.display());
        }
        None => println!("{}", json),
    }

    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}

fn run_settings(action: SettingsAction, provider: &LimitsProvider<JsonFileStore>) -> anyhow::Result<()> {
    let limits = match action {
        SettingsAction::Show => provider.resolve()?,
        SettingsAction::Set(args) => {
            let partial = args.into_partial();
            if partial.is_empty() {
                bail!("nothing to set; pass --max-depth, --max-nodes or --max-string-length");
            }
            provider.persist(&partial)?
        }
        SettingsAction::Reset => provider.reset()?,
    };
    println!("{}", serde_json::to_string_pretty(&limits)?);
    Ok(())
}
