mod console;
mod events;
mod logging;
mod output;
mod tone;

use anyhow::{Context, Result};
use clap::Parser;
use logging::LogFormat;
use promptdj_core::PromptStore;
use promptdj_engine::{Engine, EngineConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tone::ToneGateway;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "promptdj")]
#[command(about = "Steer a live music generation session with weighted prompts", long_about = None)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where prompts are loaded from and saved to
    #[arg(long, default_value = "promptdj.json")]
    prompts: PathBuf,

    /// Seconds of audio to buffer before playback starts
    #[arg(long)]
    buffer_time: Option<f64>,

    /// Model identifier to request
    #[arg(long)]
    model: Option<String>,

    /// Prompt text the local session rejects (repeatable)
    #[arg(long = "block", value_name = "TEXT")]
    blocked: Vec<String>,

    /// Run without an audio device
    #[arg(long)]
    headless: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Write logs to a file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => EngineConfig::default(),
    };
    if let Some(buffer_time) = cli.buffer_time {
        config.buffer_time_secs = buffer_time;
    }
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    Ok(config)
}

fn read_config(path: &Path) -> Result<EngineConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.log_file.as_deref(), cli.log_format)?;

    let config = load_config(&cli)?;
    info!(?config, "Starting promptdj");

    let store = PromptStore::new(&cli.prompts);
    let prompts = store.load_or_default(&mut rand::thread_rng());

    let output = output::open_output(cli.headless, config.sample_rate, config.channels);
    let gateway = Arc::new(ToneGateway::new(config.sample_rate, config.channels).with_blocked(cli.blocked.clone()));

    let (engine, handle, engine_events) = Engine::new(config, gateway, output, prompts);
    let engine_task = tokio::spawn(engine.run());
    let printer = tokio::spawn(events::print_events(engine_events));

    tokio::select! {
        result = console::run_console(handle.clone()) => {
            if let Err(e) = result {
                warn!("Console stopped: {:#}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    handle.shutdown().await.context("Engine stopped unexpectedly")?;
    let prompts = engine_task.await.context("Engine task failed")?;
    printer.abort();

    store
        .save(&prompts)
        .with_context(|| format!("Failed to save prompts to {}", store.path().display()))?;
    info!(path = %store.path().display(), "Saved prompts");
    Ok(())
}
