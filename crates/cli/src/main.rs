//! `prompt-chain` entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: load the TOML file named by `--config` (or
//!    `PROMPT_CHAIN_CONFIG`) with `${VAR}` expansion.
//! 2. **Wire observability**: install `tracing-subscriber` with a JSON or
//!    pretty layer and, when configured, an OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: build the HTTP backends from the `llm`
//!    crate and register them with a [`BackendDispatcher`].
//! 4. **Run one invocation**: read a frame from `--input`, `--message` or
//!    stdin, run the chain, and print every emitted frame to stdout as one
//!    JSON line `{"output": "step1", "frame": {...}}`.
//!
//! Exits 0 when every step completed, 2 when the chain halted.

mod config;
mod telemetry;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use llm::{AnthropicBackend, OpenAiBackend, ProviderSettings};
use nodes::{BackendDispatcher, ChannelSink, Emitted, PromptChainNode};
use pipeline::{Frame, NodeId};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::{AppConfig, LogFormat, DEFAULT_SERVICE_NAME};

const HALTED_EXIT_CODE: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "prompt-chain", version, about = "Run a sequential prompt chain over one input frame")]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(long, env = "PROMPT_CHAIN_CONFIG")]
    config: Option<PathBuf>,

    /// JSON file holding the input frame.
    #[arg(long, conflicts_with = "message")]
    input: Option<PathBuf>,

    /// Free-text input, wrapped in a frame as `other_data.message`.
    #[arg(long)]
    message: Option<String>,

    /// Overrides `telemetry.log_format`.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    let telemetry = telemetry::init(
        args.log_format.unwrap_or(config.telemetry.log_format),
        &config.telemetry,
    );
    let result = run(&args, config).await;
    telemetry.shutdown();
    result
}

async fn run(args: &Args, config: AppConfig) -> Result<ExitCode> {
    let frame = read_frame(args)?;
    let dispatcher = build_dispatcher(&config);

    let id = NodeId::new(DEFAULT_SERVICE_NAME).context("node id must not be empty")?;
    let node = PromptChainNode::new(id, config.chain, dispatcher)
        .context("invalid chain configuration")?;
    info!(node = %node.id(), steps = node.config().len(), "prompt chain configured");

    let (sink, rx) = ChannelSink::new();
    let printer = tokio::spawn(print_frames(rx));

    let outcome = node.process(frame, &sink).await;
    drop(sink);
    printer.await.context("output printer panicked")??;

    let outcome = outcome?;
    if outcome.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(
            failed_step = ?outcome.state.halted_at(),
            executed = outcome.steps_executed(),
            "prompt chain halted"
        );
        Ok(ExitCode::from(HALTED_EXIT_CODE))
    }
}

fn build_dispatcher(config: &AppConfig) -> BackendDispatcher {
    let openai = config.providers.openai.apply(ProviderSettings::openai());
    let anthropic = config.providers.anthropic.apply(ProviderSettings::anthropic());

    let mut dispatcher = BackendDispatcher::new()
        .with_backend(Arc::new(OpenAiBackend::new(openai)))
        .with_backend(Arc::new(AnthropicBackend::new(anthropic)));

    match &config.local {
        Some(local) => {
            dispatcher = dispatcher.with_backend(Arc::new(OpenAiBackend::local(local.settings())));
        }
        None => info!("no [local] endpoint configured; local steps will halt"),
    }

    if let Some(secs) = config.runtime.request_timeout_secs {
        dispatcher = dispatcher.with_request_timeout(Duration::from_secs(secs));
    }

    dispatcher
}

fn read_frame(args: &Args) -> Result<Frame> {
    if let Some(message) = &args.message {
        return Ok(Frame::with_message(message.clone()));
    }

    let raw = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input frame {}", path.display()))?,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read input frame from stdin")?;
            raw
        }
    };

    serde_json::from_str(&raw).context("input is not a valid frame")
}

async fn print_frames(mut rx: mpsc::UnboundedReceiver<Emitted>) -> Result<()> {
    while let Some(Emitted { channel, frame }) = rx.recv().await {
        let line = json!({ "output": channel.to_string(), "frame": frame });
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}
