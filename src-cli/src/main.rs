//! clinote command-line interface
//!
//! Transcribes clinical session recordings locally, attributes each segment
//! to a speaker role and writes JSON, transcript and subtitle files.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{models::ModelsCommand, process::ProcessArgs};

#[derive(Parser)]
#[command(name = "clinote", version, about = "Speaker-attributed transcripts for clinical sessions")]
struct Cli {
    /// Verbose logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Model cache directory
    #[arg(long, global = true, env = "CLINOTE_MODELS_DIR")]
    models_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process one or more session recordings
    Process(ProcessArgs),

    /// Manage locally cached models
    #[command(subcommand)]
    Models(ModelsCommand),

    /// Check the Ollama server and list its models
    Ollama {
        #[arg(long, env = "CLINOTE_OLLAMA_URL", default_value = "http://localhost:11434")]
        url: String,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let manager = commands::model_manager(cli.models_dir)?;

    match cli.command {
        Command::Process(args) => commands::process::run(args, &manager).await,
        Command::Models(command) => commands::models::run(command, &manager).await,
        Command::Ollama { url } => commands::ollama::run(&url).await,
    }
}
