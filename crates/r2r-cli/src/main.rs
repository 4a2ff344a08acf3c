use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use r2r_application::DiagnosticsLayer;
use r2r_infrastructure::ConfigService;
use tokio::sync::mpsc;

mod commands;
mod logging;
mod render;

#[derive(Parser)]
#[command(name = "r2r")]
#[command(about = "Research2Runtime - turn research papers into verified, runnable code", long_about = None)]
struct Cli {
    /// Pipeline service URL (overrides config.toml and R2R_API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Path to config.toml (default: <config_dir>/r2r/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session (default)
    Repl,
    /// Process one paper and print the result
    Process {
        /// Path to the PDF
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_service = match &cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new()?,
    };
    let config = config_service.resolve(cli.base_url.as_deref())?;

    let command = cli.command.unwrap_or(Commands::Repl);
    let one_shot = matches!(command, Commands::Process { .. });
    let (diag_tx, diag_rx) = mpsc::unbounded_channel();
    let diagnostics = DiagnosticsLayer::new(diag_tx, tracing::Level::WARN);
    let _log_guard = logging::init(&config.logging, diagnostics, one_shot)?;

    tracing::info!(
        base_url = %config.api.base_url,
        config = %config_service.path().display(),
        "Starting r2r v{}",
        env!("CARGO_PKG_VERSION")
    );

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let controller = commands::build_controller(&config, events_tx)?;

    match command {
        Commands::Repl => {
            commands::repl::run(controller, events_rx, diag_rx, &config.api.base_url).await
        }
        Commands::Process { file } => {
            // Warnings already reach stderr in this mode
            drop(diag_rx);
            commands::process::run(controller, events_rx, &file).await
        }
    }
}
