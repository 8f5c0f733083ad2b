use clap::Parser;
use configuration::{init_tracing, load_settings, ExecutionMode, Settings};
use database::{MongoConnectionManager, MongoConnector};
use std::process::ExitCode;
use std::sync::Arc;
use web_server::{run_adapter, run_server, RouteGroups};

/// The main entry point for the Matka API.
///
/// Runs on a single-threaded runtime: requests interleave cooperatively on one
/// thread, and the connection manager serializes the one handshake.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Until tracing is up, stderr is the only place errors can go.
    let (settings, mode) = match prepare(cli) {
        Ok(prepared) => prepared,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    let _guard = match init_tracing(&settings, mode) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(settings, mode).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = format!("{e:#}"), "Fatal error.");
            ExitCode::FAILURE
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// HTTP API backend for the Satta Matka frontend.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Force an execution mode instead of detecting it from the environment.
    #[arg(long, value_enum)]
    mode: Option<ExecutionMode>,

    /// Listen on this port instead of `PORT` (server mode only).
    #[arg(long)]
    port: Option<u16>,
}

// ==============================================================================
// Startup
// ==============================================================================

fn prepare(cli: Cli) -> anyhow::Result<(Settings, ExecutionMode)> {
    let mut settings = load_settings()?;
    if let Some(port) = cli.port {
        settings.port = port;
    }

    let mode = cli.mode.unwrap_or_else(|| ExecutionMode::resolve(&settings));
    Ok((settings, mode))
}

async fn run(settings: Settings, mode: ExecutionMode) -> anyhow::Result<()> {
    tracing::info!(?mode, production = settings.is_production(), "Starting Matka API.");

    let manager: Arc<MongoConnectionManager> = Arc::new(MongoConnectionManager::new(
        MongoConnector::from_settings(&settings),
        settings.mongo_uri.clone(),
    ));

    match mode {
        ExecutionMode::Server => run_server(&settings, manager, RouteGroups::default()).await,
        ExecutionMode::Adapter => run_adapter(&settings, manager, RouteGroups::default()).await,
    }
}
