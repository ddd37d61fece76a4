//! bimbridge server - HTTP front end for the host bridge

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use bimbridge_server::config::{AppConfig, ConfigLoader, DEFAULT_CONFIG_TOML};
use bimbridge_server::http::{run_http_server, HttpState};
use bimbridge_server::{BridgeContext, Document, DocumentHost};
use bimbridge_utils::{init_logging_with_config, BridgeError, LogConfig, Result};

mod cli;

use cli::Args;

fn open_document(config: &AppConfig) -> Result<Document> {
    match &config.document.seed_path {
        Some(path) => Document::load_seed(path),
        None => {
            info!("Starting from the built-in template");
            Ok(Document::starter(config.document.title.clone()))
        }
    }
}

async fn run_server(config: AppConfig) -> Result<()> {
    let document = open_document(&config)?;
    let host = DocumentHost::with_api_name(document, config.server.api_name.clone());
    let handle = BridgeContext::start(host, config.bridge.to_bridge_config())?;

    let addr = config.server.listen_addr.clone();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| BridgeError::Bind {
            addr: addr.clone(),
            source,
        })?;

    let mut state = HttpState::new(handle.client(), config.server.api_name.clone());
    state.metrics_enabled = config.metrics.enabled;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let server = tokio::spawn(run_http_server(listener, Arc::new(state), shutdown_rx));

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
    }
    info!("Shutdown requested");

    let _ = shutdown_tx.send(());
    if let Err(e) = server.await {
        warn!("HTTP server task failed: {}", e);
    }

    // Joining the host thread blocks until queued jobs drain.
    let host = tokio::task::spawn_blocking(move || handle.stop())
        .await
        .map_err(|e| BridgeError::internal(format!("Failed to join host thread: {}", e)))??;
    info!(
        "Document '{}' closed after {} transactions",
        host.document().title(),
        host.document().transaction_count()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if args.print_default_config {
        print!("{}", DEFAULT_CONFIG_TOML);
        return Ok(());
    }

    init_logging_with_config(LogConfig::server())?;
    info!("bimbridge server starting");

    let config =
        ConfigLoader::load_and_validate(args.config.as_deref(), |c| args.apply_overrides(c))?;

    match run_server(config).await {
        Ok(()) => {
            info!("bimbridge server stopped");
            Ok(())
        }
        Err(e) => {
            error!("bimbridge server error: {}", e);
            Err(e)
        }
    }
}
