//! bimbridge proxy - MCP tools over the bridge's HTTP routes
//!
//! Runs as a separate process speaking MCP on stdio. Each tool call becomes
//! one HTTP request against the bridge; logs go to a file because stdout
//! carries the protocol.

use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use bimbridge_utils::{init_logging_with_config, BridgeError, LogConfig, Result};

mod client;
mod error;
mod protocol;
mod server;
mod tools;

use client::{ClientConfig, RouteClient, DEFAULT_ROUTES_URL};
use server::ToolProxy;

/// bimbridge-proxy - MCP tool server for a running bimbridge bridge
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the bridge routes, including the api name
    #[arg(long, env = "BIMBRIDGE_ROUTES_URL", default_value = DEFAULT_ROUTES_URL)]
    routes_url: String,

    /// Timeout for GET routes, in seconds
    #[arg(long, default_value_t = 15)]
    get_timeout_secs: u64,

    /// Timeout for POST routes, in seconds
    #[arg(long, default_value_t = 30)]
    post_timeout_secs: u64,

    /// TCP connect timeout, in milliseconds
    #[arg(long, default_value_t = 3000)]
    connect_timeout_ms: u64,
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            routes_url: self.routes_url.clone(),
            get_timeout: Duration::from_secs(self.get_timeout_secs),
            post_timeout: Duration::from_secs(self.post_timeout_secs),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging_with_config(LogConfig::proxy())?;
    info!("bimbridge proxy starting");

    let client = RouteClient::new(args.client_config())?;
    let mut proxy = ToolProxy::new(client);

    match proxy.run().await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("bimbridge proxy error: {}", e);
            Err(BridgeError::protocol(e.to_string()))
        }
    }
}
