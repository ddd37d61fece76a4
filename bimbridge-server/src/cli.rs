//! Command-line argument parsing for the bridge server

use std::path::PathBuf;

use clap::Parser;

use bimbridge_server::config::AppConfig;

/// bimbridge - HTTP command bridge into a single-threaded CAD document
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file (defaults to the XDG config location)
    #[arg(long, short = 'c', env = "BIMBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen address, overriding `server.listen_addr`
    #[arg(long, env = "BIMBRIDGE_LISTEN")]
    pub listen: Option<String>,

    /// JSON document seed, overriding `document.seed_path`
    #[arg(long)]
    pub seed: Option<PathBuf>,

    /// Job timeout in milliseconds, overriding `bridge.job_timeout_ms`
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Print the default configuration and exit
    #[arg(long, default_value_t = false)]
    pub print_default_config: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Command-line values win over the file
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(listen) = &self.listen {
            config.server.listen_addr = listen.clone();
        }
        if let Some(seed) = &self.seed {
            config.document.seed_path = Some(seed.clone());
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.bridge.job_timeout_ms = timeout_ms;
        }
    }
}
