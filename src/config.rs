use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Command-line / environment configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "edge-latency-bench")]
#[command(about = "Compare global-edge and regional-edge latency from a live dashboard")]
#[command(version)]
pub struct Config {
    /// Address the dashboard and API listen on
    #[arg(long, env = "EDGE_BENCH_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Base URL hosting /api/edge-global and /api/edge-region
    #[arg(long, env = "EDGE_BENCH_TARGET", default_value = "http://localhost:3001")]
    pub target: String,

    /// Per-request timeout in milliseconds (unset: wait indefinitely)
    #[arg(long, env = "EDGE_BENCH_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    /// Directory served as the dashboard
    #[arg(long, env = "EDGE_BENCH_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,
}

impl Config {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}
