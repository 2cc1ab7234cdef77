//! Signaling relay binary entry point
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (0.0.0.0:3000)
//! cargo run -p sigrelay-relay-server
//!
//! # Custom address, JSON logs
//! cargo run -p sigrelay-relay-server -- --bind 127.0.0.1:8080 --log-json
//!
//! # With logging
//! RUST_LOG=debug cargo run -p sigrelay-relay-server
//! ```
//!
//! # Environment Variables
//!
//! - `SIGRELAY_BIND_ADDRESS`: Server bind address (default: `0.0.0.0:3000`)
//! - `SIGRELAY_LOG_JSON`: Emit JSON log lines (default: `false`)
//! - `RUST_LOG`: Logging level (default: `info`)

use anyhow::Context;
use clap::Parser;
use sigrelay_http::{RelayServer, RelayServerConfig};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Signaling relay
///
/// Holds offer/answer slots per session so two peers can exchange session
/// descriptions and ICE candidates by polling.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0:3000", env = "SIGRELAY_BIND_ADDRESS")]
    bind: String,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false, env = "SIGRELAY_LOG_JSON")]
    log_json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %args.bind,
        "Signaling relay starting"
    );

    let server = RelayServer::new(RelayServerConfig::new(args.bind.clone()))
        .context("Invalid relay configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .thread_name("sigrelay-worker")
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime
        .block_on(server.serve_with_shutdown(shutdown_signal()))
        .with_context(|| format!("Relay on {} failed", args.bind))?;

    info!("Signaling relay shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl+C received, shutting down"),
        Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
    }
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::try_parse_from(["relay-server"]).unwrap();
        assert_eq!(args.bind, "0.0.0.0:3000");
        assert!(!args.log_json);
    }

    #[test]
    fn test_custom_args() {
        let args =
            Args::try_parse_from(["relay-server", "--bind", "127.0.0.1:8080", "--log-json"])
                .unwrap();
        assert_eq!(args.bind, "127.0.0.1:8080");
        assert!(args.log_json);
        assert!(RelayServerConfig::new(args.bind).validate().is_ok());
    }
}
