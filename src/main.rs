//! Entry point for the Forfettario Engine binary.
//!
//! Running this binary starts an HTTP server exposing the fiscal
//! engine.  The bind address is read from `FORFETTARIO_BIND_ADDR`
//! (default `127.0.0.1:3000`) and an optional tax configuration file
//! from `FORFETTARIO_TAX_CONFIG`; without it the built-in defaults are
//! used.  Log verbosity follows `RUST_LOG` (default `info`).

use forfettario_engine::api;
use forfettario_engine::config::ServerConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let server = ServerConfig::from_env();
    if let Err(err) = api::serve(server).await {
        tracing::error!(error = ?err, "error running server");
        std::process::exit(1);
    }
}
