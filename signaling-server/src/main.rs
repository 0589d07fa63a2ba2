use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use log::{error, info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use fleetcam_signaling_server::registry::Registry;
use fleetcam_signaling_server::router::create_router;

const DEFAULT_ADDRESS: &str = "0.0.0.0:6033";

const ADDRESS_ENV_VAR: &str = "FLEETCAM_SIGNALING_ADDR";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    TermLogger::init(
        LevelFilter::Debug,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let address = env::args()
        .nth(1)
        .or_else(|| env::var(ADDRESS_ENV_VAR).ok())
        .unwrap_or_else(|| DEFAULT_ADDRESS.to_owned());
    let address = SocketAddr::from_str(&address)?;

    let registry = Registry::new();
    let app = create_router(registry.clone());

    info!("signaling server listening on {}", address);
    axum::Server::bind(&address)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(registry))
        .await?;

    Ok(())
}

/// Completes on ctrl-c, dropping every registered client so the server
/// stops with an empty registry.
async fn shutdown_signal(registry: Registry) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for the shutdown signal: {}", e);
        return;
    }
    info!("shutdown signal received");
    registry.clear().await;
}
