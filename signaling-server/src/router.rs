use axum::extract::ws::WebSocketUpgrade;
use axum::response::Response;
use axum::routing::get;
use axum::{Extension, Router};

use crate::registry::Registry;
use crate::relay::client_connected;

#[allow(clippy::unused_async)]
async fn health_handler() -> &'static str {
    "OK"
}

#[allow(clippy::unused_async)]
async fn ws_handler(ws: WebSocketUpgrade, Extension(registry): Extension<Registry>) -> Response {
    ws.on_upgrade(move |socket| client_connected(socket, registry))
}

/// Builds the relay router around the given registry.
///
/// Exposes the signaling endpoint on `/ws` and a plain-text health check on
/// `/health`.
pub fn create_router(registry: Registry) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(Extension(registry))
}
