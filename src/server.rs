//! Router assembly and the listener entry point.

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::ws::handler::ws_handler;

/// Builds the full application router: `/ws` plus the system endpoints.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves `state` on an already bound listener until `state.shutdown` is
/// cancelled.
///
/// # Errors
///
/// Returns [`RelayError::Io`] if the listener fails.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), RelayError> {
    let addr = listener.local_addr()?;
    let shutdown = state.shutdown.clone();
    tracing::info!(addr = %addr, output_mode = %state.output_mode, "server listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Binds `config.listen_addr` and serves `state` on it.
///
/// # Errors
///
/// Returns [`RelayError::Io`] if the address cannot be bound or the
/// listener fails.
pub async fn run(config: &RelayConfig, state: AppState) -> Result<(), RelayError> {
    tracing::info!(addr = %config.listen_addr, "starting websocket server");
    let listener = TcpListener::bind(config.listen_addr.as_str()).await?;
    serve(listener, state).await
}
