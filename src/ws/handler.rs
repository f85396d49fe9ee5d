//! Axum WebSocket upgrade handler.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};

use super::connection::run_connection;
use super::messages::ConnectParams;
use crate::app_state::AppState;
use crate::error::RelayError;

/// `GET /ws?deviceId=<id>` — Upgrade to a single-request WebSocket.
///
/// The session identifier is validated before the upgrade is looked at, so
/// a request without `deviceId` gets a 400 JSON error whether or not it
/// carried upgrade headers.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<ConnectParams>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Some(session_id) = params.session_id().map(str::to_owned) else {
        tracing::warn!("reject websocket request: missing deviceId");
        return RelayError::MissingDeviceId.into_response();
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!(session_id, error = %rejection, "websocket upgrade failed");
            return rejection.into_response();
        }
    };

    tracing::info!(session_id, "websocket upgrade requested");
    let failed_id = session_id.clone();
    ws.on_failed_upgrade(move |err| {
        tracing::warn!(session_id = %failed_id, error = %err, "websocket upgrade failed");
    })
    .on_upgrade(move |socket| run_connection(socket, session_id, state))
}
