//! Plain HTTP endpoints served next to the WebSocket relay.

pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Builds the router for all non-WebSocket endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new().merge(system::routes())
}
