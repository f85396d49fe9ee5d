//! WebSocket message types: query parameters, the client request, and the
//! fixed replies for malformed requests.

use serde::Deserialize;

/// Query parameters of the upgrade request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectParams {
    /// Client-supplied session identifier.
    #[serde(rename = "deviceId")]
    pub device_id: Option<String>,
}

impl ConnectParams {
    /// Returns the session identifier if present and non-empty.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.device_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// The single request a client sends after connecting.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientRequest {
    /// Text handed to the agent.
    #[serde(default)]
    pub message: String,
}

/// Why a client frame was rejected. `Display` is the reply text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// The frame was not a JSON object of the expected shape.
    #[error("invalid json payload")]
    InvalidJson,
    /// The `message` field was missing or empty.
    #[error("message is required")]
    EmptyMessage,
}

/// Parses a client frame into a [`ClientRequest`].
///
/// # Errors
///
/// Returns [`RequestError::InvalidJson`] if the payload does not decode and
/// [`RequestError::EmptyMessage`] if `message` is empty.
pub fn parse_request(payload: &[u8]) -> Result<ClientRequest, RequestError> {
    let request: ClientRequest =
        serde_json::from_slice(payload).map_err(|_| RequestError::InvalidJson)?;
    if request.message.is_empty() {
        return Err(RequestError::EmptyMessage);
    }
    Ok(request)
}
