//! Relay error types.
//!
//! [`RelayError`] covers failures at the HTTP edge and at startup; it maps
//! to a status code and a small JSON body. [`ExecError`] covers failures of
//! a single agent invocation and carries whatever output the process wrote
//! before it failed.

use std::process::ExitStatus;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// JSON body returned for HTTP-level errors.
///
/// ```json
/// { "error": "deviceId is required" }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

/// Server-side errors outside the WebSocket exchange.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The `deviceId` query parameter was absent or empty.
    #[error("deviceId is required")]
    MissingDeviceId,

    /// A configuration value could not be used.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Binding or serving the listener failed.
    #[error("server io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingDeviceId => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}

/// Failure of one agent command invocation.
///
/// The `Display` text is what the client receives when an invocation fails.
/// Every variant keeps the output captured before the failure, available
/// through [`ExecError::output`].
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The process could not be started.
    #[error("start {program} agent command: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Reading the process output pipes failed.
    #[error("capture {program} agent output: {source}")]
    Capture {
        /// Program whose output could not be read.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Output read before the failure.
        output: String,
    },

    /// The process ran but exited unsuccessfully.
    #[error("run {program} agent command: {status}")]
    Exited {
        /// Program that failed.
        program: String,
        /// Exit status reported by the OS.
        status: ExitStatus,
        /// Combined output of the process.
        output: String,
    },

    /// The invocation was cancelled before the process exited.
    #[error("run {program} agent command: context canceled")]
    Cancelled {
        /// Program that was killed.
        program: String,
        /// Output read before cancellation.
        output: String,
    },

    /// The execution window elapsed before the process exited.
    #[error("run {program} agent command: context deadline exceeded")]
    DeadlineExceeded {
        /// Program that was killed.
        program: String,
        /// Output read before the deadline.
        output: String,
    },
}

impl ExecError {
    /// Returns the output captured before the failure (may be empty).
    #[must_use]
    pub fn output(&self) -> &str {
        match self {
            Self::Spawn { .. } => "",
            Self::Capture { output, .. }
            | Self::Exited { output, .. }
            | Self::Cancelled { output, .. }
            | Self::DeadlineExceeded { output, .. } => output,
        }
    }

    /// Returns `true` if the process was stopped by cancellation or timeout.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::DeadlineExceeded { .. })
    }
}
