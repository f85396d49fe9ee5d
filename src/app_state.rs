//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::RelayConfig;
use crate::executor::{CommandExecutor, OpenClawExecutor};
use crate::ws::extract::OutputMode;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Executor invoked once per WebSocket request.
    pub executor: Arc<dyn CommandExecutor>,
    /// Execution window for one request.
    pub request_timeout: Duration,
    /// How command output becomes the reply frame.
    pub output_mode: OutputMode,
    /// Parent of every per-request execution context. Cancelled on
    /// shutdown.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Builds state that runs the configured agent program.
    #[must_use]
    pub fn from_config(config: &RelayConfig) -> Self {
        let executor = Arc::new(OpenClawExecutor::with_program(config.agent_program.clone()));
        Self::with_executor(executor, config)
    }

    /// Builds state around an arbitrary executor.
    #[must_use]
    pub fn with_executor(executor: Arc<dyn CommandExecutor>, config: &RelayConfig) -> Self {
        Self {
            executor,
            request_timeout: config.request_timeout(),
            output_mode: config.output_mode,
            shutdown: CancellationToken::new(),
        }
    }
}
