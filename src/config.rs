//! Relay configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`). The binary may override the listen address with `--addr`.

use std::time::Duration;

use crate::error::RelayError;
use crate::ws::extract::OutputMode;

/// Default HTTP listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Default execution window for one agent command, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Largest accepted execution window, in seconds (one day).
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 86_400;

/// Default program launched by the executor.
pub const DEFAULT_AGENT_PROGRAM: &str = "openclaw";

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: String,

    /// Seconds an agent command may run before it is killed.
    pub request_timeout_secs: u64,

    /// How command output is turned into the response frame.
    pub output_mode: OutputMode,

    /// Program launched for every request.
    pub agent_program: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            output_mode: OutputMode::Raw,
            agent_program: DEFAULT_AGENT_PROGRAM.to_string(),
        }
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set or cannot be
    /// parsed. Calls `dotenvy::dotenv().ok()` to optionally load a `.env`
    /// file.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] if `LISTEN_ADDR` is set but empty.
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(addr) => normalize_listen_addr(&addr)?,
            Err(_) => DEFAULT_LISTEN_ADDR.to_string(),
        };

        let request_timeout_secs =
            parse_timeout_secs(std::env::var("REQUEST_TIMEOUT_SECS").ok().as_deref());

        let output_mode = std::env::var("RELAY_OUTPUT_MODE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        let agent_program = std::env::var("OPENCLAW_BIN")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AGENT_PROGRAM.to_string());

        Ok(Self {
            listen_addr,
            request_timeout_secs,
            output_mode,
            agent_program,
        })
    }

    /// Overrides the listen address, e.g. from the `--addr` flag.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] if `addr` is empty.
    pub fn with_listen_addr(mut self, addr: &str) -> Result<Self, RelayError> {
        self.listen_addr = normalize_listen_addr(addr)?;
        Ok(self)
    }

    /// Returns the execution window as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Expands a bare `:PORT` into `0.0.0.0:PORT`; other forms pass through.
///
/// # Errors
///
/// Returns [`RelayError::Config`] for an empty address.
pub fn normalize_listen_addr(addr: &str) -> Result<String, RelayError> {
    let addr = addr.trim();
    if addr.is_empty() {
        return Err(RelayError::Config("listen address is empty".to_string()));
    }
    if addr.starts_with(':') {
        return Ok(format!("0.0.0.0{addr}"));
    }
    Ok(addr.to_string())
}

/// Parses the execution window. Missing, unparsable, zero, or values above
/// [`MAX_REQUEST_TIMEOUT_SECS`] fall back to the default.
fn parse_timeout_secs(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| (1..=MAX_REQUEST_TIMEOUT_SECS).contains(secs))
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
}
