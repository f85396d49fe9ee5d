//! # clawproxy
//!
//! WebSocket relay for the `openclaw` agent CLI.
//!
//! A client connects to `/ws?deviceId=<id>`, sends one JSON request
//! `{"message": "..."}`, and receives one text frame holding the agent's
//! output or an error description. The server then closes the connection.
//!
//! ## Architecture
//!
//! ```text
//! Client (WebSocket)
//!     │
//!     ├── WS Handler (ws/)          validate deviceId, upgrade
//!     ├── Connection (ws/)          read → parse → execute → reply → close
//!     │
//!     ├── CommandExecutor (executor/)
//!     │
//!     └── openclaw agent --session-id <id> --message <msg> --json
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod executor;
pub mod server;
pub mod ws;
