//! WebSocket layer: upgrade handling, the single-request exchange, request
//! parsing, and output rendering.
//!
//! The endpoint at `/ws?deviceId=<id>` accepts one JSON request per
//! connection, runs the agent for it, replies with one text frame, and
//! closes.

pub mod connection;
pub mod extract;
pub mod handler;
pub mod messages;
