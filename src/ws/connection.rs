//! Single-request WebSocket exchange.
//!
//! One connection carries exactly one request: read a frame, validate it,
//! run the agent, write at most one text frame, close. Every exit path
//! drops the socket and cancels the execution context.

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tracing::Instrument;

use super::extract::OutputMode;
use super::messages::parse_request;
use crate::app_state::AppState;
use crate::executor::ExecContext;

/// Runs the exchange for one upgraded connection.
pub async fn run_connection(socket: WebSocket, session_id: String, state: AppState) {
    let span = tracing::info_span!("ws", session_id = %session_id);
    serve_request(socket, &session_id, &state)
        .instrument(span)
        .await;
}

async fn serve_request(socket: WebSocket, session_id: &str, state: &AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    tracing::info!("websocket connected");

    let Some(payload) = read_payload(&mut ws_rx).await else {
        return;
    };

    let reply = match parse_request(&payload) {
        Ok(request) => execute(state, session_id, &request.message, &mut ws_rx).await,
        Err(err) => {
            tracing::warn!(error = %err, "rejecting websocket payload");
            Some(err.to_string())
        }
    };

    if let Some(text) = reply {
        tracing::info!(bytes = text.len(), "sending websocket reply");
        if let Err(err) = ws_tx.send(Message::text(text)).await {
            tracing::warn!(error = %err, "write websocket reply failed");
            return;
        }
    }

    if let Err(err) = ws_tx.close().await {
        tracing::debug!(error = %err, "websocket close failed");
    }
    tracing::debug!("websocket connection closed");
}

/// Reads the first data frame, skipping control frames.
///
/// Returns `None` if the client closed or the read failed.
async fn read_payload(ws_rx: &mut SplitStream<WebSocket>) -> Option<Vec<u8>> {
    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(Message::Text(text)) => return Some(text.as_str().as_bytes().to_vec()),
            Ok(Message::Binary(data)) => return Some(data.to_vec()),
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                tracing::info!("websocket closed before request");
                return None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "websocket read failed");
                return None;
            }
        }
    }
    tracing::info!("websocket closed before request");
    None
}

/// Runs the agent and returns the reply frame, if any.
///
/// The socket is watched while the command runs: a close or read error
/// from the client cancels the context so the child process is killed.
async fn execute(
    state: &AppState,
    session_id: &str,
    message: &str,
    ws_rx: &mut SplitStream<WebSocket>,
) -> Option<String> {
    tracing::info!(message_len = message.len(), "received websocket payload");

    let ctx = ExecContext::with_timeout(&state.shutdown, state.request_timeout);
    let _cancel = ctx.cancel_on_drop();

    let mut run = state.executor.run(&ctx, session_id, message);
    let mut client_gone = false;
    let result = loop {
        tokio::select! {
            result = &mut run => break result,
            frame = ws_rx.next(), if !client_gone => match frame {
                Some(Ok(Message::Close(_)) | Err(_)) | None => {
                    tracing::info!("client disconnected while command running; cancelling");
                    client_gone = true;
                    ctx.cancel();
                }
                Some(Ok(_)) => tracing::debug!("ignoring frame received while command running"),
            },
        }
    };

    match result {
        Ok(output) => {
            if !output.is_empty() {
                tracing::debug!(output = %output, "full command output");
            }
            render(state.output_mode, &output)
        }
        Err(err) if err.is_interrupted() => {
            tracing::info!(
                error = %err,
                partial_output_bytes = err.output().len(),
                "executor interrupted"
            );
            Some(err.to_string())
        }
        Err(err) => {
            tracing::warn!(
                error = %err,
                partial_output_bytes = err.output().len(),
                "executor failed"
            );
            Some(err.to_string())
        }
    }
}

fn render(mode: OutputMode, output: &str) -> Option<String> {
    match mode.render(output) {
        Ok(frame) => Some(frame),
        Err(err) => {
            tracing::warn!(%mode, error = %err, "no reply sent");
            None
        }
    }
}
