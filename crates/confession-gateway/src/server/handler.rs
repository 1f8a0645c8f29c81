//! WebSocket handler
//!
//! Handles WebSocket connections and message processing.

use crate::connection::{Connection, ConnectionManager};
use crate::handlers::MessageDispatcher;
use crate::protocol::{CloseCode, GatewayMessage, HelloPayload};
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::interval;

/// How long the send task gets to flush a close frame
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let session_id = ConnectionManager::generate_session_id();
    let settings = state.settings().clone();

    let (tx, mut rx) = mpsc::channel::<GatewayMessage>(settings.message_buffer);
    let (close_tx, mut close_rx) = oneshot::channel::<CloseCode>();

    let connection = state
        .connection_manager()
        .add_connection(session_id.clone(), tx);

    tracing::info!(session_id = %session_id, "WebSocket connection established");

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Send Hello message immediately
    let interval_ms = u64::try_from(settings.heartbeat_interval.as_millis()).unwrap_or(u64::MAX);
    let hello = GatewayMessage::hello(HelloPayload::with_interval(interval_ms));
    if let Ok(json) = hello.to_json() {
        if ws_sink.send(Message::Text(json)).await.is_err() {
            tracing::warn!(session_id = %session_id, "Failed to send Hello message");
            cleanup_connection(&state, &session_id);
            return;
        }
    }

    let state_recv = state.clone();
    let session_id_recv = session_id.clone();
    let connection_recv = connection.clone();

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Err(close_code) =
                        handle_text_message(&state_recv, &connection_recv, &text).await
                    {
                        tracing::debug!(
                            session_id = %session_id_recv,
                            close_code = ?close_code,
                            "Closing connection due to error"
                        );
                        return Some(close_code);
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(
                        session_id = %session_id_recv,
                        "Binary messages not supported"
                    );
                    return Some(CloseCode::DecodeError);
                }
                Ok(Message::Ping(_)) => {
                    tracing::trace!(session_id = %session_id_recv, "Ping received");
                }
                Ok(Message::Pong(_)) => {
                    tracing::trace!(session_id = %session_id_recv, "Pong received");
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(session_id = %session_id_recv, "Client closed connection");
                    return None;
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id_recv,
                        error = %e,
                        "WebSocket error"
                    );
                    return Some(CloseCode::UnknownError);
                }
            }
        }
        None
    });

    let session_id_send = session_id.clone();

    let mut send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                code = &mut close_rx => {
                    if let Ok(code) = code {
                        let frame = CloseFrame {
                            code: code.as_u16(),
                            reason: code.description().into(),
                        };
                        let _ = ws_sink.send(Message::Close(Some(frame))).await;
                    }
                    break;
                }
                msg = rx.recv() => {
                    let Some(msg) = msg else { break };
                    let Ok(json) = msg.to_json() else { continue };
                    if ws_sink.send(Message::Text(json)).await.is_err() {
                        tracing::warn!(
                            session_id = %session_id_send,
                            "Failed to send message to WebSocket"
                        );
                        break;
                    }
                }
            }
        }

        let _ = ws_sink.close().await;
    });

    let session_id_hb = session_id.clone();
    let connection_hb = connection.clone();
    let heartbeat_timeout = settings.heartbeat_timeout;
    let check_every = (settings.heartbeat_interval / 2).max(Duration::from_millis(10));

    let mut heartbeat_task = tokio::spawn(async move {
        let mut check_interval = interval(check_every);

        loop {
            check_interval.tick().await;

            let time_since = connection_hb.time_since_heartbeat();
            if time_since > heartbeat_timeout {
                tracing::warn!(
                    session_id = %session_id_hb,
                    time_since_ms = time_since.as_millis(),
                    "Connection timed out (no heartbeat)"
                );
                break;
            }
        }
    });

    // Wait for any task to complete
    let close_code = tokio::select! {
        result = &mut recv_task => {
            match result {
                Ok(Some(close_code)) => {
                    tracing::debug!(
                        session_id = %session_id,
                        close_code = ?close_code,
                        "Receive task ended with close code"
                    );
                    Some(close_code)
                }
                _ => None,
            }
        }
        _ = &mut send_task => {
            tracing::debug!(session_id = %session_id, "Send task ended");
            None
        }
        _ = &mut heartbeat_task => {
            tracing::debug!(session_id = %session_id, "Heartbeat task ended");
            Some(CloseCode::SessionTimeout)
        }
    };

    // Release subscriptions first so nothing else is queued behind the close frame
    cleanup_connection(&state, &session_id);

    if let Some(code) = close_code {
        if close_tx.send(code).is_ok() {
            let _ = tokio::time::timeout(CLOSE_GRACE, &mut send_task).await;
        }
    }

    recv_task.abort();
    send_task.abort();
    heartbeat_task.abort();
}

/// Handle a text message from the client
async fn handle_text_message(
    state: &GatewayState,
    connection: &Arc<Connection>,
    text: &str,
) -> Result<(), CloseCode> {
    let message = match GatewayMessage::from_json(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(
                session_id = %connection.session_id(),
                error = %e,
                "Failed to parse message"
            );
            return Err(CloseCode::DecodeError);
        }
    };

    tracing::trace!(
        session_id = %connection.session_id(),
        op = %message.op,
        "Received message"
    );

    match MessageDispatcher::dispatch(state, connection, message).await {
        Ok(Some(close_code)) => Err(close_code),
        Ok(None) => Ok(()),
        Err(e) => {
            tracing::warn!(
                session_id = %connection.session_id(),
                error = %e,
                "Handler error"
            );
            Err(e.to_close_code().unwrap_or(CloseCode::UnknownError))
        }
    }
}

/// Clean up a connection on disconnect
fn cleanup_connection(state: &GatewayState, session_id: &str) {
    tracing::info!(session_id = %session_id, "Cleaning up connection");

    state.connection_manager().remove_connection(session_id);
}
