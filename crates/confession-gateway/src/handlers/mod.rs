//! Op code handlers
//!
//! Handles incoming WebSocket messages based on their operation code.

mod broadcast;
mod error;
mod heartbeat;
mod join;

pub use broadcast::BroadcastHandler;
pub use error::{HandlerError, HandlerResult};
pub use heartbeat::HeartbeatHandler;
pub use join::JoinHandler;

use crate::connection::Connection;
use crate::protocol::{CloseCode, GatewayMessage, OpCode};
use crate::server::GatewayState;
use std::sync::Arc;

/// Dispatch incoming client messages to appropriate handlers
pub struct MessageDispatcher;

impl MessageDispatcher {
    pub async fn dispatch(
        state: &GatewayState,
        connection: &Arc<Connection>,
        message: GatewayMessage,
    ) -> HandlerResult<Option<CloseCode>> {
        if !message.op.is_client_op() {
            tracing::warn!(
                session_id = %connection.session_id(),
                op = %message.op,
                "Received server-only op code from client"
            );
            return Ok(Some(CloseCode::UnknownOpcode));
        }

        match message.op {
            OpCode::Heartbeat => {
                let seq = message.as_heartbeat_seq().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Heartbeat payload".to_string())
                })?;

                HeartbeatHandler::handle(connection, seq).await
            }
            OpCode::Join => {
                let payload = message.as_join().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Join payload".to_string())
                })?;

                JoinHandler::handle(state, connection, payload).await
            }
            OpCode::Broadcast => {
                let payload = message.as_broadcast().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Broadcast payload".to_string())
                })?;

                BroadcastHandler::handle(state, connection, payload).await
            }
            // These ops never reach here due to the is_client_op check
            _ => {
                tracing::error!(op = %message.op, "Unhandled client op code");
                Ok(Some(CloseCode::UnknownOpcode))
            }
        }
    }
}
