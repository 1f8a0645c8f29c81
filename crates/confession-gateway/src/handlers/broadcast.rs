//! Broadcast handler (op 3)

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::protocol::{BroadcastPayload, CloseCode};
use crate::server::GatewayState;
use confession_core::BroadcastMessage;
use std::sync::Arc;

pub struct BroadcastHandler;

impl BroadcastHandler {
    /// Publish a viewer's like or reaction count, stamped with the connection's origin
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: BroadcastPayload,
    ) -> HandlerResult<Option<CloseCode>> {
        if !connection.is_joined() {
            return Err(HandlerError::NotJoined);
        }

        let event = payload.into_event()?;
        state
            .broadcast()
            .send(BroadcastMessage::new(connection.viewer_id(), event))?;

        tracing::debug!(
            session_id = %connection.session_id(),
            post_id = %event.post_id(),
            event = event.kind().event_type(),
            "Broadcast relayed"
        );

        Ok(None)
    }
}
