//! Join handler (op 2)
//!
//! Reads the snapshot, then opens this connection's own change-feed and
//! broadcast subscriptions. Each subscription is drained by a forwarding task
//! that the connection aborts on disconnect.

use super::{HandlerError, HandlerResult};
use crate::connection::{Connection, ConnectionState};
use crate::events::{broadcast_dispatch, change_dispatch, GatewayEventType, ReadyEvent};
use crate::protocol::{CloseCode, GatewayMessage, JoinPayload};
use crate::server::GatewayState;
use confession_core::{BroadcastMessage, ChangeKinds, PostChange, Subscription};
use std::sync::Arc;

pub struct JoinHandler;

impl JoinHandler {
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: JoinPayload,
    ) -> HandlerResult<Option<CloseCode>> {
        let self_delivery = payload
            .self_delivery
            .unwrap_or(state.settings().self_delivery);

        if !connection.try_join(self_delivery) {
            return Err(HandlerError::AlreadyJoined);
        }

        let posts = state.store().list_newest_first().await?;
        let changes = state.change_feed().subscribe(ChangeKinds::ALL).await?;
        let broadcasts = state.broadcast().subscribe(&[]).await?;

        let ready = ReadyEvent {
            session_id: connection.session_id().to_string(),
            viewer_id: connection.viewer_id(),
            self_delivery,
            posts,
        };
        let data = serde_json::to_value(&ready).map_err(|e| HandlerError::Internal(e.to_string()))?;

        connection
            .dispatch(|s| GatewayMessage::dispatch(GatewayEventType::Ready, s, data))
            .await
            .map_err(|_| HandlerError::Internal("Failed to send READY".to_string()))?;

        let change_task = tokio::spawn(forward_changes(connection.clone(), changes));
        connection.attach_forwarder(change_task.abort_handle());

        let broadcast_task = tokio::spawn(forward_broadcasts(connection.clone(), broadcasts));
        connection.attach_forwarder(broadcast_task.abort_handle());

        // Cleanup may have run while the snapshot was loading
        if connection.state() == ConnectionState::Disconnected {
            connection.release_subscriptions();
        }

        tracing::info!(
            session_id = %connection.session_id(),
            viewer_id = %connection.viewer_id(),
            self_delivery = self_delivery,
            snapshot = ready.posts.len(),
            "Connection joined"
        );

        Ok(None)
    }
}

async fn forward_changes(connection: Arc<Connection>, mut changes: Subscription<PostChange>) {
    while let Some(change) = changes.recv().await {
        if connection.dispatch(|s| change_dispatch(&change, s)).await.is_err() {
            return;
        }
    }

    tracing::warn!(
        session_id = %connection.session_id(),
        source = changes.source(),
        "Upstream subscription ended"
    );
}

async fn forward_broadcasts(
    connection: Arc<Connection>,
    mut broadcasts: Subscription<BroadcastMessage>,
) {
    while let Some(message) = broadcasts.recv().await {
        if !connection.accepts_origin(message.origin) {
            continue;
        }
        if connection
            .dispatch(|s| broadcast_dispatch(&message, s))
            .await
            .is_err()
        {
            return;
        }
    }

    tracing::warn!(
        session_id = %connection.session_id(),
        source = broadcasts.source(),
        "Upstream subscription ended"
    );
}
