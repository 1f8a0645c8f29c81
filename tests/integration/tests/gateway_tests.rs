//! Gateway integration tests
//!
//! Runs the real WebSocket gateway over the in-memory adapters.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::time::Duration;

use confession_core::{BroadcastEvent, Emoji, PostStore};
use confession_gateway::protocol::{BroadcastPayload, CloseCode, GatewayMessage, OpCode};
use confession_gateway::GatewaySettings;
use integration_tests::TestServer;
use reqwest::StatusCode;

// ============================================================================
// Connection lifecycle
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.unwrap();

    let response = server.get("/health").await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_hello_carries_heartbeat_interval() {
    let server = TestServer::start().await.unwrap();

    let mut client = integration_tests::WsClient::connect(&server.ws_url())
        .await
        .unwrap();

    assert_eq!(client.hello().await.unwrap(), 45_000);
}

#[tokio::test]
async fn test_heartbeat_is_acked() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect().await.unwrap();

    client.heartbeat().await.unwrap();

    assert_eq!(client.recv().await.unwrap().op, OpCode::HeartbeatAck);
}

#[tokio::test]
async fn test_missing_heartbeat_times_out() {
    let settings = GatewaySettings {
        heartbeat_interval: Duration::from_millis(100),
        heartbeat_timeout: Duration::from_millis(200),
        ..GatewaySettings::default()
    };
    let server = TestServer::start_with_settings(settings).await.unwrap();
    let mut client = server.connect().await.unwrap();

    let code = client.expect_close().await.unwrap();

    assert_eq!(code, Some(CloseCode::SessionTimeout.as_u16()));
}

// ============================================================================
// Join
// ============================================================================

#[tokio::test]
async fn test_join_returns_snapshot_newest_first() {
    let server = TestServer::start().await.unwrap();
    let older = server.board.store.insert_post("older").await.unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;
    let newer = server.board.store.insert_post("newer").await.unwrap();
    let mut client = server.connect().await.unwrap();

    let ready = client.join(None).await.unwrap();

    let ids: Vec<_> = ready["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec![newer.id.to_string(), older.id.to_string()]);
    assert_eq!(ready["self_delivery"], false);
    assert_eq!(client.last_sequence(), Some(1));
}

#[tokio::test]
async fn test_join_twice_closes_connection() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect().await.unwrap();
    client.join(None).await.unwrap();

    client
        .send(&GatewayMessage::join(Default::default()))
        .await
        .unwrap();

    assert_eq!(
        client.expect_close().await.unwrap(),
        Some(CloseCode::AlreadyJoined.as_u16())
    );
}

#[tokio::test]
async fn test_invalid_json_closes_with_decode_error() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect().await.unwrap();

    client.send_raw("{not json").await.unwrap();

    assert_eq!(
        client.expect_close().await.unwrap(),
        Some(CloseCode::DecodeError.as_u16())
    );
}

#[tokio::test]
async fn test_server_op_from_client_closes_with_unknown_opcode() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect().await.unwrap();

    client.send_raw(r#"{"op":10}"#).await.unwrap();

    assert_eq!(
        client.expect_close().await.unwrap(),
        Some(CloseCode::UnknownOpcode.as_u16())
    );
}

// ============================================================================
// Change feed relay
// ============================================================================

#[tokio::test]
async fn test_insert_and_update_are_dispatched_in_order() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect().await.unwrap();
    client.join(None).await.unwrap();

    let post = server.board.store.insert_post("fresh").await.unwrap();
    server.board.store.increment_likes(post.id).await.unwrap();

    let insert = client.recv().await.unwrap();
    assert_eq!(insert.t.as_deref(), Some("POST_INSERT"));
    assert_eq!(insert.s, Some(2));
    assert_eq!(insert.d.as_ref().unwrap()["content"], "fresh");

    let update = client.recv().await.unwrap();
    assert_eq!(update.t.as_deref(), Some("POST_UPDATE"));
    assert_eq!(update.s, Some(3));
    assert_eq!(update.d.as_ref().unwrap()["likes"], 1);
}

#[tokio::test]
async fn test_events_before_join_are_not_dispatched() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect().await.unwrap();

    server.board.store.insert_post("early").await.unwrap();

    client.expect_silence(Duration::from_millis(150)).await.unwrap();
}

// ============================================================================
// Broadcast relay
// ============================================================================

#[tokio::test]
async fn test_broadcast_reaches_peers_but_not_sender() {
    let server = TestServer::start().await.unwrap();
    let post = server.board.store.insert_post("x").await.unwrap();
    let mut alice = server.connect().await.unwrap();
    let mut bob = server.connect().await.unwrap();
    alice.join(None).await.unwrap();
    bob.join(None).await.unwrap();

    let event = BroadcastEvent::reaction(post.id, Emoji::Heart, 2);
    alice
        .send(&GatewayMessage::broadcast(BroadcastPayload::from_event(&event)))
        .await
        .unwrap();

    let received = bob.recv_dispatch("REACTION").await.unwrap();
    let d = received.d.unwrap();
    assert_eq!(d["postId"], post.id.to_string());
    assert_eq!(d["newCount"], 2);

    alice.expect_silence(Duration::from_millis(150)).await.unwrap();
}

#[tokio::test]
async fn test_self_delivery_echoes_broadcast() {
    let server = TestServer::start().await.unwrap();
    let post = server.board.store.insert_post("x").await.unwrap();
    let mut client = server.connect().await.unwrap();
    let ready = client.join(Some(true)).await.unwrap();

    let event = BroadcastEvent::like(post.id, 1);
    client
        .send(&GatewayMessage::broadcast(BroadcastPayload::from_event(&event)))
        .await
        .unwrap();

    let echoed = client.recv_dispatch("LIKE").await.unwrap();
    assert_eq!(echoed.d.unwrap()["origin"], ready["viewer_id"]);
}

#[tokio::test]
async fn test_broadcast_before_join_closes_connection() {
    let server = TestServer::start().await.unwrap();
    let post = server.board.store.insert_post("x").await.unwrap();
    let mut client = server.connect().await.unwrap();

    let event = BroadcastEvent::like(post.id, 1);
    client
        .send(&GatewayMessage::broadcast(BroadcastPayload::from_event(&event)))
        .await
        .unwrap();

    assert_eq!(
        client.expect_close().await.unwrap(),
        Some(CloseCode::NotJoined.as_u16())
    );
}

#[tokio::test]
async fn test_disconnect_releases_subscriptions() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect().await.unwrap();
    client.join(None).await.unwrap();
    assert_eq!(server.board.broadcast.subscriber_count(), 1);
    assert_eq!(server.board.store.change_subscribers(), 1);

    drop(client);

    for _ in 0..100 {
        if server.state.connection_manager().connection_count() == 0
            && server.board.broadcast.subscriber_count() == 0
            && server.board.store.change_subscribers() == 0
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(server.state.connection_manager().connection_count(), 0);
    assert_eq!(server.board.broadcast.subscriber_count(), 0);
    assert_eq!(server.board.store.change_subscribers(), 0);
}
