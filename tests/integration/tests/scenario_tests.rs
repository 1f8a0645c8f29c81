//! End-to-end viewer scenarios
//!
//! Viewer sessions and a gateway observer share one in-memory board, so a like
//! or reaction from a session is visible to every other participant.

use std::sync::Arc;
use std::time::Duration;

use confession_client::{
    Applied, LikeAttempt, LikeState, LocalStorage, MemoryStorage, SessionUpdate, ViewerSession,
    LIKED_KEY,
};
use confession_core::{Emoji, PostId, PostStore};
use integration_tests::TestServer;

async fn next(session: &mut ViewerSession) -> SessionUpdate {
    tokio::time::timeout(Duration::from_secs(2), session.next_update())
        .await
        .expect("no update within timeout")
        .expect("session has no open channels")
}

/// Apply updates until the session shows `likes` for the post
async fn wait_for_likes(session: &mut ViewerSession, post: PostId, likes: i64) {
    while session.likes(post) != Some(likes) {
        next(session).await;
    }
}

#[tokio::test]
async fn test_like_propagates_to_second_viewer_and_gateway() {
    let server = TestServer::start().await.unwrap();
    let board = &server.board;
    let post = board.store.insert_post("secret").await.unwrap();
    board.store.update_likes(post.id, 2).await.unwrap();

    let mut a = board.viewer().await.unwrap();
    let mut b = board.viewer().await.unwrap();
    let mut observer = server.connect().await.unwrap();
    observer.join(None).await.unwrap();

    assert_eq!(a.like(post.id).await.unwrap(), LikeAttempt::Confirmed(3));

    wait_for_likes(&mut b, post.id, 3).await;
    assert_eq!(b.likes(post.id), Some(3));

    let update = observer.recv_dispatch("POST_UPDATE").await.unwrap();
    assert_eq!(update.d.unwrap()["likes"], 3);
    let like = observer.recv_dispatch("LIKE").await.unwrap();
    assert_eq!(like.d.unwrap()["newCount"], 3);
}

#[tokio::test]
async fn test_failed_write_reverts_and_allows_retry() {
    let server = TestServer::start().await.unwrap();
    let board = &server.board;
    let post = board.store.insert_post("secret").await.unwrap();
    board.store.update_likes(post.id, 2).await.unwrap();

    let storage = Arc::new(MemoryStorage::new());
    let mut viewer = board
        .viewer_with(storage.clone(), Default::default())
        .await
        .unwrap();
    let mut observer = server.connect().await.unwrap();
    observer.join(None).await.unwrap();

    board.store.set_fail_writes(true);
    let pending = viewer.begin_like(post.id).unwrap().unwrap();
    assert_eq!(viewer.likes(post.id), Some(3));
    let outcome = pending.commit().await;
    assert!(viewer.settle_like(outcome).is_err());

    assert_eq!(viewer.likes(post.id), Some(2));
    assert_eq!(viewer.like_state(post.id), LikeState::NotLiked);
    assert!(storage.get(LIKED_KEY).unwrap().is_none());
    observer.expect_silence(Duration::from_millis(150)).await.unwrap();

    board.store.set_fail_writes(false);
    assert_eq!(viewer.like(post.id).await.unwrap(), LikeAttempt::Confirmed(3));
    assert_eq!(viewer.like_state(post.id), LikeState::Liked);
    assert!(storage.get(LIKED_KEY).unwrap().unwrap().contains(&post.id.to_string()));
}

#[tokio::test]
async fn test_reactions_reach_gateway_observer() {
    let server = TestServer::start().await.unwrap();
    let board = &server.board;
    let post = board.store.insert_post("secret").await.unwrap();

    let mut viewer = board.viewer().await.unwrap();
    let mut peer = board.viewer().await.unwrap();
    let mut observer = server.connect().await.unwrap();
    observer.join(None).await.unwrap();

    for _ in 0..3 {
        viewer.react(post.id, Emoji::Fire).unwrap();
    }
    assert_eq!(viewer.reaction_count(post.id, Emoji::Fire), 3);

    let mut last = 0;
    while last < 3 {
        let msg = observer.recv_dispatch("REACTION").await.unwrap();
        last = msg.d.unwrap()["newCount"].as_u64().unwrap();
    }

    while peer.reaction_count(post.id, Emoji::Fire) < 3 {
        next(&mut peer).await;
    }
    assert_eq!(peer.reaction_count(post.id, Emoji::Fire), 3);
}

#[tokio::test]
async fn test_composed_post_reaches_everyone_once() {
    let server = TestServer::start().await.unwrap();
    let board = &server.board;

    let mut author = board.viewer().await.unwrap();
    let mut reader = board.viewer().await.unwrap();
    let mut observer = server.connect().await.unwrap();
    observer.join(None).await.unwrap();

    let post = author.compose("  I never read the terms  ").await.unwrap();
    assert_eq!(author.feed().count(), 1);

    assert_eq!(
        next(&mut reader).await,
        SessionUpdate::Applied(Applied::PostAdded(post.id))
    );

    let insert = observer.recv_dispatch("POST_INSERT").await.unwrap();
    assert_eq!(insert.d.unwrap()["id"], post.id.to_string());

    // The author's own INSERT notification merges by id
    author.drain_pending();
    tokio::time::sleep(Duration::from_millis(20)).await;
    author.drain_pending();
    assert_eq!(author.feed().count(), 1);
}
