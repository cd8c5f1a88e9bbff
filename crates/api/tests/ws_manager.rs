//! Unit tests for `WsManager`.
//!
//! These exercise the connection manager directly, without performing any
//! HTTP upgrades: add/remove semantics, gateway delivery and graceful
//! shutdown.

use assert_matches::assert_matches;
use autobahn_api::ws::WsManager;
use autobahn_pipeline::{NotificationGateway, PushError};
use axum::extract::ws::Message;

#[tokio::test]
async fn new_manager_has_zero_connections() {
    let manager = WsManager::new();

    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn add_and_remove_track_connection_count() {
    let manager = WsManager::new();

    let _rx = manager.add("conn-1".to_string(), None).await;
    assert_eq!(manager.connection_count().await, 1);

    manager.remove("nonexistent").await;
    assert_eq!(manager.connection_count().await, 1);

    manager.remove("conn-1").await;
    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn push_delivers_payload_as_text_frame() {
    let manager = WsManager::new();
    let mut rx = manager.add("conn-1".to_string(), Some(42)).await;

    manager
        .push("conn-1", br#"{"action":"REFRESH_EXECUTIONS_TABLE"}"#)
        .await
        .unwrap();

    match rx.recv().await.unwrap() {
        Message::Text(text) => {
            assert_eq!(text.as_str(), r#"{"action":"REFRESH_EXECUTIONS_TABLE"}"#)
        }
        other => panic!("Expected Text message, got: {other:?}"),
    }
}

#[tokio::test]
async fn push_to_unknown_connection_is_gone() {
    let manager = WsManager::new();

    let result = manager.push("missing", b"{}").await;

    assert_matches!(result, Err(PushError::Gone(id)) if id == "missing");
}

#[tokio::test]
async fn push_after_receiver_dropped_is_gone() {
    let manager = WsManager::new();
    let rx = manager.add("conn-1".to_string(), None).await;
    drop(rx);

    let result = manager.push("conn-1", b"{}").await;

    assert_matches!(result, Err(PushError::Gone(_)));
}

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();
    let mut rx1 = manager.add("conn-1".to_string(), None).await;
    let mut rx2 = manager.add("conn-2".to_string(), Some(42)).await;

    manager.shutdown_all().await;

    assert_eq!(manager.connection_count().await, 0);
    assert_matches!(rx1.recv().await, Some(Message::Close(None)));
    assert_matches!(rx2.recv().await, Some(Message::Close(None)));
}

#[tokio::test]
async fn ping_all_reaches_every_connection() {
    let manager = WsManager::new();
    let mut rx = manager.add("conn-1".to_string(), None).await;

    manager.ping_all().await;

    assert_matches!(rx.recv().await, Some(Message::Ping(_)));
}
