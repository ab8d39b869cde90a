//! Connection manager tests.
//!
//! A pair is exposed only when both legs connect; identity or credential
//! changes release the old pair first; disconnect is idempotent.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use client_test_utils::fixtures::TEST_API_KEY;
use client_test_utils::{alice, bob, standup_call, MockCallService, MockConnector};
use common::secret::SecretString;
use meeting_client::connection::ConnectionManager;
use meeting_client::errors::ClientError;
use meeting_client::remote::{CallRef, JoinOptions};

fn setup(
    connector: impl FnOnce(MockConnector) -> MockConnector,
) -> (Arc<MockConnector>, ConnectionManager) {
    let calls = Arc::new(MockCallService::default());
    let connector = Arc::new(connector(MockConnector::new(calls)));
    let manager = ConnectionManager::new(SecretString::from(TEST_API_KEY), connector.clone());
    (connector, manager)
}

fn credential(value: &str) -> SecretString {
    SecretString::from(value)
}

#[tokio::test]
async fn test_connect_exposes_pair() {
    let (connector, manager) = setup(|c| c);
    assert!(manager.current().await.is_none());

    manager.connect(&alice(), credential("tok-1")).await.unwrap();

    assert!(manager.current().await.is_some());
    assert_eq!(connector.api_keys(), vec![TEST_API_KEY.to_string()]);
    assert_eq!(connector.credentials(), vec!["tok-1".to_string()]);
    assert_eq!(connector.videos().len(), 1);
    assert_eq!(connector.chats().len(), 1);
    assert_eq!(connector.videos().first().unwrap().identity(), &alice());
}

#[tokio::test]
async fn test_same_identity_and_credential_reuses_pair() {
    let (connector, manager) = setup(|c| c);

    manager.connect(&alice(), credential("tok-1")).await.unwrap();
    manager.connect(&alice(), credential("tok-1")).await.unwrap();

    assert_eq!(connector.video_connects(), 1);
    assert_eq!(connector.videos().first().unwrap().disconnect_count(), 0);
}

#[tokio::test]
async fn test_credential_change_releases_old_pair() {
    let (connector, manager) = setup(|c| c);

    manager.connect(&alice(), credential("tok-1")).await.unwrap();
    manager.connect(&alice(), credential("tok-2")).await.unwrap();

    let videos = connector.videos();
    let chats = connector.chats();
    assert_eq!(videos.len(), 2);
    assert_eq!(videos.first().unwrap().disconnect_count(), 1);
    assert_eq!(chats.first().unwrap().disconnect_count(), 1);
    assert_eq!(videos.get(1).unwrap().disconnect_count(), 0);
    assert_eq!(chats.get(1).unwrap().disconnect_count(), 0);
}

#[tokio::test]
async fn test_identity_change_releases_old_pair() {
    let (connector, manager) = setup(|c| c);

    manager.connect(&alice(), credential("tok")).await.unwrap();
    manager.connect(&bob(), credential("tok")).await.unwrap();

    let videos = connector.videos();
    assert_eq!(videos.first().unwrap().identity(), &alice());
    assert_eq!(videos.first().unwrap().disconnect_count(), 1);
    assert_eq!(videos.get(1).unwrap().identity(), &bob());
}

#[tokio::test]
async fn test_chat_failure_releases_video_leg() {
    let (connector, manager) = setup(|c| c.fail_chat("chat service down"));

    let err = manager
        .connect(&alice(), credential("tok"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Connection(_)));
    assert_eq!(err.client_message(), "chat service down");
    assert!(manager.current().await.is_none());
    assert_eq!(connector.videos().first().unwrap().disconnect_count(), 1);
}

#[tokio::test]
async fn test_video_failure_releases_chat_leg() {
    let (connector, manager) = setup(|c| c.fail_video("invalid api key"));

    let err = manager
        .connect(&alice(), credential("tok"))
        .await
        .unwrap_err();

    assert_eq!(err.client_message(), "invalid api key");
    assert!(manager.current().await.is_none());
    assert!(connector.videos().is_empty());
    assert_eq!(connector.chats().first().unwrap().disconnect_count(), 1);
}

#[tokio::test]
async fn test_failure_does_not_retry() {
    let (connector, manager) = setup(|c| c.fail_video("invalid api key"));

    manager
        .connect(&alice(), credential("tok"))
        .await
        .unwrap_err();
    assert_eq!(connector.video_connects(), 1);

    // A new request after the collaborator recovers connects normally
    connector.heal();
    manager.connect(&alice(), credential("tok")).await.unwrap();
    assert_eq!(connector.video_connects(), 2);
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let (connector, manager) = setup(|c| c);
    manager.connect(&alice(), credential("tok")).await.unwrap();

    manager.disconnect().await;
    manager.disconnect().await;

    assert!(manager.current().await.is_none());
    assert_eq!(connector.videos().first().unwrap().disconnect_count(), 1);
    assert_eq!(connector.chats().first().unwrap().disconnect_count(), 1);
}

#[tokio::test]
async fn test_disconnect_errors_are_logged_not_thrown() {
    let (connector, manager) = setup(|c| c.fail_chat_disconnect("socket already closed"));
    manager.connect(&alice(), credential("tok")).await.unwrap();

    manager.disconnect().await;

    assert!(manager.current().await.is_none());
    assert_eq!(connector.videos().first().unwrap().disconnect_count(), 1);
}

#[tokio::test]
async fn test_disconnect_without_pair_is_noop() {
    let (connector, manager) = setup(|c| c);

    manager.disconnect().await;

    assert_eq!(connector.video_connects(), 0);
}

#[tokio::test]
async fn test_pair_video_leg_hands_out_call_service() {
    let calls = Arc::new(MockCallService::default());
    let connector = Arc::new(MockConnector::new(calls.clone()));
    let manager = ConnectionManager::new(SecretString::from(TEST_API_KEY), connector);

    let pair = manager.connect(&alice(), credential("tok")).await.unwrap();
    let service = pair.video().calls();

    // Operations through the pair land on the service the connector was built with
    let joined = service
        .join(&CallRef::new("default", standup_call()), JoinOptions { create: true })
        .await
        .unwrap();
    service.leave(&joined).await.unwrap();

    assert_eq!(calls.join_count(), 1);
    assert_eq!(calls.leave_count(), 1);
    assert_eq!(
        calls.call_refs(),
        vec![CallRef::new("default", standup_call())]
    );
}
