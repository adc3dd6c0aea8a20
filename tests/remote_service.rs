use std::time::Duration;

use friend_chat::common::FeedEvent;
use friend_chat::service::{DataService, RemoteDataService, ServiceError};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POLL: Duration = Duration::from_millis(20);

fn bob_json() -> serde_json::Value {
    json!({
        "id": "bob",
        "name": "Bob Chen",
        "username": "bob",
        "avatar": "avatars/bob.png",
        "bio": "Weekend cyclist",
        "email": "bob@example.com",
        "friends": ["alice", "carol"]
    })
}

fn chats_json() -> serde_json::Value {
    json!([{
        "id": "alice_bob",
        "other_user": bob_json(),
        "last_message": "Perfect, bringing snacks.",
        "last_message_at": "2026-10-16T09:14:00Z",
        "unread_count": 2
    }])
}

#[tokio::test]
async fn test_get_friends_decodes_profiles() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/alice/friends"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([bob_json()])))
        .mount(&server)
        .await;

    let service = RemoteDataService::new(format!("{}/", server.uri()), POLL);
    let friends = service.get_friends("alice").await.unwrap();

    assert_eq!(friends.len(), 1);
    assert_eq!(friends[0].name, "Bob Chen");
    assert_eq!(friends[0].friend_count(), 2);
}

#[tokio::test]
async fn test_get_friends_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/alice/friends"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let service = RemoteDataService::new(server.uri(), POLL);
    let err = service.get_friends("alice").await.unwrap_err();
    assert!(matches!(err, ServiceError::Http(_)));
}

#[tokio::test]
async fn test_chat_poll_skips_unchanged_snapshots() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/alice/chats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chats_json()))
        .mount(&server)
        .await;

    let service = RemoteDataService::new(server.uri(), POLL);
    let (tx, mut feed) = mpsc::channel(8);
    let subscription = service.subscribe_to_chats("alice", tx);

    match timeout(Duration::from_secs(2), feed.recv()).await {
        Ok(Some(FeedEvent::Snapshot(chats))) => {
            assert_eq!(chats.len(), 1);
            assert_eq!(chats[0].unread_count, 2);
        }
        other => panic!("expected a snapshot, got {other:?}"),
    }

    // Several polls happen here but the payload never changes.
    let quiet = timeout(Duration::from_millis(150), feed.recv()).await;
    assert!(quiet.is_err());

    subscription.unsubscribe();
}

#[tokio::test]
async fn test_chat_poll_reports_failure_once_then_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/alice/chats"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/alice/chats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chats_json()))
        .mount(&server)
        .await;

    let service = RemoteDataService::new(server.uri(), POLL);
    let (tx, mut feed) = mpsc::channel(8);
    let _subscription = service.subscribe_to_chats("alice", tx);

    let first = timeout(Duration::from_secs(2), feed.recv()).await.unwrap();
    assert!(matches!(first, Some(FeedEvent::Failed(_))));

    let second = timeout(Duration::from_secs(2), feed.recv()).await.unwrap();
    assert!(matches!(second, Some(FeedEvent::Snapshot(chats)) if chats.len() == 1));
}

#[tokio::test]
async fn test_send_message_posts_trimmed_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chats/alice_bob/messages"))
        .and(body_json(json!({ "sender_id": "alice", "content": "On my way" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m-1",
            "chat_id": "alice_bob",
            "sender_id": "alice",
            "content": "On my way",
            "timestamp": "2026-10-16T10:00:00Z",
            "read": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = RemoteDataService::new(server.uri(), POLL);
    let message = service
        .send_message("alice_bob", "alice", "  On my way ")
        .await
        .unwrap();
    assert_eq!(message.id, "m-1");

    let err = service
        .send_message("alice_bob", "alice", " ")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::EmptyMessage));
}

#[tokio::test]
async fn test_open_chat_and_mark_read_routes() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/chats/alice_bob"))
        .and(body_json(json!({ "participants": ["bob", "alice"] })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chats/alice_bob/read"))
        .and(body_json(json!({ "user_id": "bob" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let service = RemoteDataService::new(server.uri(), POLL);
    let chat_id = service.open_chat("bob", "alice").await.unwrap();
    assert_eq!(chat_id, "alice_bob");
    service.mark_read(&chat_id, "bob").await.unwrap();
}

#[tokio::test]
async fn test_ids_are_percent_encoded_in_routes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/a%2Fb%3Fc%23d/friends"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([bob_json()])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chats/team%2Fops/read"))
        .and(body_json(json!({ "user_id": "alice" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let service = RemoteDataService::new(server.uri(), POLL);
    let friends = service.get_friends("a/b?c#d").await.unwrap();
    assert_eq!(friends.len(), 1);
    service.mark_read("team/ops", "alice").await.unwrap();
}

#[tokio::test]
async fn test_invalid_base_url() {
    let service = RemoteDataService::new("not a url", POLL);
    let err = service.get_friends("alice").await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidUrl(_)));

    let (tx, mut feed) = mpsc::channel(8);
    let _subscription = service.subscribe_to_chats("alice", tx);
    let event = timeout(Duration::from_secs(1), feed.recv()).await.unwrap();
    assert!(matches!(event, Some(FeedEvent::Failed(_))));
}
