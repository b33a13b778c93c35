//! HTTP client tests against a `wiremock` backend.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use queuechat::api::{ApiClient, ClientError, SystemRole};
use queuechat::chat::{ChatController, ChatId, CreateChatRequest, MessageRole};
use queuechat::config::ApiConfig;

fn client_for(server: &MockServer, token: Option<&str>) -> ApiClient {
    let config = ApiConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        session_token: token.map(str::to_string),
        ..ApiConfig::default()
    };
    ApiClient::new(&config).expect("client should build")
}

fn chat_json(id: u64, queue_position: u32) -> serde_json::Value {
    let mut messages = vec![json!({
        "id": 1,
        "content": "What is a borrow?",
        "role": "user",
        "created_at": "2024-05-01T10:00:00"
    })];
    if queue_position == 0 {
        messages.push(json!({
            "id": 2,
            "content": "A reference that does not own its value.",
            "role": "assistant",
            "created_at": "2024-05-01T10:00:05Z"
        }));
    }
    json!({
        "id": id,
        "title": "Rust tutor",
        "messages": messages,
        "events": [],
        "queue_position": queue_position,
        "created_at": "2024-05-01T09:59:00",
        "updated_at": "2024-05-01T10:00:05+00:00"
    })
}

fn user_json(activated: bool) -> serde_json::Value {
    json!({
        "id": 42,
        "email": "ada@example.com",
        "username": "ada",
        "role": "user",
        "is_activated": activated
    })
}

#[tokio::test]
async fn test_fetch_chat_parses_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chats/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_json(7, 0)))
        .expect(1)
        .mount(&server)
        .await;

    let chat = client_for(&server, None)
        .fetch_chat(ChatId(7))
        .await
        .unwrap();

    assert_eq!(chat.id, ChatId(7));
    assert_eq!(chat.queue_position, 0);
    assert_eq!(chat.messages.len(), 2);
    assert_eq!(chat.last_reply().unwrap().role, MessageRole::Assistant);
    assert!(chat.has_consistent_queue_state());
}

#[tokio::test]
async fn test_send_message_posts_user_role() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chats/7/messages"))
        .and(body_json(json!({"content": "hello", "role": "user"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_json(7, 3)))
        .expect(1)
        .mount(&server)
        .await;

    let chat = client_for(&server, None)
        .send_message(ChatId(7), "hello")
        .await
        .unwrap();

    assert_eq!(chat.queue_position, 3);
    assert!(chat.in_queue());
}

#[tokio::test]
async fn test_list_and_create_chats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chats/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "First", "updated_at": "2024-05-01T10:00:00"},
            {"id": 2, "title": "Second", "updated_at": "2024-05-02T10:00:00Z"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chats/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(chat_json(3, 0)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let chats = client.list_chats().await.unwrap();
    assert_eq!(chats.len(), 2);
    assert_eq!(chats[1].title, "Second");

    let created = client
        .create_chat(&CreateChatRequest::new("Rust tutor"))
        .await
        .unwrap();
    assert_eq!(created.id, ChatId(3));
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chats/1"))
        .respond_with(ResponseTemplate::new(401).set_body_string("session expired"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chats/2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chats/3"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);

    let err = client.fetch_chat(ChatId(1)).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(ref body) if body == "session expired"));

    let err = client.fetch_chat(ChatId(2)).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));

    let err = client.fetch_chat(ChatId(3)).await.unwrap_err();
    assert!(matches!(err, ClientError::Server { status: 503, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_malformed_body_is_serialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chats/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\": \"nope\"}"))
        .mount(&server)
        .await;

    let err = client_for(&server, None)
        .fetch_chat(ChatId(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Serialization(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let config = ApiConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_secs: 2,
        ..ApiConfig::default()
    };
    let client = ApiClient::new(&config).unwrap();

    let err = client.list_chats().await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_login_returns_session_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(
            json!({"email": "ada@example.com", "password": "Str0ng!Passw0rd"}),
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "token=abc123; Path=/; HttpOnly")
                .set_body_json(user_json(true)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("cookie", "token=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(true)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let session = client
        .login("ada@example.com", "Str0ng!Passw0rd")
        .await
        .unwrap();

    assert_eq!(session.session_token.as_deref(), Some("abc123"));
    assert_eq!(session.user.role, SystemRole::User);

    // The cookie store replays the session on later requests.
    let me = client.me().await.unwrap();
    assert_eq!(me.username.as_deref(), Some("ada"));
}

#[tokio::test]
async fn test_configured_token_is_sent_as_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("cookie", "token=saved"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(false)))
        .expect(1)
        .mount(&server)
        .await;

    let me = client_for(&server, Some("saved")).me().await.unwrap();
    assert!(!me.is_activated);
}

#[tokio::test]
async fn test_account_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_json(json!({
            "email": "ada@example.com",
            "username": "ada",
            "password": "Str0ng!Passw0rd"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(user_json(false)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/users/confirm-email"))
        .and(body_json(json!({"key": 123456})))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/key"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/logout/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("saved"));

    let user = client
        .register("ada@example.com", "ada", "Str0ng!Passw0rd")
        .await
        .unwrap();
    assert!(!user.is_activated);

    let user = client.confirm_email(123456).await.unwrap();
    assert!(user.is_activated);

    client.request_new_key().await.unwrap();
    client.logout().await.unwrap();
}

#[tokio::test]
async fn test_controller_over_http_starts_polling_for_queued_reply() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chats/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_json(7, 0)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chats/7/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_json(7, 2)))
        .mount(&server)
        .await;

    let client = std::sync::Arc::new(client_for(&server, None));
    let controller = ChatController::new(client, std::time::Duration::from_secs(60));

    controller.select_chat(ChatId(7)).await.unwrap();
    assert!(!controller.is_polling(ChatId(7)));

    let session = controller.send_message("hello").await.unwrap().unwrap();
    assert_eq!(session.queue_position, 2);
    assert!(controller.is_polling(ChatId(7)));

    controller.dispose();
    assert!(!controller.is_polling(ChatId(7)));
}
