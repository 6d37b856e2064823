use indoc::indoc;
use integration_tests::{SocketClient, TestServer};
use serde_json::json;

const HAIKU: &str = "anthropic.claude-3-haiku-20240307-v1:0";

#[tokio::test]
async fn named_connection_is_accepted() {
    let server = TestServer::start("").await;
    let mut socket = SocketClient::connect(&server.socket_url(Some("name=alice"))).await;

    socket
        .send_json(json!({ "prompt": "hi", "parameters": { "modelId": HAIKU } }))
        .await;

    let messages = socket.receive_response().await;
    assert_eq!(messages, vec!["Hello", "!", "<End of LLM response>"]);
}

#[tokio::test]
async fn custom_socket_path() {
    let config = indoc! {r#"
        [server]
        path = "/relay"
    "#};

    let server = TestServer::start(config).await;
    assert!(server.socket_url(None).ends_with("/relay"));

    let mut socket = server.connect().await;

    socket
        .send_json(json!({ "prompt": "hi", "parameters": { "modelId": HAIKU } }))
        .await;

    let messages = socket.receive_response().await;
    assert_eq!(messages.last().map(String::as_str), Some(llm::END_OF_STREAM));
}

#[tokio::test]
async fn connections_are_isolated() {
    let server = TestServer::start("").await;

    let mut first = server.connect().await;
    let mut second = server.connect().await;

    first
        .send_json(json!({ "prompt": "hi", "parameters": { "modelId": HAIKU } }))
        .await;

    let messages = first.receive_response().await;
    assert_eq!(messages, vec!["Hello", "!", "<End of LLM response>"]);

    assert!(second.try_receive(std::time::Duration::from_millis(200)).await.is_none());
}

#[tokio::test]
async fn server_keeps_serving_after_a_client_leaves() {
    let server = TestServer::start("").await;

    let mut leaving = server.connect().await;
    leaving
        .send_json(json!({ "prompt": "hi", "parameters": { "modelId": HAIKU } }))
        .await;
    leaving.close().await;

    let mut socket = server.connect().await;

    socket
        .send_json(json!({ "prompt": "hi", "parameters": { "modelId": HAIKU } }))
        .await;

    let messages = socket.receive_response().await;
    assert_eq!(messages, vec!["Hello", "!", "<End of LLM response>"]);
}

#[tokio::test]
async fn unreachable_registry_refuses_the_upgrade() {
    let config = indoc! {r#"
        [registry]
        type = "redis"
        url = "redis://127.0.0.1:1"

        [registry.pool]
        timeout_create = "500ms"
        timeout_wait = "500ms"
    "#};

    let server = TestServer::start(config).await;
    let status = SocketClient::connect_refused(&server.socket_url(None)).await;

    assert_eq!(status.as_u16(), 503);
}
