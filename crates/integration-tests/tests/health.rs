use indoc::indoc;
use integration_tests::TestServer;

#[tokio::test]
async fn health_endpoint_enabled_by_default() {
    let server = TestServer::start("").await;

    let response = server.client.get("/health").await;
    assert_eq!(response.status(), 200);

    let body = response.text().await.unwrap();
    insta::assert_snapshot!(body, @r#"{"status":"healthy"}"#);
}

#[tokio::test]
async fn health_endpoint_disabled() {
    let config = indoc! {r#"
        [server.health]
        enabled = false
    "#};

    let server = TestServer::start(config).await;

    let response = server.client.get("/health").await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn health_endpoint_custom_path() {
    let config = indoc! {r#"
        [server.health]
        enabled = true
        path = "/status"
    "#};

    let server = TestServer::start(config).await;

    let response = server.client.get("/status").await;
    assert_eq!(response.status(), 200);

    let body = response.text().await.unwrap();
    insta::assert_snapshot!(body, @r#"{"status":"healthy"}"#);

    let response = server.client.get("/health").await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn socket_path_without_upgrade_is_rejected() {
    let server = TestServer::start("").await;

    let response = server.client.get("/ws").await;
    assert!(response.status().is_client_error());
}
