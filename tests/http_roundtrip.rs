//! The demo service over real HTTP: axum on an ephemeral port, reqwest client.

mod fixtures;

use std::time::Duration;

use fixtures::TestServer;
use rodcall::client::args;
use rodcall::demo::{TestValue, DEMO_PASSWORD};
use rodcall::{ClientError, ErrorCode, RpcError, TransportError};

#[tokio::test]
async fn test_login_and_list_values_over_http() {
    let server = TestServer::start().await;
    let client = server.client();

    let root = client.root().await.unwrap();
    let info = client.call_object(&root, "getAppInfo", vec![]).await.unwrap();
    let name: String = client.call_value(&info, "getName", vec![]).await.unwrap();
    assert_eq!(name, "demo");

    let service = client
        .call_optional(&root, "login", args(&["bob", DEMO_PASSWORD]).unwrap())
        .await
        .unwrap()
        .expect("login");
    let values: Vec<TestValue> = client.call_value(&service, "getAllValues", vec![]).await.unwrap();
    assert_eq!(values.iter().map(|v| v.id).collect::<Vec<_>>(), vec![1, 2, 3]);

    server.stop().await;
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let server = TestServer::start().await;

    let response = reqwest::Client::new()
        .post(&server.url)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body = response.bytes().await.unwrap();
    let error: RpcError = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.code, ErrorCode::InvalidRequest);

    server.stop().await;
}

#[tokio::test]
async fn test_forged_chain_is_unauthorized() {
    let server = TestServer::start().await;
    let client = server.client();
    let root = client.root().await.unwrap();
    let mut info = client.call_object(&root, "getAppInfo", vec![]).await.unwrap();
    info.call_stack.signature = "AAAA".to_string();

    match client.resolve(&info.call_stack).await {
        Err(ClientError::Transport(TransportError::Remote(error))) => {
            assert_eq!(error.code, ErrorCode::AuthenticationFailed);
        }
        other => panic!("expected authentication failure, got {:?}", other),
    }

    server.stop().await;
}

#[tokio::test]
async fn test_closed_dispatcher_answers_unavailable() {
    let server = TestServer::start().await;
    let client = server.client();
    client.root().await.unwrap();

    assert!(server.dispatcher.close(Duration::from_secs(1)).await);

    match client.root().await {
        Err(ClientError::Transport(TransportError::Remote(error))) => {
            assert_eq!(error.code, ErrorCode::ShuttingDown);
            assert!(error.code.is_retryable());
        }
        other => panic!("expected shutting down, got {:?}", other),
    }

    server.stop().await;
}

#[tokio::test]
async fn test_unreachable_server_is_connection_error() {
    let server = TestServer::start().await;
    let client = server.client();
    server.stop().await;

    match client.root().await {
        Err(ClientError::Transport(TransportError::Connection(_))) => {}
        other => panic!("expected connection error, got {:?}", other),
    }
}
