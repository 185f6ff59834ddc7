//! Forged and expired credentials.

mod fixtures;

use base64::Engine;
use chrono::{Duration, Utc};
use fixtures::{demo_dispatcher, local_client, secret};
use rodcall::client::args;
use rodcall::demo::{DemoSession, DEMO_PASSWORD};
use rodcall::transport::RemoteService;
use rodcall::{CallStack, ClientError, ErrorCode, RCall, Secret, SessionData};
use serde_json::json;

fn remote_code(err: ClientError) -> ErrorCode {
    match err {
        ClientError::Transport(e) => e.rpc_error().map(|r| r.code).expect("protocol error"),
        other => panic!("unexpected error: {}", other),
    }
}

fn alice() -> DemoSession {
    DemoSession {
        user_name: "alice".to_string(),
    }
}

// =============================================================================
// Call chains
// =============================================================================

#[tokio::test]
async fn test_tampered_chain_arguments_rejected() {
    let dispatcher = demo_dispatcher();
    let client = local_client(&dispatcher);
    let root = client.root().await.unwrap();
    let mut service = client
        .call_optional(&root, "login", args(&["alice", DEMO_PASSWORD]).unwrap())
        .await
        .unwrap()
        .expect("login");

    service.call_stack.calls[0].arguments[0] = json!("mallory");
    let err = client.call(&service, "getAllValues", vec![]).await.unwrap_err();
    assert_eq!(remote_code(err), ErrorCode::AuthenticationFailed);
}

#[tokio::test]
async fn test_chain_signed_by_other_secret_rejected() {
    let dispatcher = demo_dispatcher();
    let client = local_client(&dispatcher);
    let root = client.root().await.unwrap();
    let info = client.call_object(&root, "getAppInfo", vec![]).await.unwrap();

    let forged =
        CallStack::create_and_sign(info.call_stack.calls.clone(), &Secret::from("other")).unwrap();
    let err = client.resolve(&forged).await.unwrap_err();
    assert_eq!(remote_code(err), ErrorCode::AuthenticationFailed);
}

#[tokio::test]
async fn test_unsigned_empty_chain_rejected() {
    let dispatcher = demo_dispatcher();
    let client = local_client(&dispatcher);

    let err = client.resolve(&CallStack::default()).await.unwrap_err();
    assert_eq!(remote_code(err), ErrorCode::AuthenticationFailed);

    // The signed empty chain from a root handle resolves to the root again.
    let root = client.root().await.unwrap();
    let again = client.resolve(&root.call_stack).await.unwrap();
    assert_eq!(again.type_name.as_str(), "App");
    assert!(again.call_stack.verify_signature(&secret()).unwrap());
}

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn test_tampered_session_rejected() {
    let dispatcher = demo_dispatcher();
    let client = local_client(&dispatcher);
    let root = client.root().await.unwrap();
    client
        .call_optional(&root, "login", args(&["alice", DEMO_PASSWORD]).unwrap())
        .await
        .unwrap();

    let mut session = client.session().expect("session");
    session.data = base64::engine::general_purpose::STANDARD.encode(br#"{"userName":"mallory"}"#);
    client.set_session(Some(session));

    let err = client.call(&root, "loggedIn", vec![]).await.unwrap_err();
    assert_eq!(remote_code(err), ErrorCode::AuthenticationFailed);
}

#[tokio::test]
async fn test_extended_expiry_rejected() {
    let dispatcher = demo_dispatcher();
    let until = Utc::now() + Duration::minutes(1);
    let session = SessionData::create_and_sign(&alice(), until, &secret()).unwrap();
    let mut stretched = session.clone();
    stretched.valid_until = session.valid_until + Duration::days(365);

    let err = dispatcher
        .handle(RCall::root(Some(stretched)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AuthenticationFailed);
}

#[tokio::test]
async fn test_expired_session_treated_as_absent() {
    let dispatcher = demo_dispatcher();
    let client = local_client(&dispatcher);
    let root = client.root().await.unwrap();

    let past = Utc::now() - Duration::seconds(5);
    let expired = SessionData::create_and_sign(&alice(), past, &secret()).unwrap();
    client.set_session(Some(expired));

    let logged_in = client.call_optional(&root, "loggedIn", vec![]).await.unwrap();
    assert!(logged_in.is_none());
    assert!(client.session().is_none());
}

#[tokio::test]
async fn test_valid_session_is_refreshed() {
    let dispatcher = demo_dispatcher();
    let client = local_client(&dispatcher);
    let soon = Utc::now() + Duration::seconds(30);
    let session = SessionData::create_and_sign(&alice(), soon, &secret()).unwrap();

    let result = client.transport().call(RCall::root(Some(session))).await.unwrap();

    let refreshed = result.session().expect("session kept");
    assert!(refreshed.verify_signature(&secret()).unwrap());
    assert!(refreshed.valid_until > soon);
    assert_eq!(refreshed.decode::<DemoSession>().unwrap(), alice());
}
