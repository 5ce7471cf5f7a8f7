use super::*;
use crate::{
    test_support::{spawn_server, ScriptedInvoker},
    types::Environment,
};
use axum::{extract::Path, routing::get, Json, Router};
use serde_json::json;

#[tokio::test]
async fn local_like_dispatch_invokes_like_comment_with_token_and_payload() {
    let invoker = ScriptedInvoker::new();
    invoker
        .respond("like_comment", Ok(json!({ "like_or_unlike": "liked" })))
        .await;
    let session = SessionContext::in_memory(Environment::LocalBridge);
    session.login("tok", "alice").await.expect("login");
    let dispatcher =
        Dispatcher::connect(session, "http://unused.invalid", Some(invoker.clone())).expect("dispatcher");

    let envelope = dispatcher
        .dispatch(
            Method::Put,
            "/api/comment/like",
            Some(RequestOptions::default().with_data(json!({ "comment_id": "42" }))),
        )
        .await
        .expect("envelope");

    assert_eq!(envelope.data, json!({ "like_or_unlike": "liked" }));
    assert_eq!(envelope.status, 200);
    assert_eq!(envelope.status_text, "OK");
    assert!(envelope.headers.is_empty());

    let calls = invoker.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "like_comment");
    assert_eq!(
        calls[0].1,
        json!({ "token": "tok", "payload": { "comment_id": "42" } })
    );
}

#[tokio::test]
async fn networked_dispatch_returns_the_raw_network_envelope() {
    let app = Router::new().route(
        "/article/:id",
        get(|Path(id): Path<String>| async move { Json(json!({ "id": id, "title": "seven" })) }),
    );
    let base = spawn_server(app).await;
    let dispatcher = Dispatcher::connect(
        SessionContext::in_memory(Environment::Networked),
        &base,
        None,
    )
    .expect("dispatcher");

    let envelope = dispatcher.get("/article/7", None).await.expect("envelope");
    assert_eq!(envelope.status, 200);
    assert_eq!(envelope.data, json!({ "id": "7", "title": "seven" }));
    assert!(envelope.headers.contains_key("content-type"));
}

#[tokio::test]
async fn local_command_failure_is_rewrapped() {
    let invoker = ScriptedInvoker::new();
    invoker
        .respond("get_users", Err("Invalid token: ExpiredSignature".into()))
        .await;
    let dispatcher = Dispatcher::connect(
        SessionContext::in_memory(Environment::LocalBridge),
        "",
        Some(invoker),
    )
    .expect("dispatcher");

    let err = dispatcher
        .get("/api/users", None)
        .await
        .expect_err("failure");
    assert_eq!(err.status, 500);
    assert_eq!(err.status_text, "Command Failed");
    assert_eq!(err.data, json!("Invalid token: ExpiredSignature"));
}

#[tokio::test]
async fn empty_path_is_rejected_before_any_transport_runs() {
    let invoker = ScriptedInvoker::new();
    let dispatcher = Dispatcher::connect(
        SessionContext::in_memory(Environment::LocalBridge),
        "",
        Some(invoker.clone()),
    )
    .expect("dispatcher");

    let err = dispatcher
        .dispatch(Method::Get, "  ", None)
        .await
        .expect_err("empty path");
    assert_eq!(err.status, 400);
    assert!(invoker.calls().await.is_empty());
}

#[test]
fn local_session_without_invoker_cannot_connect() {
    let result = Dispatcher::connect(
        SessionContext::in_memory(Environment::LocalBridge),
        "http://localhost:3000",
        None,
    );
    assert!(matches!(result, Err(ClientError::Setup(_))));
}
