use std::collections::HashMap;

use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::*;
use crate::test_support::spawn_server;

fn request(method: &str, url: &str) -> PassthroughRequest {
    PassthroughRequest {
        method: method.into(),
        url: url.into(),
        params: BTreeMap::new(),
        data: None,
        token: None,
    }
}

async fn backend() -> String {
    let app = Router::new()
        .route(
            "/echo",
            post(
                |headers: HeaderMap,
                 Query(query): Query<HashMap<String, String>>,
                 Json(body): Json<Value>| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    Json(json!({ "auth": auth, "query": query, "body": body }))
                },
            ),
        )
        .route("/health", get(|| async { "ok" }))
        .route(
            "/locked",
            get(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({ "code": "forbidden", "message": "admins only" })),
                )
            }),
        )
        .route(
            "/broken",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
    spawn_server(app).await
}

#[tokio::test]
async fn forwards_method_token_params_and_body() {
    let base = backend().await;
    let passthrough = Passthrough::new(Some(&base)).expect("passthrough");

    let mut req = request("post", "echo");
    req.params.insert("page".into(), "2".into());
    req.data = Some(json!({ "title": "hello" }));
    req.token = Some("tok".into());

    let value = passthrough.send(req).await.expect("echo");
    assert_eq!(value["auth"], "Bearer tok");
    assert_eq!(value["query"]["page"], "2");
    assert_eq!(value["body"], json!({ "title": "hello" }));
}

#[tokio::test]
async fn plain_text_bodies_come_back_as_strings() {
    let base = backend().await;
    let passthrough = Passthrough::new(Some(&base)).expect("passthrough");
    let value = passthrough.send(request("GET", "/health")).await.expect("health");
    assert_eq!(value, json!("ok"));
}

#[tokio::test]
async fn service_errors_keep_their_code() {
    let base = backend().await;
    let passthrough = Passthrough::new(Some(&base)).expect("passthrough");

    let err = passthrough
        .send(request("GET", "/locked"))
        .await
        .expect_err("forbidden");
    let CommandError::Api(api) = err else {
        panic!("expected a service error, got {err:?}");
    };
    assert_eq!(api.message, "admins only");

    let err = passthrough
        .send(request("GET", "/broken"))
        .await
        .expect_err("bad gateway");
    assert!(err.to_string().starts_with("HTTP 502"));
    assert!(err.to_string().contains("upstream down"));
}

#[tokio::test]
async fn legacy_token_key_is_accepted() {
    let req: PassthroughRequest = serde_json::from_value(json!({
        "method": "GET",
        "url": "/x",
        "__token": "abc",
    }))
    .expect("request");
    assert_eq!(req.token.as_deref(), Some("abc"));
    assert!(req.params.is_empty());
}

#[tokio::test]
async fn missing_backend_or_bad_method_fails_without_sending() {
    let passthrough = Passthrough::new(None).expect("passthrough");
    let err = passthrough
        .send(request("GET", "/health"))
        .await
        .expect_err("no backend");
    assert!(err.to_string().contains("no backend"));

    let passthrough = Passthrough::new(Some("http://127.0.0.1:9")).expect("passthrough");
    let err = passthrough
        .send(request("TRACE", "/health"))
        .await
        .expect_err("method");
    assert!(err.to_string().contains("unsupported method"));
}
