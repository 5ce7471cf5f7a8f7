use super::*;
use crate::test_support::{local_client, ScriptedInvoker};

#[test]
fn lists_decode_bare_and_wrapped_shapes() {
    let bare: Vec<Suggestion> =
        decode_list(json!([{ "id": "1", "title": "a" }]), "item").expect("bare");
    let wrapped: Vec<Suggestion> =
        decode_list(json!({ "item": [{ "id": "1", "title": "a" }] }), "item").expect("wrapped");
    assert_eq!(bare, wrapped);

    let empty: Vec<Suggestion> = decode_list(Value::Null, "item").expect("null");
    assert!(empty.is_empty());

    assert!(decode_list::<Suggestion>(json!({ "other": [] }), "item").is_err());
    assert!(decode_list::<Suggestion>(json!(3), "item").is_err());
}

#[test]
fn like_outcome_decodes_object_or_bare_string() {
    assert_eq!(
        decode_like(json!({ "like_or_unlike": "unliked" })).expect("object"),
        LikeState::Unliked
    );
    assert_eq!(decode_like(json!("liked")).expect("bare"), LikeState::Liked);
    assert!(decode_like(json!("maybe")).is_err());
}

#[tokio::test]
async fn login_records_token_username_and_identity() {
    let invoker = ScriptedInvoker::new();
    invoker
        .respond(
            "login",
            Ok(json!({
                "token": "jwt",
                "user_id": "u1",
                "username": "alice",
                "identity": "admin",
            })),
        )
        .await;
    let client = local_client(invoker.clone());

    let auth = client.login("alice", "secret").await.expect("login");
    assert_eq!(auth.user_id, UserId::from("u1"));
    assert_eq!(client.session().token().await.as_deref(), Some("jwt"));
    assert_eq!(client.session().username().await.as_deref(), Some("alice"));
    assert!(client.session().is_admin().await);

    let calls = invoker.calls().await;
    assert_eq!(
        calls[0].1,
        json!({ "credentials": { "username": "alice", "password": "secret" } })
    );

    client.logout().await.expect("logout");
    assert!(!client.session().is_logged_in().await);
}

#[tokio::test]
async fn comments_accept_legacy_wrapper() {
    let invoker = ScriptedInvoker::new();
    invoker
        .respond(
            "get_comments",
            Ok(json!({ "comments": [{
                "comment_id": "c1",
                "article_id": "a1",
                "user": "bob",
                "content": "hi",
                "created_at": "2024-01-01T00:00:00Z",
            }] })),
        )
        .await;
    let client = local_client(invoker);

    let comments = client
        .list_comments(&ArticleId::from("a1"))
        .await
        .expect("comments");
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].liked_by_me, 0);
    assert_eq!(comments[0].parent_id, None);
}

#[tokio::test]
async fn delete_operations_ignore_the_result_shape() {
    let invoker = ScriptedInvoker::new();
    invoker.respond("delete_comment", Ok(Value::Null)).await;
    invoker
        .respond("delete_article", Ok(json!({ "message": "done" })))
        .await;
    let client = local_client(invoker.clone());

    client
        .delete_comment(&CommentId::from("c1"))
        .await
        .expect("delete comment");
    client
        .delete_article(&ArticleId::from("a1"))
        .await
        .expect("delete article");
    assert_eq!(invoker.calls().await.len(), 2);
}

#[tokio::test]
async fn blank_suggestion_keyword_skips_dispatch() {
    let invoker = ScriptedInvoker::new();
    let client = local_client(invoker.clone());
    assert!(client.suggestions("  ").await.expect("empty").is_empty());
    assert!(invoker.calls().await.is_empty());
}

#[tokio::test]
async fn suggestion_keywords_reach_the_command_intact() {
    let invoker = ScriptedInvoker::new();
    invoker.respond("get_suggestions", Ok(json!([]))).await;
    let client = local_client(invoker.clone());

    for keyword in ["why?", "a/b", "%41", "c# & rust"] {
        client.suggestions(keyword).await.expect("suggestions");
    }

    let keywords: Vec<(String, Value)> = invoker.calls().await;
    let sent: Vec<&str> = keywords
        .iter()
        .map(|(command, args)| {
            assert_eq!(command, "get_suggestions");
            args["keyword"].as_str().expect("keyword")
        })
        .collect();
    assert_eq!(sent, ["why?", "a/b", "%41", "c# & rust"]);
}

#[tokio::test]
async fn suggestion_keywords_arrive_decoded_over_http() {
    use axum::{extract::Path, routing::get, Json, Router};

    let app = Router::new().route(
        "/suggestions/:keyword",
        get(|Path(keyword): Path<String>| async move {
            Json(json!([{ "id": "1", "title": keyword }]))
        }),
    );
    let base = crate::test_support::spawn_server(app).await;
    let dispatcher = Dispatcher::connect(
        SessionContext::in_memory(crate::types::Environment::Networked),
        &base,
        None,
    )
    .expect("dispatcher");
    let client = BlogClient::new(dispatcher);

    for keyword in ["why?", "a/b", "%41"] {
        let hits = client.suggestions(keyword).await.expect("suggestions");
        assert_eq!(hits[0].title, keyword);
    }
}
