use super::*;
use crate::test_support::{local_client, ScriptedInvoker};
use serde_json::json;

fn comment(id: &str, parent: Option<&str>, liked_by_me: i64, like_count: i64) -> Comment {
    Comment {
        comment_id: CommentId::from(id),
        article_id: ArticleId::from("a1"),
        user: "bob".into(),
        content: format!("comment {id}"),
        created_at: "2024-01-01T00:00:00Z".into(),
        parent_id: parent.map(CommentId::from),
        like_count,
        liked_by_me,
    }
}

async fn logged_in_client(like_result: Result<serde_json::Value, String>) -> BlogClient {
    let invoker = ScriptedInvoker::new();
    invoker.respond("like_comment", like_result).await;
    let client = local_client(invoker);
    client.session().login("tok", "alice").await.expect("login");
    client
}

#[test]
fn tree_nests_replies_and_drops_orphans() {
    let tree = build_comment_tree(vec![
        comment("1", None, 0, 0),
        comment("2", Some("1"), 0, 0),
        comment("3", None, 0, 0),
        comment("4", Some("2"), 0, 0),
        comment("5", Some("missing"), 0, 0),
    ]);
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].comment.comment_id, CommentId::from("1"));
    assert_eq!(tree[0].children.len(), 1);
    assert_eq!(tree[0].children[0].children[0].comment.comment_id, CommentId::from("4"));
    assert!(tree[1].children.is_empty());
}

#[tokio::test]
async fn confirmed_like_keeps_the_optimistic_change() {
    let client = logged_in_client(Ok(json!({ "like_or_unlike": "liked" }))).await;
    let mut board = CommentBoard::from_comments(
        ArticleId::from("a1"),
        vec![comment("1", None, 0, 0), comment("2", Some("1"), 0, 4)],
    );

    let state = board
        .toggle_like(&client, &CommentId::from("2"))
        .await
        .expect("like");
    assert_eq!(state, LikeState::Liked);
    let reply = board.find(&CommentId::from("2")).expect("reply");
    assert_eq!(reply.liked_by_me, 1);
    assert_eq!(reply.like_count, 5);
}

#[tokio::test]
async fn disagreeing_server_state_rolls_back() {
    let client = logged_in_client(Ok(json!("liked"))).await;
    let mut board =
        CommentBoard::from_comments(ArticleId::from("a1"), vec![comment("1", None, 1, 3)]);

    let err = board
        .toggle_like(&client, &CommentId::from("1"))
        .await
        .expect_err("mismatch");
    assert!(matches!(
        err,
        LikeError::StateMismatch {
            expected: LikeState::Unliked,
            reported: LikeState::Liked,
        }
    ));
    let root = board.find(&CommentId::from("1")).expect("root");
    assert_eq!((root.liked_by_me, root.like_count), (1, 3));
}

#[tokio::test]
async fn failed_request_rolls_back() {
    let client = logged_in_client(Err("Invalid token".into())).await;
    let mut board =
        CommentBoard::from_comments(ArticleId::from("a1"), vec![comment("1", None, 0, 2)]);

    let err = board
        .toggle_like(&client, &CommentId::from("1"))
        .await
        .expect_err("failure");
    let LikeError::Request(ClientError::Dispatch(dispatch)) = err else {
        panic!("expected a dispatch failure");
    };
    assert_eq!(dispatch.status_text, "Command Failed");
    let root = board.find(&CommentId::from("1")).expect("root");
    assert_eq!((root.liked_by_me, root.like_count), (0, 2));
}

#[tokio::test]
async fn like_requires_login_and_a_known_comment() {
    let invoker = ScriptedInvoker::new();
    let client = local_client(invoker.clone());
    let mut board =
        CommentBoard::from_comments(ArticleId::from("a1"), vec![comment("1", None, 0, 0)]);

    let err = board
        .toggle_like(&client, &CommentId::from("1"))
        .await
        .expect_err("anonymous");
    assert!(matches!(err, LikeError::NotLoggedIn));

    client.session().login("tok", "alice").await.expect("login");
    let err = board
        .toggle_like(&client, &CommentId::from("nope"))
        .await
        .expect_err("unknown");
    assert!(matches!(err, LikeError::NotFound(_)));
    assert!(invoker.calls().await.is_empty());
}
