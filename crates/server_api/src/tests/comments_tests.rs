use super::*;
use crate::test_support::{account, context};
use shared::{
    domain::{ArticleStatus, Identity, LikeState},
    error::ErrorCode,
    protocol::ArticleDraft,
};

async fn published_article(ctx: &ApiContext) -> ArticleId {
    ctx.storage
        .insert_article(&ArticleDraft {
            title: Some("Post".into()),
            status: Some(ArticleStatus::Published),
            ..ArticleDraft::default()
        })
        .await
        .expect("article")
        .id
}

fn new_comment(article_id: &ArticleId, content: &str) -> NewComment {
    NewComment {
        article_id: article_id.clone(),
        content: content.into(),
        user_id: None,
        parent_id: None,
    }
}

#[tokio::test]
async fn posting_requires_a_token_and_an_existing_article() {
    let ctx = context().await;
    let article_id = published_article(&ctx).await;
    let (_, token) = account(&ctx, "carol", Identity::User).await;

    let err = post_comment(&ctx, None, new_comment(&article_id, "hi"))
        .await
        .expect_err("anonymous");
    assert_eq!(err.code, ErrorCode::Unauthorized);

    let err = post_comment(&ctx, Some(&token), new_comment(&ArticleId::from("nope"), "hi"))
        .await
        .expect_err("missing article");
    assert_eq!(err.code, ErrorCode::NotFound);

    let comment = post_comment(&ctx, Some(&token), new_comment(&article_id, "  hi  "))
        .await
        .expect("post");
    assert_eq!(comment.user, "carol");
    assert_eq!(comment.content, "hi");
}

#[tokio::test]
async fn likes_toggle_and_are_reported_per_viewer() {
    let ctx = context().await;
    let article_id = published_article(&ctx).await;
    let (_, author_token) = account(&ctx, "carol", Identity::User).await;
    let (_, reader_token) = account(&ctx, "dave", Identity::User).await;
    let comment = post_comment(&ctx, Some(&author_token), new_comment(&article_id, "hello"))
        .await
        .expect("post");

    let outcome = like_comment(
        &ctx,
        Some(&reader_token),
        LikeCommentPayload {
            comment_id: comment.comment_id.clone(),
        },
    )
    .await
    .expect("like");
    assert_eq!(outcome.like_or_unlike, LikeState::Liked);

    let as_reader = list_comments(&ctx, Some(&reader_token), &article_id)
        .await
        .expect("list");
    assert_eq!(as_reader[0].liked_by_me, 1);
    assert_eq!(as_reader[0].like_count, 1);

    let anonymous = list_comments(&ctx, None, &article_id).await.expect("list");
    assert_eq!(anonymous[0].liked_by_me, 0);

    let outcome = like_comment(
        &ctx,
        Some(&reader_token),
        LikeCommentPayload {
            comment_id: comment.comment_id,
        },
    )
    .await
    .expect("unlike");
    assert_eq!(outcome.like_or_unlike, LikeState::Unliked);
}

#[tokio::test]
async fn only_author_or_admin_deletes_a_comment() {
    let ctx = context().await;
    let article_id = published_article(&ctx).await;
    let (_, author_token) = account(&ctx, "carol", Identity::User).await;
    let (_, other_token) = account(&ctx, "dave", Identity::User).await;
    let (_, admin_token) = account(&ctx, "admin", Identity::Admin).await;

    let first = post_comment(&ctx, Some(&author_token), new_comment(&article_id, "one"))
        .await
        .expect("post");
    let second = post_comment(&ctx, Some(&author_token), new_comment(&article_id, "two"))
        .await
        .expect("post");

    let err = delete_comment(&ctx, Some(&other_token), &first.comment_id)
        .await
        .expect_err("stranger");
    assert_eq!(err.code, ErrorCode::Forbidden);

    delete_comment(&ctx, Some(&author_token), &first.comment_id)
        .await
        .expect("author delete");
    delete_comment(&ctx, Some(&admin_token), &second.comment_id)
        .await
        .expect("admin delete");
    assert!(list_comments(&ctx, None, &article_id)
        .await
        .expect("list")
        .is_empty());
}

#[tokio::test]
async fn replies_must_target_the_same_article() {
    let ctx = context().await;
    let first_article = published_article(&ctx).await;
    let second_article = published_article(&ctx).await;
    let (_, token) = account(&ctx, "carol", Identity::User).await;
    let root = post_comment(&ctx, Some(&token), new_comment(&first_article, "root"))
        .await
        .expect("root");

    let err = post_comment(
        &ctx,
        Some(&token),
        NewComment {
            parent_id: Some(root.comment_id.clone()),
            ..new_comment(&second_article, "stray reply")
        },
    )
    .await
    .expect_err("cross-article reply");
    assert_eq!(err.code, ErrorCode::Validation);

    let reply = post_comment(
        &ctx,
        Some(&token),
        NewComment {
            parent_id: Some(root.comment_id.clone()),
            ..new_comment(&first_article, "reply")
        },
    )
    .await
    .expect("reply");
    assert_eq!(reply.parent_id, Some(root.comment_id));
}
