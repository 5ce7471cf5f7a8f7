use shared::{
    domain::{ArticleId, Comment, CommentId},
    error::ApiError,
    protocol::{LikeCommentPayload, LikeOutcome, MessageResponse, NewComment},
};

use crate::{
    auth::{authenticate, optional_viewer},
    internal, ApiContext,
};

pub async fn list_comments(
    ctx: &ApiContext,
    token: Option<&str>,
    article_id: &ArticleId,
) -> Result<Vec<Comment>, ApiError> {
    let viewer = optional_viewer(ctx, token).await;
    ctx.storage
        .list_comments(article_id, viewer.as_ref().map(|viewer| &viewer.id))
        .await
        .map_err(internal)
}

/// The author is always the token's account; a `user_id` in the body is ignored.
pub async fn post_comment(
    ctx: &ApiContext,
    token: Option<&str>,
    new_comment: NewComment,
) -> Result<Comment, ApiError> {
    let author = authenticate(ctx, token).await?;
    let content = new_comment.content.trim();
    if content.is_empty() {
        return Err(ApiError::validation("comment content must not be empty"));
    }
    if ctx
        .storage
        .find_article(&new_comment.article_id)
        .await
        .map_err(internal)?
        .is_none()
    {
        return Err(ApiError::not_found("article not found"));
    }
    if let Some(parent_id) = &new_comment.parent_id {
        let parent = ctx
            .storage
            .find_comment(parent_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| ApiError::not_found("parent comment not found"))?;
        if parent.article_id != new_comment.article_id {
            return Err(ApiError::validation(
                "parent comment belongs to another article",
            ));
        }
    }

    let comment = ctx
        .storage
        .insert_comment(
            &new_comment.article_id,
            &author,
            content,
            new_comment.parent_id.as_ref(),
        )
        .await
        .map_err(internal)?;
    tracing::debug!(comment_id = %comment.comment_id, article_id = %comment.article_id, "comment posted");
    Ok(comment)
}

pub async fn delete_comment(
    ctx: &ApiContext,
    token: Option<&str>,
    comment_id: &CommentId,
) -> Result<MessageResponse, ApiError> {
    let caller = authenticate(ctx, token).await?;
    let comment = ctx
        .storage
        .find_comment(comment_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("comment not found"))?;

    let is_author = comment.author_id.as_ref() == Some(&caller.id);
    if !is_author && !caller.identity.is_admin() {
        return Err(ApiError::forbidden("only the author or an admin can delete a comment"));
    }

    ctx.storage
        .delete_comment(comment_id)
        .await
        .map_err(internal)?;
    Ok(MessageResponse::done())
}

pub async fn like_comment(
    ctx: &ApiContext,
    token: Option<&str>,
    payload: LikeCommentPayload,
) -> Result<LikeOutcome, ApiError> {
    let caller = authenticate(ctx, token).await?;
    let like_or_unlike = ctx
        .storage
        .toggle_comment_like(&payload.comment_id, &caller.id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("comment not found"))?;
    Ok(LikeOutcome { like_or_unlike })
}

#[cfg(test)]
#[path = "tests/comments_tests.rs"]
mod tests;
