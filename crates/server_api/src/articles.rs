use shared::{
    domain::{Article, ArticleId, ArticleSummary, Suggestion},
    error::ApiError,
    protocol::{ArticleDraft, ArticlesQuery, MessageResponse, StatusToggle},
};

use crate::{
    auth::require_admin,
    internal, ApiContext,
};

/// Admin and owner listings include drafts and archived articles; every other
/// identity sees published ones only.
pub async fn list_articles(
    ctx: &ApiContext,
    query: ArticlesQuery,
) -> Result<Vec<ArticleSummary>, ApiError> {
    let include_unpublished = query.identity.unwrap_or_default().is_admin();
    let articles = ctx
        .storage
        .list_articles(include_unpublished)
        .await
        .map_err(internal)?;

    let condition = query
        .condition
        .as_deref()
        .map(str::trim)
        .filter(|condition| !condition.is_empty())
        .map(str::to_lowercase);
    Ok(match condition {
        Some(needle) => articles
            .into_iter()
            .filter(|article| article.title.to_lowercase().contains(&needle))
            .collect(),
        None => articles,
    })
}

pub async fn get_article(ctx: &ApiContext, id: &ArticleId) -> Result<Article, ApiError> {
    let article = ctx
        .storage
        .find_article(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("article not found"))?;

    ctx.storage
        .increment_article_views(id)
        .await
        .map_err(internal)?;
    Ok(Article {
        views: article.views + 1,
        ..article
    })
}

pub async fn create_article(
    ctx: &ApiContext,
    token: Option<&str>,
    draft: ArticleDraft,
) -> Result<Article, ApiError> {
    let author = require_admin(ctx, token).await?;
    let has_title = draft
        .title
        .as_deref()
        .is_some_and(|title| !title.trim().is_empty());
    if !has_title {
        return Err(ApiError::validation("article title is required"));
    }
    if let Some(id) = &draft.id {
        if ctx.storage.find_article(id).await.map_err(internal)?.is_some() {
            return Err(ApiError::conflict("article id already exists"));
        }
    }

    let article = ctx.storage.insert_article(&draft).await.map_err(internal)?;
    tracing::info!(article_id = %article.id, by = %author.id, "article created");
    Ok(article)
}

pub async fn update_article(
    ctx: &ApiContext,
    token: Option<&str>,
    id: &ArticleId,
    draft: ArticleDraft,
) -> Result<Article, ApiError> {
    require_admin(ctx, token).await?;
    if draft
        .title
        .as_deref()
        .is_some_and(|title| title.trim().is_empty())
    {
        return Err(ApiError::validation("article title must not be empty"));
    }
    ctx.storage
        .update_article(id, &draft)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("article not found"))
}

pub async fn delete_article(
    ctx: &ApiContext,
    token: Option<&str>,
    id: &ArticleId,
) -> Result<MessageResponse, ApiError> {
    let admin = require_admin(ctx, token).await?;
    if !ctx.storage.delete_article(id).await.map_err(internal)? {
        return Err(ApiError::not_found("article not found"));
    }
    tracing::info!(article_id = %id, by = %admin.id, "article deleted");
    Ok(MessageResponse::done())
}

pub async fn toggle_article_status(
    ctx: &ApiContext,
    token: Option<&str>,
    id: &ArticleId,
    toggle: StatusToggle,
) -> Result<Article, ApiError> {
    require_admin(ctx, token).await?;
    ctx.storage
        .set_article_status(id, toggle.toggle)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("article not found"))
}

pub async fn suggestions(ctx: &ApiContext, keyword: &str) -> Result<Vec<Suggestion>, ApiError> {
    if keyword.trim().is_empty() {
        return Ok(Vec::new());
    }
    ctx.storage
        .search_published_titles(keyword)
        .await
        .map_err(internal)
}

#[cfg(test)]
#[path = "tests/articles_tests.rs"]
mod tests;
