//! Account provisioning and demo content for fresh databases.

use shared::{
    domain::{ArticleStatus, Identity},
    error::ApiError,
    protocol::ArticleDraft,
};
use storage::{StoredUser, UserUpdate};

use crate::{auth::hash_password, internal, ApiContext};

const DEMO_ARTICLES: &[(&str, &str, &str, ArticleStatus)] = &[
    (
        "Welcome to the blog",
        "A first post to check that everything is wired up.",
        "welcome,meta",
        ArticleStatus::Published,
    ),
    (
        "Writing async Rust",
        "Notes on tokio, cancellation and structured concurrency.",
        "rust,async",
        ArticleStatus::Published,
    ),
    (
        "Unfinished thoughts",
        "This one is still a draft.",
        "draft",
        ArticleStatus::Draft,
    ),
];

/// Creates the account, or resets password and identity when it already exists.
pub async fn upsert_account(
    ctx: &ApiContext,
    username: &str,
    password: &str,
    identity: Identity,
) -> Result<StoredUser, ApiError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::validation("username and password are required"));
    }
    let password_hash = hash_password(password);

    if let Some(existing) = ctx
        .storage
        .find_user_by_username(username)
        .await
        .map_err(internal)?
    {
        ctx.storage
            .update_user(
                &existing.id,
                UserUpdate {
                    username: None,
                    password_hash: Some(password_hash.clone()),
                    identity: Some(identity),
                },
            )
            .await
            .map_err(internal)?;
        return Ok(StoredUser {
            password_hash,
            identity,
            ..existing
        });
    }

    ctx.storage
        .create_user(username, &password_hash, identity)
        .await
        .map_err(internal)
}

/// Inserts the demo articles and a short comment thread when the blog has no
/// articles yet. Returns the number of articles created.
pub async fn seed_demo_content(ctx: &ApiContext) -> Result<usize, ApiError> {
    let existing = ctx.storage.list_articles(true).await.map_err(internal)?;
    if !existing.is_empty() {
        tracing::debug!(articles = existing.len(), "demo seed skipped; blog has content");
        return Ok(0);
    }

    let owner = upsert_account(ctx, "owner", "owner", Identity::Owner).await?;
    let reader = upsert_account(ctx, "reader", "reader", Identity::User).await?;

    let mut created = 0;
    for (title, content, tags, status) in DEMO_ARTICLES {
        let article = ctx
            .storage
            .insert_article(&ArticleDraft {
                title: Some((*title).to_string()),
                content: Some((*content).to_string()),
                tags: Some((*tags).to_string()),
                status: Some(*status),
                ..ArticleDraft::default()
            })
            .await
            .map_err(internal)?;
        created += 1;

        if *status == ArticleStatus::Published {
            let root = ctx
                .storage
                .insert_comment(&article.id, &reader, "Great post!", None)
                .await
                .map_err(internal)?;
            ctx.storage
                .insert_comment(&article.id, &owner, "Thanks for reading.", Some(&root.comment_id))
                .await
                .map_err(internal)?;
        }
    }

    tracing::info!(articles = created, "demo content seeded");
    Ok(created)
}

#[cfg(test)]
#[path = "tests/seed_tests.rs"]
mod tests;
