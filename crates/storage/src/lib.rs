use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{
        Article, ArticleId, ArticleStatus, ArticleSummary, Comment, CommentId, Identity,
        LikeState, Suggestion, UserId, UserPublic,
    },
    protocol::ArticleDraft,
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredUser {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub identity: Identity,
}

impl StoredUser {
    pub fn to_public(&self) -> UserPublic {
        UserPublic {
            id: self.id.clone(),
            username: self.username.clone(),
            identity: self.identity,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredComment {
    pub comment_id: CommentId,
    pub article_id: ArticleId,
    pub author_id: Option<UserId>,
    pub parent_id: Option<CommentId>,
}

#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub identity: Option<Identity>,
}

const ARTICLE_COLUMNS: &str =
    "id, title, content, summary, status, views, tags, created_at, update_at, update_count";

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        identity: Identity,
    ) -> Result<StoredUser> {
        let id = UserId::generate();
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, identity, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(username)
        .bind(password_hash)
        .bind(identity.as_str())
        .bind(now_timestamp())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to insert user '{username}'"))?;

        Ok(StoredUser {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            identity,
        })
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<StoredUser>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, identity FROM users WHERE username = ? LIMIT 1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn find_user_by_id(&self, user_id: &UserId) -> Result<Option<StoredUser>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, identity FROM users WHERE id = ? LIMIT 1",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn count_users(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn list_users(&self, limit: i64) -> Result<Vec<UserPublic>> {
        let rows = sqlx::query(
            "SELECT id, username, password_hash, identity FROM users
             ORDER BY created_at ASC, rowid ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|row| user_from_row(row).to_public()).collect())
    }

    /// Returns false when no user had that id. The user's likes cascade away,
    /// so the counters they fed are decremented first.
    pub async fn delete_user(&self, user_id: &UserId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE comments SET like_count = MAX(like_count - 1, 0)
             WHERE comment_id IN (SELECT comment_id FROM comment_likes WHERE user_id = ?)",
        )
        .bind(user_id.as_str())
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_user(&self, user_id: &UserId, update: UserUpdate) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users
             SET username = COALESCE(?, username),
                 password_hash = COALESCE(?, password_hash),
                 identity = COALESCE(?, identity)
             WHERE id = ?",
        )
        .bind(update.username)
        .bind(update.password_hash)
        .bind(update.identity.map(Identity::as_str))
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_article(&self, draft: &ArticleDraft) -> Result<Article> {
        let id = draft.id.clone().unwrap_or_else(ArticleId::generate);
        let title = draft.title.clone().unwrap_or_default();
        // An empty summary falls back to the title.
        let summary = draft
            .summary
            .clone()
            .filter(|summary| !summary.trim().is_empty())
            .unwrap_or_else(|| title.clone());
        sqlx::query(
            "INSERT INTO articles (id, title, content, summary, status, tags, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(&title)
        .bind(draft.content.clone().unwrap_or_default())
        .bind(summary)
        .bind(draft.status.unwrap_or_default().as_str())
        .bind(draft.tags.clone().unwrap_or_default())
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        self.find_article(&id)
            .await?
            .with_context(|| format!("article {id} missing after insert"))
    }

    pub async fn find_article(&self, id: &ArticleId) -> Result<Option<Article>> {
        let row = sqlx::query(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(article_from_row))
    }

    pub async fn list_articles(&self, include_unpublished: bool) -> Result<Vec<ArticleSummary>> {
        let rows = if include_unpublished {
            sqlx::query(&format!(
                "SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY created_at DESC, rowid DESC"
            ))
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(&format!(
                "SELECT {ARTICLE_COLUMNS} FROM articles WHERE status = ?
                 ORDER BY created_at DESC, rowid DESC"
            ))
            .bind(ArticleStatus::Published.as_str())
            .fetch_all(&self.pool)
            .await?
        };
        Ok(rows
            .iter()
            .map(|row| ArticleSummary::from(article_from_row(row)))
            .collect())
    }

    /// Merges the provided fields into the stored article.
    pub async fn update_article(
        &self,
        id: &ArticleId,
        draft: &ArticleDraft,
    ) -> Result<Option<Article>> {
        let result = sqlx::query(
            "UPDATE articles
             SET title = COALESCE(?, title),
                 content = COALESCE(?, content),
                 summary = COALESCE(?, summary),
                 status = COALESCE(?, status),
                 tags = COALESCE(?, tags),
                 update_at = ?,
                 update_count = update_count + 1
             WHERE id = ?",
        )
        .bind(draft.title.as_deref())
        .bind(draft.content.as_deref())
        .bind(draft.summary.as_deref())
        .bind(draft.status.map(ArticleStatus::as_str))
        .bind(draft.tags.as_deref())
        .bind(now_timestamp())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_article(id).await
    }

    pub async fn set_article_status(
        &self,
        id: &ArticleId,
        status: ArticleStatus,
    ) -> Result<Option<Article>> {
        let result = sqlx::query("UPDATE articles SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_article(id).await
    }

    pub async fn increment_article_views(&self, id: &ArticleId) -> Result<()> {
        sqlx::query("UPDATE articles SET views = views + 1 WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Comments and likes on the article go with it.
    pub async fn delete_article(&self, id: &ArticleId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn search_published_titles(&self, keyword: &str) -> Result<Vec<Suggestion>> {
        let pattern = format!("%{}%", keyword.trim());
        let rows = sqlx::query(
            "SELECT id, title FROM articles
             WHERE status = ? AND title LIKE ?
             ORDER BY created_at DESC",
        )
        .bind(ArticleStatus::Published.as_str())
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|row| Suggestion {
                id: ArticleId(row.get::<String, _>("id")),
                title: row.get::<String, _>("title"),
            })
            .collect())
    }

    pub async fn insert_comment(
        &self,
        article_id: &ArticleId,
        author: &StoredUser,
        content: &str,
        parent_id: Option<&CommentId>,
    ) -> Result<Comment> {
        let comment_id = CommentId::generate();
        let created_at = now_timestamp();
        sqlx::query(
            "INSERT INTO comments (comment_id, article_id, user_id, user, content, created_at, parent_id)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(comment_id.as_str())
        .bind(article_id.as_str())
        .bind(author.id.as_str())
        .bind(&author.username)
        .bind(content)
        .bind(&created_at)
        .bind(parent_id.map(CommentId::as_str))
        .execute(&self.pool)
        .await?;

        Ok(Comment {
            comment_id,
            article_id: article_id.clone(),
            user: author.username.clone(),
            content: content.to_string(),
            created_at,
            parent_id: parent_id.cloned(),
            like_count: 0,
            liked_by_me: 0,
        })
    }

    pub async fn find_comment(&self, comment_id: &CommentId) -> Result<Option<StoredComment>> {
        let row = sqlx::query(
            "SELECT comment_id, article_id, user_id, parent_id FROM comments WHERE comment_id = ?",
        )
        .bind(comment_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| StoredComment {
            comment_id: CommentId(row.get::<String, _>("comment_id")),
            article_id: ArticleId(row.get::<String, _>("article_id")),
            author_id: row.get::<Option<String>, _>("user_id").map(UserId),
            parent_id: row.get::<Option<String>, _>("parent_id").map(CommentId),
        }))
    }

    /// Oldest first. `liked_by_me` is computed for `viewer`, 0 for anonymous reads.
    pub async fn list_comments(
        &self,
        article_id: &ArticleId,
        viewer: Option<&UserId>,
    ) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT c.comment_id, c.article_id, c.user, c.content, c.created_at, c.parent_id,
                    c.like_count,
                    CASE WHEN cl.user_id IS NOT NULL THEN 1 ELSE 0 END AS liked_by_me
             FROM comments AS c
             LEFT JOIN comment_likes AS cl
                ON cl.comment_id = c.comment_id AND cl.user_id = ?
             WHERE c.article_id = ?
             ORDER BY c.created_at ASC, c.rowid ASC",
        )
        .bind(viewer.map(UserId::as_str).unwrap_or_default())
        .bind(article_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Comment {
                comment_id: CommentId(row.get::<String, _>("comment_id")),
                article_id: ArticleId(row.get::<String, _>("article_id")),
                user: row.get::<String, _>("user"),
                content: row.get::<String, _>("content"),
                created_at: row.get::<String, _>("created_at"),
                parent_id: row.get::<Option<String>, _>("parent_id").map(CommentId),
                like_count: row.get::<i64, _>("like_count"),
                liked_by_me: row.get::<i64, _>("liked_by_me"),
            })
            .collect())
    }

    /// Replies and likes cascade with the comment.
    pub async fn delete_comment(&self, comment_id: &CommentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE comment_id = ?")
            .bind(comment_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flips the like of `user_id` on the comment and keeps `like_count` in step.
    /// Returns `None` when the comment does not exist.
    pub async fn toggle_comment_like(
        &self,
        comment_id: &CommentId,
        user_id: &UserId,
    ) -> Result<Option<LikeState>> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM comments WHERE comment_id = ?")
            .bind(comment_id.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !exists {
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM comment_likes WHERE comment_id = ? AND user_id = ?")
            .bind(comment_id.as_str())
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let state = if removed > 0 {
            sqlx::query(
                "UPDATE comments SET like_count = MAX(like_count - 1, 0) WHERE comment_id = ?",
            )
            .bind(comment_id.as_str())
            .execute(&mut *tx)
            .await?;
            LikeState::Unliked
        } else {
            sqlx::query("INSERT INTO comment_likes (comment_id, user_id) VALUES (?, ?)")
                .bind(comment_id.as_str())
                .bind(user_id.as_str())
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE comments SET like_count = like_count + 1 WHERE comment_id = ?")
                .bind(comment_id.as_str())
                .execute(&mut *tx)
                .await?;
            LikeState::Liked
        };

        tx.commit().await?;
        tracing::debug!(comment_id = %comment_id, user_id = %user_id, ?state, "comment like toggled");
        Ok(Some(state))
    }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

fn user_from_row(row: &SqliteRow) -> StoredUser {
    StoredUser {
        id: UserId(row.get::<String, _>("id")),
        username: row.get::<String, _>("username"),
        password_hash: row.get::<String, _>("password_hash"),
        identity: row
            .get::<String, _>("identity")
            .parse()
            .unwrap_or_default(),
    }
}

fn article_from_row(row: &SqliteRow) -> Article {
    Article {
        id: ArticleId(row.get::<String, _>("id")),
        title: row.get::<String, _>("title"),
        content: row.get::<String, _>("content"),
        summary: row.get::<String, _>("summary"),
        status: row.get::<String, _>("status").parse().unwrap_or_default(),
        views: row.get::<i64, _>("views"),
        tags: row.get::<String, _>("tags"),
        created_at: row.get::<String, _>("created_at"),
        update_at: row.get::<Option<String>, _>("update_at"),
        update_count: row.get::<i64, _>("update_count"),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
