//! Request and response bodies shared by the REST routes and the bridge commands.

use serde::{Deserialize, Serialize};

use crate::domain::{ArticleId, ArticleStatus, CommentId, Identity, LikeState, UserId, UserPublic};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: UserId,
    pub username: String,
    #[serde(default)]
    pub identity: Identity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsersQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserPublic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditAccountPayload {
    pub edited_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_identity: Option<Identity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn done() -> Self {
        Self {
            message: "done".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticlesQuery {
    #[serde(default)]
    pub identity: Option<Identity>,
    #[serde(default)]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ArticleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ArticleStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusToggle {
    pub toggle: ArticleStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub article_id: ArticleId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeCommentPayload {
    pub comment_id: CommentId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeOutcome {
    pub like_or_unlike: LikeState,
}
