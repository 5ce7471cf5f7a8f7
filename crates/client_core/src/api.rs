//! Typed blog operations on top of [`Dispatcher`]. Decoders accept both the
//! bare payloads and the older wrapped shapes some backends still send.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared::{
    domain::{
        Article, ArticleId, ArticleStatus, ArticleSummary, Comment, CommentId, Identity, LikeState,
        Suggestion, UserId, UserPublic,
    },
    protocol::{
        ArticleDraft, AuthResponse, EditAccountPayload, LikeOutcome, LoginRequest,
        RegisterRequest, StatusToggle,
    },
};

use crate::{
    dispatcher::Dispatcher,
    envelope::Envelope,
    error::ClientError,
    session::SessionContext,
    types::RequestOptions,
};

#[derive(Clone)]
pub struct BlogClient {
    dispatcher: Dispatcher,
}

impl BlogClient {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn session(&self) -> &SessionContext {
        self.dispatcher.session()
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        let envelope = self.dispatcher.post("/api/register", to_value(request)?).await?;
        decode(envelope.data)
    }

    /// Logs in and records the token, username and identity in the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let envelope = self.dispatcher.post("/api/login", to_value(&request)?).await?;
        let auth: AuthResponse = decode(envelope.data)?;
        self.session().login(&auth.token, &auth.username).await?;
        self.session().set_identity(auth.identity).await;
        Ok(auth)
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        Ok(self.session().logout().await?)
    }

    pub async fn list_users(&self, limit: Option<i64>) -> Result<Vec<UserPublic>, ClientError> {
        let mut options = RequestOptions::default();
        if let Some(limit) = limit {
            options = options.with_param("limit", limit);
        }
        let envelope = self.dispatcher.get("/api/users", Some(options)).await?;
        decode_list(envelope.data, "users")
    }

    pub async fn delete_user(&self, user_id: &UserId) -> Result<(), ClientError> {
        self.dispatcher
            .delete(&format!("/api/users/{}", segment(user_id.as_str())))
            .await?;
        Ok(())
    }

    pub async fn edit_account(&self, payload: &EditAccountPayload) -> Result<(), ClientError> {
        self.dispatcher
            .put("/api/editAccount", to_value(payload)?)
            .await?;
        Ok(())
    }

    pub async fn list_articles(
        &self,
        identity: Identity,
        condition: Option<&str>,
    ) -> Result<Vec<ArticleSummary>, ClientError> {
        let mut options = RequestOptions::default().with_param("identity", identity);
        if let Some(condition) = condition.filter(|c| !c.trim().is_empty()) {
            options = options.with_param("condition", condition);
        }
        let envelope = self.dispatcher.get("/articles", Some(options)).await?;
        decode_list(envelope.data, "articles")
    }

    pub async fn get_article(&self, id: &ArticleId) -> Result<Article, ClientError> {
        let envelope = self
            .dispatcher
            .get(&format!("/article/{}", segment(id.as_str())), None)
            .await?;
        decode_item(envelope)
    }

    pub async fn create_article(&self, draft: &ArticleDraft) -> Result<Article, ClientError> {
        let envelope = self.dispatcher.post("/api/article", to_value(draft)?).await?;
        decode_item(envelope)
    }

    pub async fn update_article(
        &self,
        id: &ArticleId,
        draft: &ArticleDraft,
    ) -> Result<Article, ClientError> {
        let envelope = self
            .dispatcher
            .put(&format!("/api/article/{}", segment(id.as_str())), to_value(draft)?)
            .await?;
        decode_item(envelope)
    }

    pub async fn delete_article(&self, id: &ArticleId) -> Result<(), ClientError> {
        self.dispatcher
            .delete(&format!("/api/article/{}", segment(id.as_str())))
            .await?;
        Ok(())
    }

    pub async fn toggle_article_status(
        &self,
        id: &ArticleId,
        status: ArticleStatus,
    ) -> Result<Article, ClientError> {
        let envelope = self
            .dispatcher
            .patch(
                &format!("/api/article/{}", segment(id.as_str())),
                to_value(&StatusToggle { toggle: status })?,
            )
            .await?;
        decode_item(envelope)
    }

    pub async fn suggestions(&self, keyword: &str) -> Result<Vec<Suggestion>, ClientError> {
        if keyword.trim().is_empty() {
            return Ok(Vec::new());
        }
        let envelope = self
            .dispatcher
            .get(&format!("/suggestions/{}", segment(keyword.trim())), None)
            .await?;
        decode_list(envelope.data, "item")
    }

    pub async fn list_comments(&self, article_id: &ArticleId) -> Result<Vec<Comment>, ClientError> {
        let envelope = self
            .dispatcher
            .get(&format!("/comments/{}", segment(article_id.as_str())), None)
            .await?;
        decode_list(envelope.data, "comments")
    }

    pub async fn post_comment(
        &self,
        article_id: &ArticleId,
        content: &str,
        parent_id: Option<&CommentId>,
    ) -> Result<Comment, ClientError> {
        let mut body = json!({ "article_id": article_id, "content": content });
        if let Some(parent_id) = parent_id {
            body["parent_id"] = json!(parent_id);
        }
        let envelope = self.dispatcher.post("/api/comment", body).await?;
        decode_item(envelope)
    }

    pub async fn delete_comment(&self, comment_id: &CommentId) -> Result<(), ClientError> {
        self.dispatcher
            .delete(&format!("/comment/{}", segment(comment_id.as_str())))
            .await?;
        Ok(())
    }

    pub async fn like_comment(&self, comment_id: &CommentId) -> Result<LikeState, ClientError> {
        let envelope = self
            .dispatcher
            .put("/api/comment/like", json!({ "comment_id": comment_id }))
            .await?;
        decode_like(envelope.data)
    }
}

/// Percent-encodes one path segment so `/`, `?` and `%` survive both transports.
fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ClientError> {
    serde_json::to_value(value).map_err(|e| ClientError::Decode(e.to_string()))
}

fn decode<T: DeserializeOwned>(data: Value) -> Result<T, ClientError> {
    serde_json::from_value(data).map_err(|e| ClientError::Decode(e.to_string()))
}

fn decode_item<T: DeserializeOwned>(envelope: Envelope) -> Result<T, ClientError> {
    envelope
        .json()
        .map_err(|e| ClientError::Decode(e.to_string()))
}

/// Accepts `[...]` or `{ "<wrapper>": [...] }`.
pub fn decode_list<T: DeserializeOwned>(data: Value, wrapper: &str) -> Result<Vec<T>, ClientError> {
    let list = match data {
        Value::Array(_) => data,
        Value::Object(mut map) => map.remove(wrapper).ok_or_else(|| {
            ClientError::Decode(format!("expected a list or an object with '{wrapper}'"))
        })?,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(ClientError::Decode(format!(
                "expected a list, got {other}"
            )))
        }
    };
    decode(list)
}

/// Accepts `{ "like_or_unlike": "liked" }` or a bare `"liked"`.
pub fn decode_like(data: Value) -> Result<LikeState, ClientError> {
    match data {
        Value::String(raw) => raw
            .parse()
            .map_err(|e: shared::domain::UnknownVariant| ClientError::Decode(e.to_string())),
        other => decode::<LikeOutcome>(other).map(|outcome| outcome.like_or_unlike),
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
