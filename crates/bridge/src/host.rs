use async_trait::async_trait;
use client_core::CommandInvoker;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use server_api::{accounts, articles, auth, comments, ApiContext};
use shared::{
    domain::{ArticleId, CommentId, Identity, UserId},
    error::ApiError,
    protocol::{
        ArticleDraft, ArticlesQuery, EditAccountPayload, LikeCommentPayload, LoginRequest,
        NewComment, RegisterRequest, StatusToggle, UsersQuery,
    },
};
use storage::Storage;
use tracing::{debug, warn};

use crate::{
    config::BridgeConfig,
    error::CommandError,
    passthrough::{Passthrough, PassthroughRequest},
};

/// Commands answered by [`CommandHost`], in registration order.
pub const COMMANDS: &[&str] = &[
    "register",
    "login",
    "verify_token",
    "get_current_user",
    "get_users",
    "delete_user",
    "edit_account",
    "get_articles",
    "get_article_by_id",
    "create_article",
    "update_article",
    "delete_article",
    "toggle_article_status",
    "get_suggestions",
    "get_comments",
    "post_comment",
    "delete_comment",
    "like_comment",
    "http_request",
];

#[derive(Deserialize)]
struct RegisterArgs {
    user_info: RegisterRequest,
}

#[derive(Deserialize)]
struct LoginArgs {
    credentials: LoginRequest,
}

#[derive(Deserialize)]
struct TokenArgs {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Deserialize)]
struct UsersArgs {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct DeleteUserArgs {
    #[serde(default)]
    token: Option<String>,
    user_id: UserId,
}

#[derive(Deserialize)]
struct EditAccountArgs {
    #[serde(default)]
    token: Option<String>,
    payload: EditAccountPayload,
}

#[derive(Deserialize)]
struct ArticlesArgs {
    #[serde(default)]
    identity: Option<String>,
    #[serde(default)]
    condition: Option<String>,
}

#[derive(Deserialize)]
struct ArticleIdArgs {
    id: ArticleId,
}

#[derive(Deserialize)]
struct CreateArticleArgs {
    #[serde(default)]
    token: Option<String>,
    article_data: ArticleDraft,
}

#[derive(Deserialize)]
struct UpdateArticleArgs {
    #[serde(default)]
    token: Option<String>,
    id: ArticleId,
    article_data: ArticleDraft,
}

#[derive(Deserialize)]
struct DeleteArticleArgs {
    #[serde(default)]
    token: Option<String>,
    id: ArticleId,
}

#[derive(Deserialize)]
struct ToggleStatusArgs {
    #[serde(default)]
    token: Option<String>,
    id: ArticleId,
    status: StatusToggle,
}

#[derive(Deserialize)]
struct SuggestionsArgs {
    keyword: String,
}

#[derive(Deserialize)]
struct CommentsArgs {
    article_id: ArticleId,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Deserialize)]
struct PostCommentArgs {
    #[serde(default)]
    token: Option<String>,
    comment_data: NewComment,
}

#[derive(Deserialize)]
struct DeleteCommentArgs {
    #[serde(default)]
    token: Option<String>,
    comment_id: CommentId,
}

#[derive(Deserialize)]
struct LikeCommentArgs {
    #[serde(default)]
    token: Option<String>,
    payload: LikeCommentPayload,
}

#[derive(Deserialize)]
struct HttpRequestArgs {
    request: PassthroughRequest,
}

/// Runs named commands against the local database.
#[derive(Clone)]
pub struct CommandHost {
    api: ApiContext,
    passthrough: Passthrough,
}

impl CommandHost {
    pub fn new(api: ApiContext, passthrough: Passthrough) -> Self {
        Self { api, passthrough }
    }

    /// Opens (and migrates) the configured database.
    pub async fn open(config: &BridgeConfig) -> anyhow::Result<Self> {
        let storage = Storage::new(&config.database_url).await?;
        let passthrough = Passthrough::new(config.backend_url.as_deref())?;
        Ok(Self::new(ApiContext::new(storage, config.auth()), passthrough))
    }

    pub fn api(&self) -> &ApiContext {
        &self.api
    }

    pub async fn run(&self, command: &str, args: Value) -> Result<Value, CommandError> {
        let ctx = &self.api;
        match command {
            "register" => {
                let a: RegisterArgs = parse("register", args)?;
                reply(accounts::register(ctx, a.user_info).await?)
            }
            "login" => {
                let a: LoginArgs = parse("login", args)?;
                reply(accounts::login(ctx, a.credentials).await?)
            }
            "verify_token" => {
                let a: TokenArgs = parse("verify_token", args)?;
                let token = a.token.unwrap_or_default();
                reply(auth::decode_token(&ctx.auth, &token)?)
            }
            "get_current_user" => {
                let a: TokenArgs = parse("get_current_user", args)?;
                let user = auth::authenticate(ctx, a.token.as_deref()).await?;
                reply(user.to_public())
            }
            "get_users" => {
                let a: UsersArgs = parse("get_users", args)?;
                let query = UsersQuery { limit: a.limit };
                reply(accounts::list_users(ctx, a.token.as_deref(), query).await?)
            }
            "delete_user" => {
                let a: DeleteUserArgs = parse("delete_user", args)?;
                reply(accounts::delete_user(ctx, a.token.as_deref(), &a.user_id).await?)
            }
            "edit_account" => {
                let a: EditAccountArgs = parse("edit_account", args)?;
                reply(accounts::edit_account(ctx, a.token.as_deref(), a.payload).await?)
            }
            "get_articles" => {
                let a: ArticlesArgs = parse("get_articles", args)?;
                let query = ArticlesQuery {
                    identity: a.identity.and_then(|raw| raw.parse::<Identity>().ok()),
                    condition: a.condition,
                };
                reply(articles::list_articles(ctx, query).await?)
            }
            "get_article_by_id" => {
                let a: ArticleIdArgs = parse("get_article_by_id", args)?;
                reply(articles::get_article(ctx, &a.id).await?)
            }
            "create_article" => {
                let a: CreateArticleArgs = parse("create_article", args)?;
                reply(articles::create_article(ctx, a.token.as_deref(), a.article_data).await?)
            }
            "update_article" => {
                let a: UpdateArticleArgs = parse("update_article", args)?;
                reply(
                    articles::update_article(ctx, a.token.as_deref(), &a.id, a.article_data)
                        .await?,
                )
            }
            "delete_article" => {
                let a: DeleteArticleArgs = parse("delete_article", args)?;
                reply(articles::delete_article(ctx, a.token.as_deref(), &a.id).await?)
            }
            "toggle_article_status" => {
                let a: ToggleStatusArgs = parse("toggle_article_status", args)?;
                reply(
                    articles::toggle_article_status(ctx, a.token.as_deref(), &a.id, a.status)
                        .await?,
                )
            }
            "get_suggestions" => {
                let a: SuggestionsArgs = parse("get_suggestions", args)?;
                reply(articles::suggestions(ctx, &a.keyword).await?)
            }
            "get_comments" => {
                let a: CommentsArgs = parse("get_comments", args)?;
                reply(comments::list_comments(ctx, a.token.as_deref(), &a.article_id).await?)
            }
            "post_comment" => {
                let a: PostCommentArgs = parse("post_comment", args)?;
                reply(comments::post_comment(ctx, a.token.as_deref(), a.comment_data).await?)
            }
            "delete_comment" => {
                let a: DeleteCommentArgs = parse("delete_comment", args)?;
                reply(comments::delete_comment(ctx, a.token.as_deref(), &a.comment_id).await?)
            }
            "like_comment" => {
                let a: LikeCommentArgs = parse("like_comment", args)?;
                reply(comments::like_comment(ctx, a.token.as_deref(), a.payload).await?)
            }
            "http_request" => {
                let a: HttpRequestArgs = parse("http_request", args)?;
                self.passthrough.send(a.request).await
            }
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}

#[async_trait]
impl CommandInvoker for CommandHost {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, String> {
        debug!(command, "local command");
        self.run(command, args).await.map_err(|err| {
            warn!(command, error = %err, "local command rejected");
            err.into_wire()
        })
    }
}

fn parse<T: DeserializeOwned>(command: &'static str, args: Value) -> Result<T, CommandError> {
    serde_json::from_value(args).map_err(|err| CommandError::invalid_args(command, err))
}

fn reply<T: Serialize>(value: T) -> Result<Value, CommandError> {
    serde_json::to_value(value).map_err(|err| CommandError::Api(ApiError::internal(err.to_string())))
}

#[cfg(test)]
#[path = "tests/host_tests.rs"]
mod tests;
