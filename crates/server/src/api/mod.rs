//! REST routes. Handlers pull the bearer token, call into `server_api` and map
//! `ApiError` codes onto HTTP statuses.

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use server_api::{accounts, articles, comments, ApiContext};
use shared::{
    domain::{Article, ArticleId, ArticleSummary, Comment, CommentId, Suggestion, UserId},
    error::ApiError,
    protocol::{
        ArticleDraft, ArticlesQuery, AuthResponse, EditAccountPayload, LikeCommentPayload,
        LikeOutcome, ListUsersResponse, LoginRequest, MessageResponse, NewComment,
        RegisterRequest, StatusToggle, UsersQuery,
    },
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

const MAX_BODY_BYTES: usize = 1024 * 1024;

pub struct HttpError(ApiError);

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}

type HttpResult<T> = Result<Json<T>, HttpError>;

pub fn build_router(api: ApiContext) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/users", get(list_users))
        .route("/api/users/:id", delete(delete_user))
        .route("/api/editAccount", put(edit_account))
        .route("/articles", get(list_articles))
        .route("/article/:id", get(get_article))
        .route("/api/article", post(create_article))
        .route(
            "/api/article/:id",
            put(update_article)
                .delete(delete_article)
                .patch(toggle_article_status),
        )
        .route("/suggestions/:keyword", get(suggestions))
        .route("/comments/:article_id", get(list_comments))
        .route("/api/comment", post(post_comment))
        .route("/api/comment/like", put(like_comment))
        .route("/comment/:id", delete(delete_comment))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(api)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

async fn health(State(api): State<ApiContext>) -> Result<&'static str, HttpError> {
    api.storage
        .health_check()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok("ok")
}

async fn register(
    State(api): State<ApiContext>,
    Json(req): Json<RegisterRequest>,
) -> HttpResult<AuthResponse> {
    Ok(Json(accounts::register(&api, req).await?))
}

async fn login(
    State(api): State<ApiContext>,
    Json(req): Json<LoginRequest>,
) -> HttpResult<AuthResponse> {
    Ok(Json(accounts::login(&api, req).await?))
}

async fn list_users(
    State(api): State<ApiContext>,
    headers: HeaderMap,
    Query(query): Query<UsersQuery>,
) -> HttpResult<ListUsersResponse> {
    let token = bearer_token(&headers);
    Ok(Json(
        accounts::list_users(&api, token.as_deref(), query).await?,
    ))
}

async fn delete_user(
    State(api): State<ApiContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> HttpResult<MessageResponse> {
    let token = bearer_token(&headers);
    Ok(Json(
        accounts::delete_user(&api, token.as_deref(), &UserId(id)).await?,
    ))
}

async fn edit_account(
    State(api): State<ApiContext>,
    headers: HeaderMap,
    Json(payload): Json<EditAccountPayload>,
) -> HttpResult<MessageResponse> {
    let token = bearer_token(&headers);
    Ok(Json(
        accounts::edit_account(&api, token.as_deref(), payload).await?,
    ))
}

async fn list_articles(
    State(api): State<ApiContext>,
    Query(query): Query<ArticlesQuery>,
) -> HttpResult<Vec<ArticleSummary>> {
    Ok(Json(articles::list_articles(&api, query).await?))
}

async fn get_article(
    State(api): State<ApiContext>,
    Path(id): Path<String>,
) -> HttpResult<Article> {
    Ok(Json(articles::get_article(&api, &ArticleId(id)).await?))
}

async fn create_article(
    State(api): State<ApiContext>,
    headers: HeaderMap,
    Json(draft): Json<ArticleDraft>,
) -> HttpResult<Article> {
    let token = bearer_token(&headers);
    Ok(Json(
        articles::create_article(&api, token.as_deref(), draft).await?,
    ))
}

async fn update_article(
    State(api): State<ApiContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(draft): Json<ArticleDraft>,
) -> HttpResult<Article> {
    let token = bearer_token(&headers);
    Ok(Json(
        articles::update_article(&api, token.as_deref(), &ArticleId(id), draft).await?,
    ))
}

async fn delete_article(
    State(api): State<ApiContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> HttpResult<MessageResponse> {
    let token = bearer_token(&headers);
    Ok(Json(
        articles::delete_article(&api, token.as_deref(), &ArticleId(id)).await?,
    ))
}

async fn toggle_article_status(
    State(api): State<ApiContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(toggle): Json<StatusToggle>,
) -> HttpResult<Article> {
    let token = bearer_token(&headers);
    Ok(Json(
        articles::toggle_article_status(&api, token.as_deref(), &ArticleId(id), toggle).await?,
    ))
}

async fn suggestions(
    State(api): State<ApiContext>,
    Path(keyword): Path<String>,
) -> HttpResult<Vec<Suggestion>> {
    Ok(Json(articles::suggestions(&api, &keyword).await?))
}

async fn list_comments(
    State(api): State<ApiContext>,
    headers: HeaderMap,
    Path(article_id): Path<String>,
) -> HttpResult<Vec<Comment>> {
    let token = bearer_token(&headers);
    Ok(Json(
        comments::list_comments(&api, token.as_deref(), &ArticleId(article_id)).await?,
    ))
}

async fn post_comment(
    State(api): State<ApiContext>,
    headers: HeaderMap,
    Json(new_comment): Json<NewComment>,
) -> HttpResult<Comment> {
    let token = bearer_token(&headers);
    Ok(Json(
        comments::post_comment(&api, token.as_deref(), new_comment).await?,
    ))
}

async fn delete_comment(
    State(api): State<ApiContext>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> HttpResult<MessageResponse> {
    let token = bearer_token(&headers);
    Ok(Json(
        comments::delete_comment(&api, token.as_deref(), &CommentId(id)).await?,
    ))
}

async fn like_comment(
    State(api): State<ApiContext>,
    headers: HeaderMap,
    Json(payload): Json<LikeCommentPayload>,
) -> HttpResult<LikeOutcome> {
    let token = bearer_token(&headers);
    Ok(Json(
        comments::like_comment(&api, token.as_deref(), payload).await?,
    ))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
