use shared::{
    domain::{Identity, UserId},
    error::ApiError,
    protocol::{
        AuthResponse, EditAccountPayload, ListUsersResponse, LoginRequest, MessageResponse,
        RegisterRequest, UsersQuery,
    },
};
use storage::{StoredUser, UserUpdate};

use crate::{
    auth::{hash_password, issue_token, require_admin, verify_password},
    internal, ApiContext,
};

const DEFAULT_USERS_LIMIT: i64 = 10;
const MIN_PASSWORD_LEN: usize = 3;

pub async fn register(ctx: &ApiContext, req: RegisterRequest) -> Result<AuthResponse, ApiError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(
            "invalid username or password too short",
        ));
    }
    if ctx
        .storage
        .find_user_by_username(username)
        .await
        .map_err(internal)?
        .is_some()
    {
        return Err(ApiError::conflict("username already registered"));
    }

    // The first account owns the blog; self-registration never grants admin rights.
    let identity = if ctx.storage.count_users().await.map_err(internal)? == 0 {
        Identity::Owner
    } else {
        match req.identity {
            Some(Identity::Visitor) => Identity::Visitor,
            _ => Identity::User,
        }
    };

    let user = ctx
        .storage
        .create_user(username, &hash_password(&req.password), identity)
        .await
        .map_err(internal)?;
    tracing::info!(user_id = %user.id, username = %user.username, %identity, "account registered");
    auth_response(ctx, &user)
}

pub async fn login(ctx: &ApiContext, req: LoginRequest) -> Result<AuthResponse, ApiError> {
    let user = ctx
        .storage
        .find_user_by_username(req.username.trim())
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::unauthorized("invalid credentials"))?;
    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::unauthorized("invalid credentials"));
    }
    auth_response(ctx, &user)
}

pub async fn list_users(
    ctx: &ApiContext,
    token: Option<&str>,
    query: UsersQuery,
) -> Result<ListUsersResponse, ApiError> {
    require_admin(ctx, token).await?;
    let limit = query.limit.filter(|limit| *limit > 0).unwrap_or(DEFAULT_USERS_LIMIT);
    let users = ctx.storage.list_users(limit).await.map_err(internal)?;
    Ok(ListUsersResponse { users })
}

pub async fn delete_user(
    ctx: &ApiContext,
    token: Option<&str>,
    user_id: &UserId,
) -> Result<MessageResponse, ApiError> {
    let admin = require_admin(ctx, token).await?;
    let target = load_user(ctx, user_id).await?;
    if target.identity == Identity::Owner {
        return Err(ApiError::forbidden("the owner account cannot be deleted"));
    }
    ctx.storage.delete_user(user_id).await.map_err(internal)?;
    tracing::info!(user_id = %user_id, by = %admin.id, "account deleted");
    Ok(MessageResponse::done())
}

pub async fn edit_account(
    ctx: &ApiContext,
    token: Option<&str>,
    payload: EditAccountPayload,
) -> Result<MessageResponse, ApiError> {
    let admin = require_admin(ctx, token).await?;
    let target = load_user(ctx, &payload.edited_id).await?;

    if target.identity == Identity::Owner
        && payload
            .edited_identity
            .is_some_and(|identity| identity != Identity::Owner)
    {
        return Err(ApiError::forbidden("the owner account cannot be demoted"));
    }
    if payload.edited_identity == Some(Identity::Owner) && target.identity != Identity::Owner {
        return Err(ApiError::forbidden("ownership cannot be granted"));
    }

    let username = match payload.edited_username.as_deref().map(str::trim) {
        Some("") => return Err(ApiError::validation("username must not be empty")),
        Some(name) if name != target.username => {
            if ctx
                .storage
                .find_user_by_username(name)
                .await
                .map_err(internal)?
                .is_some()
            {
                return Err(ApiError::conflict("username already registered"));
            }
            Some(name.to_string())
        }
        _ => None,
    };
    let password_hash = match payload.edited_password.as_deref() {
        Some(password) if password.len() < MIN_PASSWORD_LEN => {
            return Err(ApiError::validation("password too short"))
        }
        Some(password) => Some(hash_password(password)),
        None => None,
    };

    ctx.storage
        .update_user(
            &target.id,
            UserUpdate {
                username,
                password_hash,
                identity: payload.edited_identity,
            },
        )
        .await
        .map_err(internal)?;
    tracing::info!(user_id = %target.id, by = %admin.id, "account edited");
    Ok(MessageResponse::done())
}

async fn load_user(ctx: &ApiContext, user_id: &UserId) -> Result<StoredUser, ApiError> {
    ctx.storage
        .find_user_by_id(user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("user not found"))
}

fn auth_response(ctx: &ApiContext, user: &StoredUser) -> Result<AuthResponse, ApiError> {
    let token = issue_token(&ctx.auth, user)
        .map_err(|e| ApiError::internal(format!("token mint failed: {e}")))?;
    Ok(AuthResponse {
        token,
        user_id: user.id.clone(),
        username: user.username.clone(),
        identity: user.identity,
    })
}

#[cfg(test)]
#[path = "tests/accounts_tests.rs"]
mod tests;
