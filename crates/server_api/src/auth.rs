use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared::{domain::UserId, error::ApiError};
use storage::StoredUser;

use crate::{internal, ApiContext};

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "dev-secret".to_string(),
            token_ttl_seconds: 60 * 60 * 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(cfg: &AuthConfig, user: &StoredUser) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::seconds(cfg.token_ttl_seconds);
    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
    )
}

pub fn decode_token(cfg: &AuthConfig, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|err| ApiError::unauthorized(format!("invalid token: {err}")))
}

/// Stored as `<salt>$<base64(sha256(salt || password))>`.
pub fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    format!("{salt}${}", digest(&salt, password))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    digest(salt, password) == expected
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Resolves the bearer token to the account it was issued for.
pub async fn authenticate(ctx: &ApiContext, token: Option<&str>) -> Result<StoredUser, ApiError> {
    let token = token
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
    let claims = decode_token(&ctx.auth, token)?;
    ctx.storage
        .find_user_by_id(&UserId(claims.sub))
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::unauthorized("account no longer exists"))
}

pub async fn require_admin(ctx: &ApiContext, token: Option<&str>) -> Result<StoredUser, ApiError> {
    let user = authenticate(ctx, token).await?;
    if !user.identity.is_admin() {
        return Err(ApiError::forbidden("admin privileges required"));
    }
    Ok(user)
}

/// Anonymous readers are allowed; a bad token reads as anonymous.
pub async fn optional_viewer(ctx: &ApiContext, token: Option<&str>) -> Option<StoredUser> {
    match token {
        Some(token) if !token.trim().is_empty() => authenticate(ctx, Some(token)).await.ok(),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
