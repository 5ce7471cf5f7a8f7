use shared::domain::Identity;
use storage::{Storage, StoredUser};

use crate::{
    auth::{hash_password, issue_token},
    ApiContext, AuthConfig,
};

pub async fn context() -> ApiContext {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    ApiContext::new(
        storage,
        AuthConfig {
            jwt_secret: "test-secret".into(),
            token_ttl_seconds: 60,
        },
    )
}

/// Creates an account directly in storage and returns it with a fresh token.
pub async fn account(ctx: &ApiContext, username: &str, identity: Identity) -> (StoredUser, String) {
    let user = ctx
        .storage
        .create_user(username, &hash_password("secret"), identity)
        .await
        .expect("user");
    let token = issue_token(&ctx.auth, &user).expect("token");
    (user, token)
}
