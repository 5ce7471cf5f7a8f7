//! Blog operations over [`Storage`], shared by the REST server and the local
//! command host so both backends answer with identical payloads.

pub mod accounts;
pub mod articles;
pub mod auth;
pub mod comments;
pub mod seed;

use shared::error::{ApiError, ErrorCode};
use storage::Storage;

pub use auth::AuthConfig;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub auth: AuthConfig,
}

impl ApiContext {
    pub fn new(storage: Storage, auth: AuthConfig) -> Self {
        Self { storage, auth }
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    tracing::error!(error = %err, "storage operation failed");
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
