use std::sync::Arc;

use shared::domain::Identity;
use tokio::sync::RwLock;

use crate::{
    error::StoreError,
    store::{KeyValueStore, MemoryStore},
    types::Environment,
};

pub const TOKEN_KEY: &str = "token";
pub const USERNAME_KEY: &str = "username";

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    username: Option<String>,
    identity: Option<Identity>,
}

/// Credential and environment shared by every dispatch. Clones share state.
#[derive(Clone)]
pub struct SessionContext {
    environment: Environment,
    store: Arc<dyn KeyValueStore>,
    state: Arc<RwLock<SessionState>>,
}

impl SessionContext {
    pub fn new(environment: Environment, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            environment,
            store,
            state: Arc::new(RwLock::new(SessionState::default())),
        }
    }

    pub fn in_memory(environment: Environment) -> Self {
        Self::new(environment, Arc::new(MemoryStore::new()))
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn is_local_environment(&self) -> bool {
        self.environment == Environment::LocalBridge
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    pub async fn username(&self) -> Option<String> {
        self.state.read().await.username.clone()
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.state.read().await.identity
    }

    pub async fn is_logged_in(&self) -> bool {
        self.state.read().await.token.is_some()
    }

    pub async fn is_admin(&self) -> bool {
        self.identity().await.is_some_and(Identity::is_admin)
    }

    pub async fn login(&self, token: &str, username: &str) -> Result<(), StoreError> {
        {
            let mut state = self.state.write().await;
            state.token = non_empty(token);
            state.username = non_empty(username);
        }
        self.store.set(TOKEN_KEY, token).await?;
        self.store.set(USERNAME_KEY, username).await?;
        tracing::debug!(%username, "session stored");
        Ok(())
    }

    /// Identity is kept in memory only.
    pub async fn set_identity(&self, identity: Identity) {
        self.state.write().await.identity = Some(identity);
    }

    pub async fn logout(&self) -> Result<(), StoreError> {
        *self.state.write().await = SessionState::default();
        self.store.remove(TOKEN_KEY).await?;
        self.store.remove(USERNAME_KEY).await?;
        Ok(())
    }

    /// Reloads token and username from storage. Returns whether a token was found.
    pub async fn restore(&self) -> Result<bool, StoreError> {
        let token = self.store.get(TOKEN_KEY).await?;
        let username = self.store.get(USERNAME_KEY).await?;
        let mut state = self.state.write().await;
        state.token = token.as_deref().and_then(non_empty);
        state.username = username.as_deref().and_then(non_empty);
        Ok(state.token.is_some())
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
