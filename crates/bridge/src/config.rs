use server_api::AuthConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    pub database_url: String,
    /// REST backend used by `http_request`; pass-through calls fail without it.
    pub backend_url: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let auth = AuthConfig::default();
        Self {
            database_url: "sqlite://./data/blog-local.db".into(),
            backend_url: None,
            jwt_secret: auth.jwt_secret,
            token_ttl_seconds: auth.token_ttl_seconds,
        }
    }
}

impl BridgeConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("BLOG_DATABASE_URL") {
            self.database_url = v;
        }
        if let Some(v) = lookup("BLOG_BACKEND_URL") {
            self.backend_url = Some(v).filter(|v| !v.trim().is_empty());
        }
        if let Some(v) = lookup("JWT_SECRET") {
            self.jwt_secret = v;
        }
        if let Some(v) = lookup("BLOG_TOKEN_TTL_SECONDS") {
            if let Ok(parsed) = v.parse::<i64>() {
                self.token_ttl_seconds = parsed;
            }
        }
    }

    pub fn auth(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.jwt_secret.clone(),
            token_ttl_seconds: self.token_ttl_seconds,
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
