use std::collections::BTreeMap;

use client_core::{transport::HTTP_TIMEOUT, Method};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use shared::error::ApiError;
use url::Url;

use crate::error::CommandError;

/// Argument of the `http_request` command.
#[derive(Debug, Clone, Deserialize)]
pub struct PassthroughRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, alias = "__token")]
    pub token: Option<String>,
}

/// Forwards unmapped operations to the REST backend.
#[derive(Clone)]
pub struct Passthrough {
    http: Client,
    backend_url: Option<Url>,
}

impl Passthrough {
    pub fn new(backend_url: Option<&str>) -> anyhow::Result<Self> {
        let backend_url = backend_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(Url::parse)
            .transpose()?;
        let http = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self { http, backend_url })
    }

    pub async fn send(&self, request: PassthroughRequest) -> Result<Value, CommandError> {
        let base = self.backend_url.as_ref().ok_or_else(|| {
            CommandError::Http(format!(
                "no backend configured for {} {}",
                request.method, request.url
            ))
        })?;
        let method: Method = request.method.parse().map_err(CommandError::Http)?;

        let mut url = base.clone();
        let prefix = base.path().trim_end_matches('/');
        url.set_path(&format!("{prefix}/{}", request.url.trim_start_matches('/')));

        let mut builder = self.http.request(method.into(), url);
        if let Some(token) = request.token.as_deref().filter(|t| !t.is_empty()) {
            builder = builder.bearer_auth(token);
        }
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(data) = request.data.filter(|data| !data.is_null()) {
            if method != Method::Get {
                builder = builder.json(&data);
            }
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CommandError::Http(format!("Request failed: {e}")))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| CommandError::Http(format!("Request failed: {e}")))?;

        if !status.is_success() {
            if let Ok(api) = serde_json::from_slice::<ApiError>(&body) {
                return Err(CommandError::Api(api));
            }
            return Err(CommandError::Http(format!(
                "HTTP {status} - {}",
                String::from_utf8_lossy(&body)
            )));
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned())))
    }
}

#[cfg(test)]
#[path = "tests/passthrough_tests.rs"]
mod tests;
