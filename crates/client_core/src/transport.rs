use std::{collections::BTreeMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::error;
use url::Url;

use crate::{
    command_mapper::CommandMapper,
    envelope::{Envelope, TransportFailure, TransportResponse},
    error::{ClientError, DispatchError},
    types::{Method, Operation},
};

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Executes one operation. Implementations never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        operation: &Operation,
        token: Option<&str>,
    ) -> Result<TransportResponse, TransportFailure>;
}

/// Host side of the local bridge: runs a named command with JSON arguments.
#[async_trait]
pub trait CommandInvoker: Send + Sync {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, String>;
}

pub struct HttpTransport {
    http: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Setup(format!("invalid server url '{base_url}': {e}")))?;
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Setup(format!("http client: {e}")))?;
        Ok(Self { http, base_url })
    }

    fn url_for(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let prefix = self.base_url.path().trim_end_matches('/');
        url.set_path(&format!("{prefix}/{}", path.trim_start_matches('/')));
        url.set_query(None);
        url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        operation: &Operation,
        token: Option<&str>,
    ) -> Result<TransportResponse, TransportFailure> {
        let (path, params) = operation.split();
        let url = self.url_for(path);

        let mut request = self.http.request(operation.method.into(), url);
        if !params.is_empty() {
            request = request.query(&params);
        }
        if let Some(token) = token.filter(|token| !token.is_empty()) {
            request = request.bearer_auth(token);
        }
        if operation.method != Method::Get {
            if let Some(data) = &operation.options.data {
                request = request.json(data);
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportFailure::Dispatch(DispatchError::network(e.to_string())))?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportFailure::Dispatch(DispatchError::network(e.to_string())))?;
        let data = decode_body(&bytes);

        if !status.is_success() {
            return Err(TransportFailure::Dispatch(DispatchError::new(
                status.as_u16(),
                status_text,
                data,
            )));
        }

        Ok(TransportResponse::Envelope(Envelope {
            data,
            status: status.as_u16(),
            status_text,
            headers,
        }))
    }
}

fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

pub struct BridgeTransport {
    mapper: Arc<CommandMapper>,
    invoker: Arc<dyn CommandInvoker>,
}

impl BridgeTransport {
    pub fn new(mapper: Arc<CommandMapper>, invoker: Arc<dyn CommandInvoker>) -> Self {
        Self { mapper, invoker }
    }
}

#[async_trait]
impl Transport for BridgeTransport {
    async fn execute(
        &self,
        operation: &Operation,
        token: Option<&str>,
    ) -> Result<TransportResponse, TransportFailure> {
        let Some(call) = self.mapper.resolve(operation, token) else {
            let raw = format!("no command bound to {} {}", operation.method, operation.path);
            error!(method = %operation.method, path = %operation.path, "unmapped local route");
            return Err(TransportFailure::Command(raw));
        };

        match self.invoker.invoke(call.command, call.args).await {
            Ok(payload) => Ok(TransportResponse::Payload(payload)),
            Err(raw) => {
                error!(
                    command = call.command,
                    method = %operation.method,
                    path = %operation.path,
                    error = %raw,
                    "local command failed"
                );
                Err(TransportFailure::Command(raw))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
