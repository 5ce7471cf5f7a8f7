use std::sync::Arc;

use serde_json::Value;

use crate::{
    command_mapper::CommandMapper,
    envelope::{normalize, Envelope},
    error::{ClientError, DispatchError},
    session::SessionContext,
    transport::{BridgeTransport, CommandInvoker, HttpTransport, Transport},
    types::{Method, Operation, RequestOptions},
};

/// Sends every logical operation through the transport picked for the session.
#[derive(Clone)]
pub struct Dispatcher {
    session: SessionContext,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn with_transport(session: SessionContext, transport: Arc<dyn Transport>) -> Self {
        Self { session, transport }
    }

    /// Picks HTTP or the local bridge from the session's environment.
    pub fn connect(
        session: SessionContext,
        server_url: &str,
        invoker: Option<Arc<dyn CommandInvoker>>,
    ) -> Result<Self, ClientError> {
        let transport: Arc<dyn Transport> = if session.is_local_environment() {
            let invoker = invoker.ok_or_else(|| {
                ClientError::Setup("local-bridge session needs a command invoker".into())
            })?;
            Arc::new(BridgeTransport::new(
                Arc::new(CommandMapper::standard()),
                invoker,
            ))
        } else {
            Arc::new(HttpTransport::new(server_url)?)
        };
        Ok(Self::with_transport(session, transport))
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub async fn dispatch(
        &self,
        method: Method,
        path: &str,
        options: Option<RequestOptions>,
    ) -> Result<Envelope, DispatchError> {
        if path.trim().is_empty() {
            return Err(DispatchError::invalid_request("request path must not be empty"));
        }
        let operation = Operation {
            method,
            path: path.to_string(),
            options: options.unwrap_or_default(),
        };
        let token = self.session.token().await;
        normalize(self.transport.execute(&operation, token.as_deref()).await)
    }

    pub async fn get(
        &self,
        path: &str,
        options: Option<RequestOptions>,
    ) -> Result<Envelope, DispatchError> {
        self.dispatch(Method::Get, path, options).await
    }

    pub async fn post(&self, path: &str, data: Value) -> Result<Envelope, DispatchError> {
        self.dispatch(Method::Post, path, Some(RequestOptions::default().with_data(data)))
            .await
    }

    pub async fn put(&self, path: &str, data: Value) -> Result<Envelope, DispatchError> {
        self.dispatch(Method::Put, path, Some(RequestOptions::default().with_data(data)))
            .await
    }

    pub async fn patch(&self, path: &str, data: Value) -> Result<Envelope, DispatchError> {
        self.dispatch(Method::Patch, path, Some(RequestOptions::default().with_data(data)))
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<Envelope, DispatchError> {
        self.dispatch(Method::Delete, path, None).await
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
