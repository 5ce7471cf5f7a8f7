use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::error::ApiError;
use thiserror::Error;

/// Failure shaped like a response envelope, whichever transport produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("request failed with {status} {status_text}")]
pub struct DispatchError {
    pub status: u16,
    pub status_text: String,
    pub data: Value,
}

impl DispatchError {
    pub fn new(status: u16, status_text: impl Into<String>, data: Value) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            data,
        }
    }

    /// No response arrived (connection refused, DNS, timeout).
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(0, "Network Error", json!({ "message": message.into() }))
    }

    pub fn command_failed(raw: impl Into<String>) -> Self {
        Self::new(500, "Command Failed", Value::String(raw.into()))
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(400, "Bad Request", json!({ "message": message.into() }))
    }

    /// The structured service error carried in `data`, when there is one.
    pub fn api_error(&self) -> Option<ApiError> {
        match &self.data {
            Value::String(raw) => serde_json::from_str(raw).ok(),
            other => serde_json::from_value(other.clone()).ok(),
        }
    }

    pub fn message(&self) -> String {
        if let Some(api_error) = self.api_error() {
            return api_error.message;
        }
        match &self.data {
            Value::String(raw) => raw.clone(),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| self.status_text.clone()),
            _ => self.status_text.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session storage io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("unexpected response payload: {0}")]
    Decode(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("client setup failed: {0}")]
    Setup(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Dispatch(err) => Some(err.status),
            _ => None,
        }
    }
}
