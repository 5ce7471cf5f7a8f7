use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::DispatchError;

/// Uniform response shape handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub data: Value,
    pub status: u16,
    pub status_text: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Envelope {
    /// Success envelope for payloads that came back without HTTP metadata.
    pub fn synthesized(data: Value) -> Self {
        Self {
            data,
            status: 200,
            status_text: "OK".to_string(),
            headers: BTreeMap::new(),
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }
}

/// What a transport hands back before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportResponse {
    /// A full HTTP response.
    Envelope(Envelope),
    /// A bare command result.
    Payload(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportFailure {
    /// Already envelope-shaped (HTTP status or connection failure).
    Dispatch(DispatchError),
    /// Raw error string from a local command.
    Command(String),
}

pub fn normalize(
    result: Result<TransportResponse, TransportFailure>,
) -> Result<Envelope, DispatchError> {
    match result {
        Ok(TransportResponse::Envelope(envelope)) => Ok(envelope),
        Ok(TransportResponse::Payload(data)) => Ok(Envelope::synthesized(data)),
        Err(TransportFailure::Dispatch(err)) => Err(err),
        Err(TransportFailure::Command(raw)) => Err(DispatchError::command_failed(raw)),
    }
}

#[cfg(test)]
#[path = "tests/envelope_tests.rs"]
mod tests;
