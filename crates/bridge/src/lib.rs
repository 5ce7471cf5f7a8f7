//! In-process command host for local-bridge sessions: the named commands a
//! desktop shell exposes, answered from the same service layer as the REST
//! server, plus the `http_request` pass-through.

pub mod config;
pub mod error;
pub mod host;
pub mod passthrough;

pub use config::BridgeConfig;
pub use error::CommandError;
pub use host::CommandHost;
pub use passthrough::{Passthrough, PassthroughRequest};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
