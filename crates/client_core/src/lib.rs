pub mod api;
pub mod command_mapper;
pub mod comments;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;

pub use api::BlogClient;
pub use command_mapper::{CommandCall, CommandMapper, FALLBACK_COMMAND};
pub use comments::{build_comment_tree, CommentBoard, CommentNode, LikeError};
pub use dispatcher::Dispatcher;
pub use envelope::{normalize, Envelope, TransportFailure, TransportResponse};
pub use error::{ClientError, DispatchError, StoreError};
pub use session::SessionContext;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use transport::{BridgeTransport, CommandInvoker, HttpTransport, Transport};
pub use types::{Environment, Method, Operation, RequestOptions};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
