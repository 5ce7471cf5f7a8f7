use shared::error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("invalid arguments for {command}: {message}")]
    InvalidArgs {
        command: &'static str,
        message: String,
    },
    #[error("unknown command {0}")]
    UnknownCommand(String),
    #[error("{0}")]
    Http(String),
}

impl CommandError {
    pub fn invalid_args(command: &'static str, err: serde_json::Error) -> Self {
        Self::InvalidArgs {
            command,
            message: err.to_string(),
        }
    }

    /// Service errors cross the bridge as their JSON form so the client can
    /// recover the code; everything else as plain text.
    pub fn into_wire(self) -> String {
        match self {
            Self::Api(api) => serde_json::to_string(&api).unwrap_or(api.message),
            other => other.to_string(),
        }
    }
}
