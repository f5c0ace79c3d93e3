use thiserror::Error;

/// Failures raised by the script storage collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Script store unavailable: {0}")]
    Unavailable(String),

    #[error("Script catalog is malformed: {0}")]
    Malformed(String),
}

/// Failure reported by the local script executor. The message is surfaced
/// to the user verbatim behind a fixed prefix.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct ExecutorError(pub String);

impl ExecutorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
