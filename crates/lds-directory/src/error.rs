use thiserror::Error;

/// Errors from directory lifecycle and query operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory already initialized")]
    AlreadyInitialized,

    #[error("directory not ready: no store has been loaded")]
    NotReady,

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("load error: {0}")]
    Store(#[from] lds_store::StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A layer credential check failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials for layer {layer}")]
    InvalidCredentials { layer: String },
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;
