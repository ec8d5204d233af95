use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage initialization error: {0}")]
    StorageInit(#[source] sqlx::Error),

    #[error("Storage write error: {0}")]
    StorageWrite(#[source] sqlx::Error),

    #[error("Storage read error: {0}")]
    StorageRead(#[source] sqlx::Error),

    #[error("Request parse error: {0}")]
    RequestParse(#[source] serde_json::Error),

    #[error("{0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
