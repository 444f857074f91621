use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetcherError {
    #[error("invalid source directory: {0}")]
    InvalidSource(String),

    #[error("failed to decode {file}: {source}")]
    Decode {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FetcherError>;
