// crates/common/src/error.rs
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Sink write failed: {0}")]
    SinkWrite(String),

    #[error("Commit error: {0}")]
    Commit(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable tag used in logs and run summaries
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "configuration",
            Error::SourceUnavailable(_) => "source_unavailable",
            Error::SinkWrite(_) => "sink_write",
            Error::Commit(_) => "commit",
            Error::Storage(_) => "storage",
            Error::Io(_) => "io",
            Error::Serialization(_) => "serialization",
            Error::Internal(_) => "internal",
        }
    }

    /// Process exit status for a run that failed with this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Configuration(_) => 2,
            Error::SourceUnavailable(_) => 3,
            Error::SinkWrite(_) => 4,
            Error::Commit(_) => 5,
            _ => 1,
        }
    }
}
