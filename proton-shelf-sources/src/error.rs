use proton_shelf_lib::StoreError;
use thiserror::Error;

/// Errors raised by the discovery adapters.
///
/// The aggregator recovers from all of these: a failing adapter logs and
/// contributes an empty list, it never fails the scan.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Subprocess failed: {0}")]
    Subprocess(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl SourceError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn subprocess(msg: impl Into<String>) -> Self {
        Self::Subprocess(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
