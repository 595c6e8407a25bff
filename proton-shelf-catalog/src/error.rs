use proton_shelf_lib::StoreError;
use thiserror::Error;

/// Errors raised while loading or querying external catalogs.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Malformed catalog payload: {0}")]
    Malformed(String),
}

impl CatalogError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}
