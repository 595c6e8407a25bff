use proton_shelf_catalog::CatalogError;
use proton_shelf_lib::StoreError;
use proton_shelf_sources::SourceError;
use thiserror::Error;

/// Top-level engine errors.
///
/// Per-entry failures during a rescan never surface here; they are logged
/// and degrade the affected entry. What does surface is broken engine
/// plumbing (preferences file unwritable, unknown entry ids, commands the
/// exec grammar rejects).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("no entry with id {0}")]
    NotFound(String),

    #[error("Invalid launch command: {0}")]
    InvalidCommand(String),
}

impl EngineError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn invalid_command(msg: impl Into<String>) -> Self {
        Self::InvalidCommand(msg.into())
    }
}
