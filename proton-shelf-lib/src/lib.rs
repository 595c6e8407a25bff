//! Shared services for the proton-shelf engine: user directories, the
//! preferences file, the TTL-governed disk cache, bounded HTTP transfer,
//! overlay overrides and play statistics.
//!
//! Everything here is presentation-agnostic; both the CLI and any GUI
//! frontend go through these types so on-disk state stays consistent.

pub mod cache;
pub mod config;
pub mod download;
pub mod error;
pub mod overlay;
pub mod paths;
pub mod playstats;

pub use cache::Cache;
pub use config::{ConfigStore, ProxySettings};
pub use download::{Downloader, TransferEvent};
pub use error::StoreError;
pub use overlay::OverlayStore;
pub use paths::AppDirs;
pub use playstats::PlayStatsStore;
