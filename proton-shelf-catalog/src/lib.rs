//! External catalog access: the Steam app index and per-app details, Epic
//! Games Store descriptions and the community anti-cheat registry.
//!
//! Every fetch goes through the shared downloader and lands in the TTL disk
//! cache, so a warm cache makes all paths here network-free and the cache
//! directory doubles as the test seam.

pub mod anticheat;
pub mod egs;
pub mod error;
pub mod index;
pub mod steam;

pub use anticheat::{AntiCheatCatalog, AntiCheatRegistry};
pub use egs::EgsCatalog;
pub use error::CatalogError;
pub use index::NameIndex;
pub use steam::{SteamCatalog, SteamDetail};
