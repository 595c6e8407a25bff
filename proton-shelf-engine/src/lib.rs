//! Scan orchestration and the presentation-facing engine facade.
//!
//! - [`resolver`] — turns raw discoveries into catalog-backed metadata.
//! - [`aggregator`] — runs adapters and resolution, publishes entry lists.
//! - [`view_model`] — filters and sorts entries into render-ready cards.
//! - [`engine`] — the owned facade a presentation layer drives.
//!
//! The engine never renders and never blocks on the presentation layer;
//! everything it reports flows through snapshots and scan events.

pub mod aggregator;
pub mod engine;
pub mod error;
pub mod resolver;
pub mod view_model;

pub use aggregator::{Aggregator, ScanEvent};
pub use engine::Engine;
pub use error::EngineError;
pub use resolver::{ResolvedMetadata, Resolver};
pub use view_model::{CardDescriptor, Snapshot, build_snapshot};
