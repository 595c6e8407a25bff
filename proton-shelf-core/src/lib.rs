//! Shared domain model for the proton-shelf catalog engine.
//!
//! This crate is pure data and pure functions: the discovery/entry types that
//! flow between the source adapters, the resolver and the view model, plus
//! the name normalizer and the exec-command grammar. Everything that touches
//! the filesystem or the network lives in the higher crates.

pub mod exec;
pub mod ids;
pub mod normalize;
pub mod types;

pub use exec::{ExecShape, LaunchPlan, classify, launch_plan, tokenize, wrapped_windows_exe};
pub use ids::entry_id;
pub use normalize::{capitalize, is_generic_launcher_name, is_valid_candidate, normalize};
pub use types::{
    AntiCheatStatus, CatalogEntry, CatalogRecord, ControllerSupport, CoverSource, DetailRecord,
    DisplayFilter, Origin, Overlay, PlayStats, PreferenceParseError, RawDiscovery, Resolution,
    SortMethod, SourceCatalog, TimeDetail,
};
