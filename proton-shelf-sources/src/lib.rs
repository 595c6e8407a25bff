//! Game discovery adapters.
//!
//! Each adapter inspects one installation source and reports what it finds
//! as [`RawDiscovery`](proton_shelf_core::RawDiscovery) values:
//!
//! - PortProton desktop shortcuts
//! - Installed Steam games (appmanifest + localconfig)
//! - Epic Games Store installs (via the `legendary` CLI)
//!
//! Supporting modules parse the formats the adapters meet along the way:
//! Valve's VDF text format and the version resource of Windows executables.

pub mod desktop;
pub mod epic;
pub mod error;
pub mod probe;
pub mod steam;
pub mod vdf;

pub use desktop::DesktopShortcutScanner;
pub use epic::{EpicGameRecord, EpicScanner};
pub use error::SourceError;
pub use probe::{probe_exe, ExeMetadata};
pub use steam::SteamScanner;
