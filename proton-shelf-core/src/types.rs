//! Core record types shared across the engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::normalize::normalize;

/// Where a discovery record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// A launcher shortcut file in the wrapper's shortcut directory.
    DesktopShortcut,
    /// A title installed through the native Steam client.
    SteamInstalled,
    /// A title installed through the Epic Games Store (via the legendary CLI).
    EpicInstalled,
}

impl Origin {
    /// Stable slug used in entry fingerprints and log lines.
    pub fn slug(&self) -> &'static str {
        match self {
            Origin::DesktopShortcut => "desktop-shortcut",
            Origin::SteamInstalled => "steam-installed",
            Origin::EpicInstalled => "epic-installed",
        }
    }

    /// Short badge label shown on library cards.
    pub fn badge(&self) -> &'static str {
        match self {
            Origin::DesktopShortcut => "portproton",
            Origin::SteamInstalled => "steam",
            Origin::EpicInstalled => "epic",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// An external catalog the resolver can match a discovery against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceCatalog {
    Steam,
    Egs,
    AntiCheat,
}

impl SourceCatalog {
    pub fn slug(&self) -> &'static str {
        match self {
            SourceCatalog::Steam => "steam",
            SourceCatalog::Egs => "egs",
            SourceCatalog::AntiCheat => "anticheat",
        }
    }
}

impl std::fmt::Display for SourceCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// Controller-support hint reported by the Steam store details endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControllerSupport {
    Full,
    Partial,
    None,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ControllerSupport {
    /// Map the raw `controller_support` field from the store API.
    pub fn from_steam_field(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("full") => ControllerSupport::Full,
            Some(v) if v.eq_ignore_ascii_case("partial") => ControllerSupport::Partial,
            Some(v) if v.eq_ignore_ascii_case("none") => ControllerSupport::None,
            Some(_) => ControllerSupport::Unknown,
            None => ControllerSupport::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerSupport::Full => "full",
            ControllerSupport::Partial => "partial",
            ControllerSupport::None => "none",
            ControllerSupport::Unknown => "unknown",
        }
    }
}

/// Compatibility verdict from the community anti-cheat registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AntiCheatStatus {
    Supported,
    Running,
    Planned,
    Broken,
    Denied,
    #[default]
    #[serde(other)]
    Unknown,
}

impl AntiCheatStatus {
    /// Ordinal rank used by the anti-cheat sort; higher is better.
    pub fn rank(&self) -> u8 {
        match self {
            AntiCheatStatus::Supported => 5,
            AntiCheatStatus::Running => 4,
            AntiCheatStatus::Planned => 3,
            AntiCheatStatus::Broken => 2,
            AntiCheatStatus::Denied => 1,
            AntiCheatStatus::Unknown => 0,
        }
    }

    /// Parse a status label as found in the registry JSON ("Supported", "Denied", ...).
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "supported" => AntiCheatStatus::Supported,
            "running" => AntiCheatStatus::Running,
            "planned" => AntiCheatStatus::Planned,
            "broken" => AntiCheatStatus::Broken,
            "denied" => AntiCheatStatus::Denied,
            _ => AntiCheatStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AntiCheatStatus::Supported => "supported",
            AntiCheatStatus::Running => "running",
            AntiCheatStatus::Planned => "planned",
            AntiCheatStatus::Broken => "broken",
            AntiCheatStatus::Denied => "denied",
            AntiCheatStatus::Unknown => "unknown",
        }
    }
}

/// One raw discovery produced by a source adapter, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDiscovery {
    pub origin: Origin,
    /// Origin-unique identifier: shortcut path, Steam appid, Epic app name.
    pub origin_key: String,
    /// Tokenized argv the presentation layer must run to start the game.
    pub exec_command: Vec<String>,
    pub display_name_hint: Option<String>,
    pub icon_hint: Option<String>,
    pub executable_path_hint: Option<PathBuf>,
    /// Play time already tracked by the origin itself (Steam local config).
    pub origin_playtime_seconds: Option<u64>,
    pub origin_last_launch_epoch: Option<i64>,
}

impl RawDiscovery {
    pub fn new(origin: Origin, origin_key: impl Into<String>, exec_command: Vec<String>) -> Self {
        Self {
            origin,
            origin_key: origin_key.into(),
            exec_command,
            display_name_hint: None,
            icon_hint: None,
            executable_path_hint: None,
            origin_playtime_seconds: None,
            origin_last_launch_epoch: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name_hint = Some(name.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon_hint = Some(icon.into());
        self
    }

    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable_path_hint = Some(path.into());
        self
    }

    /// Executable basename without extension; keys overlays and play stats.
    pub fn exe_basename(&self) -> Option<String> {
        let path = self.executable_path_hint.as_ref()?;
        path.file_stem().map(|s| s.to_string_lossy().into_owned())
    }
}

/// One entry of an external catalog, as stored in the catalog index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub catalog: SourceCatalog,
    /// Stable identifier within that catalog (appid as decimal string, or slug).
    pub catalog_id: String,
    pub display_name: String,
    /// `normalize(display_name)` — the lookup key.
    pub normalized_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_catalog_id: Option<String>,
}

impl CatalogRecord {
    pub fn new(
        catalog: SourceCatalog,
        catalog_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        let display_name = display_name.into();
        let normalized_name = normalize(&display_name);
        Self {
            catalog,
            catalog_id: catalog_id.into(),
            display_name,
            normalized_name,
            parent_catalog_id: None,
        }
    }
}

/// Detail metadata materialized for one catalog id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub description: String,
    /// Canonical cover-art URL for the catalog id.
    pub cover_url: String,
    #[serde(default)]
    pub controller_support: ControllerSupport,
    #[serde(default)]
    pub anti_cheat_status: AntiCheatStatus,
    /// Epoch seconds at materialization time; expiry is by age only.
    pub fetched_at: i64,
}

impl Default for DetailRecord {
    fn default() -> Self {
        Self {
            description: String::new(),
            cover_url: String::new(),
            controller_support: ControllerSupport::Unknown,
            anti_cheat_status: AntiCheatStatus::Unknown,
            fetched_at: 0,
        }
    }
}

/// User override files for one executable basename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overlay {
    pub cover_path: Option<PathBuf>,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

impl Overlay {
    pub fn is_empty(&self) -> bool {
        self.cover_path.is_none() && self.display_name.is_none() && self.description.is_none()
    }
}

/// Accumulated play statistics for one entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayStats {
    pub total_seconds: u64,
    /// Epoch seconds of the most recent launch, or 0 when never launched.
    pub last_launch_epoch: i64,
}

/// Outcome of resolving one discovery against the external catalogs.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved {
        catalog: SourceCatalog,
        catalog_id: String,
        detail: DetailRecord,
    },
    Unresolved {
        reason: String,
    },
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }

    pub fn catalog_id(&self) -> Option<&str> {
        match self {
            Resolution::Resolved { catalog_id, .. } => Some(catalog_id),
            Resolution::Unresolved { .. } => None,
        }
    }
}

/// Where a card's cover art comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverSource {
    /// A file already on disk (overlay cover or cached download).
    Local(PathBuf),
    /// A remote URL the presentation layer may fetch or display lazily.
    Url(String),
    /// No art known; the presentation layer draws its own placeholder.
    Placeholder,
}

/// The engine's output unit: one fully enriched library entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    /// Stable fingerprint of (origin, origin-key); survives rescans.
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub cover: CoverSource,
    pub controller_support: ControllerSupport,
    pub anti_cheat_status: AntiCheatStatus,
    pub exec_command: Vec<String>,
    pub origin: Origin,
    pub origin_key: String,
    /// Wrapped Windows executable, when the origin exposes one.
    pub executable: Option<PathBuf>,
    pub play_stats: PlayStats,
    pub is_favorite: bool,
    pub resolution: Resolution,
}

impl CatalogEntry {
    /// Executable basename without extension; keys overlays and play stats.
    pub fn exe_basename(&self) -> Option<String> {
        let path = self.executable.as_ref()?;
        path.file_stem().map(|s| s.to_string_lossy().into_owned())
    }

    /// Key for the play-stats files. Entries without a known executable
    /// (Epic installs launch through their store CLI) fall back to the
    /// origin key so launches still persist.
    pub fn stats_key(&self) -> String {
        self.exe_basename()
            .unwrap_or_else(|| self.origin_key.clone())
    }
}

/// Raised when a preference string does not name a known value.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct PreferenceParseError {
    pub kind: &'static str,
    pub value: String,
}

/// Library ordering choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMethod {
    #[default]
    LastLaunch,
    PlayTime,
    Name,
    AntiCheat,
}

impl SortMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMethod::LastLaunch => "last-launch",
            SortMethod::PlayTime => "play-time",
            SortMethod::Name => "name",
            SortMethod::AntiCheat => "anti-cheat",
        }
    }
}

impl FromStr for SortMethod {
    type Err = PreferenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "last-launch" => Ok(SortMethod::LastLaunch),
            "play-time" | "playtime" => Ok(SortMethod::PlayTime),
            "name" => Ok(SortMethod::Name),
            "anti-cheat" | "anticheat" => Ok(SortMethod::AntiCheat),
            _ => Err(PreferenceParseError {
                kind: "sort method",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for SortMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Library filtering choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayFilter {
    #[default]
    All,
    Favorites,
    Compatible,
}

impl DisplayFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayFilter::All => "all",
            DisplayFilter::Favorites => "favorites",
            DisplayFilter::Compatible => "compatible",
        }
    }
}

impl FromStr for DisplayFilter {
    type Err = PreferenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(DisplayFilter::All),
            "favorites" => Ok(DisplayFilter::Favorites),
            "compatible" => Ok(DisplayFilter::Compatible),
            _ => Err(PreferenceParseError {
                kind: "display filter",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for DisplayFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How verbose the presentation layer renders play-time and last-launch text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeDetail {
    Brief,
    #[default]
    Detailed,
}

impl TimeDetail {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeDetail::Brief => "brief",
            TimeDetail::Detailed => "detailed",
        }
    }
}

impl FromStr for TimeDetail {
    type Err = PreferenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brief" => Ok(TimeDetail::Brief),
            "detailed" => Ok(TimeDetail::Detailed),
            _ => Err(PreferenceParseError {
                kind: "time detail",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for TimeDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anti_cheat_rank_orders_statuses() {
        let ordered = [
            AntiCheatStatus::Supported,
            AntiCheatStatus::Running,
            AntiCheatStatus::Planned,
            AntiCheatStatus::Broken,
            AntiCheatStatus::Denied,
            AntiCheatStatus::Unknown,
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0].rank() > pair[1].rank(), "{pair:?}");
        }
    }

    #[test]
    fn anti_cheat_from_registry_labels() {
        assert_eq!(AntiCheatStatus::from_label("Supported"), AntiCheatStatus::Supported);
        assert_eq!(AntiCheatStatus::from_label("denied"), AntiCheatStatus::Denied);
        assert_eq!(AntiCheatStatus::from_label("wat"), AntiCheatStatus::Unknown);
    }

    #[test]
    fn controller_support_from_steam_field() {
        assert_eq!(ControllerSupport::from_steam_field(Some("full")), ControllerSupport::Full);
        assert_eq!(
            ControllerSupport::from_steam_field(Some("Partial")),
            ControllerSupport::Partial
        );
        assert_eq!(ControllerSupport::from_steam_field(None), ControllerSupport::Unknown);
    }

    #[test]
    fn catalog_record_normalizes_on_construction() {
        let record = CatalogRecord::new(SourceCatalog::Steam, "292030", "The Witcher® 3: Wild Hunt");
        assert_eq!(record.normalized_name, "the witcher 3 wild hunt");
    }

    #[test]
    fn sort_method_round_trips_through_strings() {
        for method in [
            SortMethod::LastLaunch,
            SortMethod::PlayTime,
            SortMethod::Name,
            SortMethod::AntiCheat,
        ] {
            assert_eq!(method.as_str().parse::<SortMethod>().unwrap(), method);
        }
        assert!("alphabetical".parse::<SortMethod>().is_err());
    }

    #[test]
    fn exe_basename_strips_extension() {
        let raw = RawDiscovery::new(Origin::DesktopShortcut, "k", vec![])
            .with_executable("/games/hl2/hl2.exe");
        assert_eq!(raw.exe_basename().as_deref(), Some("hl2"));
    }
}
