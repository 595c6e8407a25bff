//! Installed-games discovery from a local Steam client.
//!
//! Reads the client's own on-disk state: `libraryfolders.vdf` for the set of
//! library roots, one `appmanifest_<appid>.acf` per installed app, and each
//! user's `localconfig.vdf` for playtime and last-played stamps.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use proton_shelf_core::types::{Origin, RawDiscovery};

use crate::error::SourceError;
use crate::vdf::{self, VdfValue};

/// Steam root candidates relative to the home directory, in probe order.
const ROOT_CANDIDATES: &[&str] = &[".steam/steam", ".local/share/Steam"];

/// Tooling appids that appear in manifests but are not games.
const APPID_BLACKLIST: &[u32] = &[
    228980,  // Steamworks Common Redistributables
    1070560, // Steam Linux Runtime 1.0 (scout)
    1391110, // Steam Linux Runtime 2.0 (soldier)
    1628350, // Steam Linux Runtime 3.0 (sniper)
    1161040, // Proton BattlEye Runtime
    1826330, // Proton EasyAntiCheat Runtime
];

/// Play stats for one appid, folded across all users on the machine.
#[derive(Debug, Clone, Copy, Default)]
struct UserStats {
    playtime_seconds: u64,
    last_played_epoch: i64,
}

struct ManifestGame {
    appid: u32,
    name: String,
    install_path: Option<PathBuf>,
}

/// Scans a Steam installation for installed games.
pub struct SteamScanner {
    root_override: Option<PathBuf>,
}

impl SteamScanner {
    pub fn new() -> Self {
        Self {
            root_override: None,
        }
    }

    /// Scan a fixed Steam root, skipping discovery. Test entry point.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root_override: Some(root.into()),
        }
    }

    fn steam_root(&self) -> Option<PathBuf> {
        if let Some(root) = &self.root_override {
            return root.is_dir().then(|| root.clone());
        }
        let home = dirs::home_dir()?;
        ROOT_CANDIDATES
            .iter()
            .map(|c| home.join(c))
            .find(|p| p.is_dir())
    }

    /// Collect one discovery per installed game, ordered by appid.
    pub fn scan(&self) -> Result<Vec<RawDiscovery>, SourceError> {
        let Some(root) = self.steam_root() else {
            return Err(SourceError::unavailable("no steam installation found"));
        };
        let stats = user_stats(&root);

        let mut discoveries = Vec::new();
        let mut seen = HashSet::new();
        for library in library_paths(&root) {
            let steamapps = library.join("steamapps");
            let Ok(entries) = std::fs::read_dir(&steamapps) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if !is_manifest_name(&path) {
                    continue;
                }
                let game = match read_manifest(&path, &steamapps) {
                    Ok(Some(game)) => game,
                    Ok(None) => continue,
                    Err(err) => {
                        warn!("skipping manifest {}: {err}", path.display());
                        continue;
                    }
                };
                if !seen.insert(game.appid) {
                    continue;
                }
                let appid = game.appid;
                discoveries.push(to_discovery(game, stats.get(&appid)));
            }
        }

        debug!("steam scan: {} installed games", discoveries.len());
        discoveries.sort_by_key(|d| d.origin_key.parse::<u32>().unwrap_or(u32::MAX));
        Ok(discoveries)
    }
}

impl Default for SteamScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn is_manifest_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("appmanifest_") && n.ends_with(".acf"))
}

fn to_discovery(game: ManifestGame, stats: Option<&UserStats>) -> RawDiscovery {
    let mut discovery = RawDiscovery::new(
        Origin::SteamInstalled,
        game.appid.to_string(),
        vec![
            "steam".to_string(),
            format!("steam://rungameid/{}", game.appid),
        ],
    );
    if !game.name.is_empty() {
        discovery = discovery.with_display_name(game.name);
    }
    if let Some(install) = game.install_path.filter(|p| p.is_dir()) {
        discovery = discovery.with_executable(install);
    }
    if let Some(stats) = stats {
        if stats.playtime_seconds > 0 {
            discovery.origin_playtime_seconds = Some(stats.playtime_seconds);
        }
        if stats.last_played_epoch > 0 {
            discovery.origin_last_launch_epoch = Some(stats.last_played_epoch);
        }
    }
    discovery
}

fn read_manifest(path: &Path, steamapps: &Path) -> Result<Option<ManifestGame>, SourceError> {
    let src = std::fs::read_to_string(path)?;
    let root = vdf::parse(&src);
    let Some(state) = root.get_table("AppState") else {
        return Err(SourceError::parse("manifest has no AppState block"));
    };
    let appid: u32 = state
        .get_str("appid")
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| SourceError::parse("manifest has no appid"))?;
    let name = state.get_str("name").unwrap_or_default().to_string();
    if is_tooling_app(appid, &name) {
        return Ok(None);
    }
    let install_path = state
        .get_str("installdir")
        .filter(|d| !d.is_empty())
        .map(|d| steamapps.join("common").join(d));
    Ok(Some(ManifestGame {
        appid,
        name,
        install_path,
    }))
}

/// Runtimes, redistributables and Proton builds share manifests with games;
/// filter them by id where stable and by name otherwise.
fn is_tooling_app(appid: u32, name: &str) -> bool {
    if APPID_BLACKLIST.contains(&appid) {
        return true;
    }
    let lower = name.to_lowercase();
    lower == "proton"
        || lower.starts_with("proton ")
        || lower.starts_with("steam linux runtime")
        || lower.starts_with("steamworks common")
}

/// The root itself plus every library listed in `libraryfolders.vdf`.
/// Handles both the block-per-folder format and the old flat one.
fn library_paths(root: &Path) -> Vec<PathBuf> {
    let mut paths = vec![root.to_path_buf()];
    let Ok(src) = std::fs::read_to_string(root.join("steamapps/libraryfolders.vdf")) else {
        return paths;
    };
    let parsed = vdf::parse(&src);
    let Some(folders) = parsed.get_table("libraryfolders") else {
        return paths;
    };
    for (key, value) in folders.entries() {
        if key.parse::<u32>().is_err() {
            continue;
        }
        let path = match value {
            VdfValue::Table(t) => t.get_str("path").map(PathBuf::from),
            VdfValue::Str(s) => Some(PathBuf::from(s)),
        };
        if let Some(path) = path {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    paths
}

fn user_stats(root: &Path) -> HashMap<u32, UserStats> {
    let mut stats = HashMap::new();
    let Ok(users) = std::fs::read_dir(root.join("userdata")) else {
        return stats;
    };
    for user in users.flatten() {
        let config = user.path().join("config/localconfig.vdf");
        let Ok(src) = std::fs::read_to_string(&config) else {
            continue;
        };
        merge_localconfig(&src, &mut stats);
    }
    stats
}

/// Fold one user's `localconfig.vdf` into the stats map. Across users the
/// larger playtime and the later launch win.
fn merge_localconfig(src: &str, stats: &mut HashMap<u32, UserStats>) {
    let root = vdf::parse(src);
    let Some(apps) = root
        .get_table("UserLocalConfigStore")
        .and_then(|t| t.walk(&["Software", "Valve", "Steam", "apps"]))
    else {
        return;
    };
    for (key, value) in apps.entries() {
        let Ok(appid) = key.parse::<u32>() else {
            continue;
        };
        let VdfValue::Table(app) = value else {
            continue;
        };
        // Playtime is stored in minutes, LastPlayed as a Unix epoch.
        let minutes: u64 = app
            .get_str("playtime")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let last: i64 = app
            .get_str("LastPlayed")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let entry = stats.entry(appid).or_default();
        entry.playtime_seconds = entry.playtime_seconds.max(minutes * 60);
        entry.last_played_epoch = entry.last_played_epoch.max(last);
    }
}
