//! Scan orchestration: adapters in, published entry list out.
//!
//! A rescan runs the three discovery adapters concurrently, resolves every
//! raw record through a bounded fan-out, merges overlays and play stats,
//! and hands back one deterministically ordered list. Adapter and resolver
//! failures degrade individual entries; they never abort the scan.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::{StreamExt, stream};
use log::{debug, info, warn};
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

use proton_shelf_core::{
    CatalogEntry, CoverSource, Origin, PlayStats, RawDiscovery, entry_id,
};
use proton_shelf_lib::{AppDirs, Cache, ConfigStore, Downloader, OverlayStore, PlayStatsStore};
use proton_shelf_sources::{DesktopShortcutScanner, EpicScanner, SteamScanner};

use crate::resolver::{ResolvedMetadata, Resolver};

/// Width of the resolver fan-out.
const RESOLVE_FANOUT: usize = 4;

/// Progress reports emitted while a rescan runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    AdapterStarted { origin: Origin },
    AdapterFinished { origin: Origin, discovered: usize },
    /// Resolver progress; `done == total` when the last task finishes.
    Resolving { done: usize, total: usize },
    /// Terminal event of a publishing rescan.
    Published { total: usize },
}

/// Owns the scan pipeline from adapters through the published list.
pub struct Aggregator {
    cache: Cache,
    downloader: Arc<Downloader>,
    config: Arc<ConfigStore>,
    overlays: OverlayStore,
    stats: PlayStatsStore,
    images_dir: PathBuf,
    desktop: DesktopShortcutScanner,
    steam: SteamScanner,
    epic: EpicScanner,
    /// Serializes rescans; a new scan waits for the previous publish.
    scan_lock: Mutex<()>,
}

impl Aggregator {
    pub fn new(
        dirs: &AppDirs,
        cache: Cache,
        downloader: Arc<Downloader>,
        config: Arc<ConfigStore>,
        desktop: DesktopShortcutScanner,
        steam: SteamScanner,
        epic: EpicScanner,
    ) -> Self {
        Self {
            cache,
            downloader,
            config,
            overlays: OverlayStore::new(dirs.custom_data_dir()),
            stats: PlayStatsStore::new(dirs.cache_root()),
            images_dir: dirs.images_dir(),
            desktop,
            steam,
            epic,
            scan_lock: Mutex::new(()),
        }
    }

    /// Run a full scan. Returns `None` when the cancel flag was raised;
    /// cancelled scans publish nothing.
    pub async fn rescan(
        &self,
        events: UnboundedSender<ScanEvent>,
        cancel: Arc<AtomicBool>,
    ) -> Option<Vec<CatalogEntry>> {
        let _guard = self.scan_lock.lock().await;
        if cancel.load(Ordering::Relaxed) {
            return None;
        }

        let discovered = self.run_adapters(&events, &cancel).await;
        if cancel.load(Ordering::Relaxed) {
            return None;
        }

        let merged = merge_discoveries(discovered);
        let total = merged.len();
        info!("discovered {total} entries across adapters");
        let _ = events.send(ScanEvent::Resolving { done: 0, total });

        let resolver = Resolver::prepare(
            self.cache.clone(),
            Arc::clone(&self.downloader),
            self.images_dir.clone(),
            self.config.language(),
        )
        .await;

        let resolver_ref = &resolver;
        let done = AtomicUsize::new(0);
        let done_ref = &done;
        let resolved: Vec<Option<(RawDiscovery, ResolvedMetadata)>> = stream::iter(merged)
            .map(|raw| {
                let events = events.clone();
                let cancel = Arc::clone(&cancel);
                async move {
                    if cancel.load(Ordering::Relaxed) {
                        return None;
                    }
                    let metadata = resolver_ref.resolve(&raw).await;
                    let finished = done_ref.fetch_add(1, Ordering::Relaxed) + 1;
                    let _ = events.send(ScanEvent::Resolving { done: finished, total });
                    Some((raw, metadata))
                }
            })
            .buffer_unordered(RESOLVE_FANOUT)
            .collect()
            .await;

        if cancel.load(Ordering::Relaxed) {
            debug!("rescan cancelled; discarding partial results");
            return None;
        }

        let entries = self.assemble(resolved.into_iter().flatten().collect());
        let _ = events.send(ScanEvent::Published { total: entries.len() });
        Some(entries)
    }

    async fn run_adapters(
        &self,
        events: &UnboundedSender<ScanEvent>,
        cancel: &Arc<AtomicBool>,
    ) -> Vec<RawDiscovery> {
        let desktop = async {
            if cancel.load(Ordering::Relaxed) {
                return Vec::new();
            }
            let _ = events.send(ScanEvent::AdapterStarted {
                origin: Origin::DesktopShortcut,
            });
            let found = match self.desktop.scan() {
                Ok(found) => found,
                Err(err) => {
                    warn!("desktop shortcut scan failed: {err}");
                    Vec::new()
                }
            };
            let _ = events.send(ScanEvent::AdapterFinished {
                origin: Origin::DesktopShortcut,
                discovered: found.len(),
            });
            found
        };

        let steam = async {
            if cancel.load(Ordering::Relaxed) {
                return Vec::new();
            }
            let _ = events.send(ScanEvent::AdapterStarted {
                origin: Origin::SteamInstalled,
            });
            let found = match self.steam.scan() {
                Ok(found) => found,
                Err(err) => {
                    warn!("steam library scan failed: {err}");
                    Vec::new()
                }
            };
            let _ = events.send(ScanEvent::AdapterFinished {
                origin: Origin::SteamInstalled,
                discovered: found.len(),
            });
            found
        };

        let epic = async {
            if cancel.load(Ordering::Relaxed) {
                return Vec::new();
            }
            let _ = events.send(ScanEvent::AdapterStarted {
                origin: Origin::EpicInstalled,
            });
            let found = match self.epic.scan().await {
                Ok(found) => found,
                Err(err) => {
                    warn!("epic library scan failed: {err}");
                    Vec::new()
                }
            };
            let _ = events.send(ScanEvent::AdapterFinished {
                origin: Origin::EpicInstalled,
                discovered: found.len(),
            });
            found
        };

        let (mut all, from_steam, from_epic) = tokio::join!(desktop, steam, epic);
        all.extend(from_steam);
        all.extend(from_epic);
        all
    }

    /// Overlay merge, play stats, favorites, deterministic order.
    fn assemble(&self, resolved: Vec<(RawDiscovery, ResolvedMetadata)>) -> Vec<CatalogEntry> {
        let favorites: HashSet<String> = self.config.favorites().into_iter().collect();
        let playtime = self.stats.load_playtime();
        let last_launch = self.stats.load_last_launch();

        let mut entries = Vec::with_capacity(resolved.len());
        for (raw, metadata) in resolved {
            let overlay = raw
                .exe_basename()
                .map(|basename| self.overlays.load(&basename))
                .unwrap_or_default();
            let stats_key = raw
                .exe_basename()
                .unwrap_or_else(|| raw.origin_key.clone());
            let play_stats = attach_stats(&playtime, &last_launch, &raw, &stats_key);
            let id = entry_id(raw.origin, &raw.origin_key);
            let is_favorite = favorites.contains(&id);

            entries.push(CatalogEntry {
                id,
                display_name: overlay.display_name.unwrap_or(metadata.display_name),
                description: overlay.description.unwrap_or(metadata.description),
                cover: overlay
                    .cover_path
                    .map(CoverSource::Local)
                    .unwrap_or(metadata.cover),
                controller_support: metadata.controller_support,
                anti_cheat_status: metadata.anti_cheat_status,
                exec_command: raw.exec_command,
                origin: raw.origin,
                origin_key: raw.origin_key,
                executable: raw.executable_path_hint,
                play_stats,
                is_favorite,
                resolution: metadata.resolution,
            });
        }
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }
}

/// Collapse duplicate `(origin, origin-key)` discoveries, last one wins.
/// First-seen positions are kept so the merge is order-stable; records from
/// different origins never collapse into each other.
fn merge_discoveries(found: Vec<RawDiscovery>) -> Vec<RawDiscovery> {
    let mut positions: HashMap<(Origin, String), usize> = HashMap::new();
    let mut merged: Vec<RawDiscovery> = Vec::new();
    for raw in found {
        let key = (raw.origin, raw.origin_key.clone());
        match positions.get(&key) {
            Some(&index) => merged[index] = raw,
            None => {
                positions.insert(key, merged.len());
                merged.push(raw);
            }
        }
    }
    merged
}

/// Local stat files are authoritative; origin-reported numbers only fill
/// fields the local files have nothing for.
fn attach_stats(
    playtime: &HashMap<String, u64>,
    last_launch: &HashMap<String, i64>,
    raw: &RawDiscovery,
    stats_key: &str,
) -> PlayStats {
    let mut stats = PlayStats {
        total_seconds: playtime.get(stats_key).copied().unwrap_or(0),
        last_launch_epoch: last_launch.get(stats_key).copied().unwrap_or(0),
    };
    if stats.total_seconds == 0 {
        if let Some(seconds) = raw.origin_playtime_seconds {
            stats.total_seconds = seconds;
        }
    }
    if stats.last_launch_epoch == 0 {
        if let Some(epoch) = raw.origin_last_launch_epoch {
            stats.last_launch_epoch = epoch;
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(origin: Origin, key: &str, name: &str) -> RawDiscovery {
        RawDiscovery::new(origin, key, vec!["wine".into(), format!("{key}.exe")])
            .with_display_name(name)
    }

    #[test]
    fn merge_keeps_last_record_per_origin_key() {
        let merged = merge_discoveries(vec![
            raw(Origin::DesktopShortcut, "hl2.desktop", "stale name"),
            raw(Origin::SteamInstalled, "220", "Half-Life 2"),
            raw(Origin::DesktopShortcut, "hl2.desktop", "fresh name"),
        ]);

        assert_eq!(merged.len(), 2);
        // The replacement keeps the first-seen slot.
        assert_eq!(merged[0].origin, Origin::DesktopShortcut);
        assert_eq!(merged[0].display_name_hint.as_deref(), Some("fresh name"));
        assert_eq!(merged[1].origin_key, "220");
    }

    #[test]
    fn merge_preserves_cross_origin_duplicates() {
        // The same appid discovered through a shortcut and through Steam
        // stays as two entries.
        let merged = merge_discoveries(vec![
            raw(Origin::DesktopShortcut, "220", "Half-Life 2"),
            raw(Origin::SteamInstalled, "220", "Half-Life 2"),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn local_stats_beat_origin_hints() {
        let playtime = HashMap::from([("hl2".to_string(), 3_600_u64)]);
        let last_launch = HashMap::from([("hl2".to_string(), 1_700_000_000_i64)]);
        let mut discovery =
            raw(Origin::SteamInstalled, "220", "Half-Life 2").with_executable("/g/hl2/hl2.exe");
        discovery.origin_playtime_seconds = Some(120);
        discovery.origin_last_launch_epoch = Some(1);

        let stats = attach_stats(&playtime, &last_launch, &discovery, "hl2");
        assert_eq!(stats.total_seconds, 3_600);
        assert_eq!(stats.last_launch_epoch, 1_700_000_000);
    }

    #[test]
    fn origin_hints_fill_empty_local_stats() {
        let empty_playtime = HashMap::new();
        let empty_launch = HashMap::new();
        let mut discovery = raw(Origin::SteamInstalled, "220", "Half-Life 2");
        discovery.origin_playtime_seconds = Some(7_200);
        discovery.origin_last_launch_epoch = Some(1_690_000_000);

        let stats = attach_stats(&empty_playtime, &empty_launch, &discovery, "220");
        assert_eq!(stats.total_seconds, 7_200);
        assert_eq!(stats.last_launch_epoch, 1_690_000_000);

        let bare = raw(Origin::DesktopShortcut, "x.desktop", "X");
        let stats = attach_stats(&empty_playtime, &empty_launch, &bare, "x");
        assert_eq!(stats, PlayStats::default());
    }
}
