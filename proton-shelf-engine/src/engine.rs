//! The engine facade handed to presentation layers.
//!
//! One [`Engine`] value owns the whole context: preferences, cache,
//! downloader, discovery adapters and the published entry list. Nothing in
//! here is global; construct it at startup, drop it at shutdown. All calls
//! are safe from any thread.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local};
use tokio::sync::mpsc::UnboundedSender;

use proton_shelf_core::{CatalogEntry, LaunchPlan, launch_plan};
use proton_shelf_lib::{AppDirs, Cache, ConfigStore, Downloader, PlayStatsStore};
use proton_shelf_sources::{DesktopShortcutScanner, EpicScanner, SteamScanner};

use crate::aggregator::{Aggregator, ScanEvent};
use crate::error::EngineError;
use crate::view_model::{Snapshot, build_snapshot};

/// Facade over the scan pipeline, preferences and play stats.
pub struct Engine {
    config: Arc<ConfigStore>,
    stats: PlayStatsStore,
    aggregator: Aggregator,
    entries: Mutex<Vec<CatalogEntry>>,
    observers: Mutex<Vec<UnboundedSender<Snapshot>>>,
}

impl Engine {
    /// Engine over the real discovery surfaces of `dirs`.
    pub fn new(dirs: &AppDirs) -> Self {
        let cache = Cache::new(dirs.cache_root());
        let config = Arc::new(ConfigStore::new(dirs.config_path()));
        let downloader = Arc::new(Downloader::new(Arc::clone(&config)));
        let desktop = DesktopShortcutScanner::new(dirs);
        let steam = SteamScanner::new();
        let epic = EpicScanner::new(cache.clone(), Arc::clone(&downloader));
        Self::assemble(dirs, cache, config, downloader, desktop, steam, epic)
    }

    /// Engine over explicit adapters, for callers that point discovery at
    /// fixture directories instead of the running system.
    pub fn with_adapters(
        dirs: &AppDirs,
        desktop: DesktopShortcutScanner,
        steam: SteamScanner,
        epic: EpicScanner,
    ) -> Self {
        let cache = Cache::new(dirs.cache_root());
        let config = Arc::new(ConfigStore::new(dirs.config_path()));
        let downloader = Arc::new(Downloader::new(Arc::clone(&config)));
        Self::assemble(dirs, cache, config, downloader, desktop, steam, epic)
    }

    fn assemble(
        dirs: &AppDirs,
        cache: Cache,
        config: Arc<ConfigStore>,
        downloader: Arc<Downloader>,
        desktop: DesktopShortcutScanner,
        steam: SteamScanner,
        epic: EpicScanner,
    ) -> Self {
        let aggregator = Aggregator::new(
            dirs,
            cache,
            downloader,
            Arc::clone(&config),
            desktop,
            steam,
            epic,
        );
        Self {
            config,
            stats: PlayStatsStore::new(dirs.cache_root()),
            aggregator,
            entries: Mutex::new(Vec::new()),
            observers: Mutex::new(Vec::new()),
        }
    }

    fn entries_guard(&self) -> MutexGuard<'_, Vec<CatalogEntry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn observers_guard(&self) -> MutexGuard<'_, Vec<UnboundedSender<Snapshot>>> {
        match self.observers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Ordered card list under the current preferences.
    pub fn snapshot(&self) -> Snapshot {
        let entries = self.entries_guard();
        build_snapshot(
            &entries,
            self.config.sort_method(),
            self.config.display_filter(),
            self.config.time_detail(),
        )
    }

    /// Register a listener. It receives the current snapshot immediately,
    /// then a fresh one on every publish; dropped receivers are pruned on
    /// the next publish.
    pub fn observe(&self, listener: UnboundedSender<Snapshot>) {
        if listener.send(self.snapshot()).is_ok() {
            self.observers_guard().push(listener);
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.observers_guard()
            .retain(|listener| listener.send(snapshot.clone()).is_ok());
    }

    /// Run a full scan and publish the result. `None` when cancelled; a
    /// cancelled scan leaves the previous entries in place.
    pub async fn rescan(
        &self,
        events: UnboundedSender<ScanEvent>,
        cancel: Arc<AtomicBool>,
    ) -> Option<Snapshot> {
        let entries = self.aggregator.rescan(events, cancel).await?;
        *self.entries_guard() = entries;
        self.publish();
        Some(self.snapshot())
    }

    /// Published entries in publish order.
    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.entries_guard().clone()
    }

    pub fn entry(&self, entry_id: &str) -> Option<CatalogEntry> {
        self.entries_guard()
            .iter()
            .find(|entry| entry.id == entry_id)
            .cloned()
    }

    /// Flip the favorite flag for an entry; returns the new state.
    pub fn toggle_favorite(&self, entry_id: &str) -> Result<bool, EngineError> {
        let now_favorite;
        {
            let mut entries = self.entries_guard();
            let entry = entries
                .iter_mut()
                .find(|entry| entry.id == entry_id)
                .ok_or_else(|| EngineError::not_found(entry_id))?;
            now_favorite = self.config.toggle_favorite(entry_id)?;
            entry.is_favorite = now_favorite;
        }
        self.publish();
        Ok(now_favorite)
    }

    /// Write one preference by dotted key and re-emit, since ordering may
    /// have changed.
    pub fn set_preference(&self, dotted_key: &str, value: &str) -> Result<(), EngineError> {
        self.config.set(dotted_key, value)?;
        self.publish();
        Ok(())
    }

    pub fn preference(&self, dotted_key: &str) -> Option<String> {
        self.config.get(dotted_key)
    }

    /// Persist a launch timestamp for an entry and update it in place.
    pub fn record_launch(&self, entry_id: &str, at: DateTime<Local>) -> Result<(), EngineError> {
        {
            let mut entries = self.entries_guard();
            let entry = entries
                .iter_mut()
                .find(|entry| entry.id == entry_id)
                .ok_or_else(|| EngineError::not_found(entry_id))?;
            self.stats.record_launch(&entry.stats_key(), at)?;
            entry.play_stats.last_launch_epoch = at.timestamp();
        }
        self.publish();
        Ok(())
    }

    /// Add played seconds for an entry; returns the new total.
    pub fn record_playtime_delta(
        &self,
        entry_id: &str,
        seconds: u64,
    ) -> Result<u64, EngineError> {
        let total;
        {
            let mut entries = self.entries_guard();
            let entry = entries
                .iter_mut()
                .find(|entry| entry.id == entry_id)
                .ok_or_else(|| EngineError::not_found(entry_id))?;
            total = self.stats.add_playtime(&entry.stats_key(), seconds)?;
            entry.play_stats.total_seconds = total;
        }
        self.publish();
        Ok(total)
    }

    /// Spawnable launch plan for an entry's exec command.
    pub fn launch_plan(&self, entry_id: &str) -> Result<LaunchPlan, EngineError> {
        let entry = self
            .entry(entry_id)
            .ok_or_else(|| EngineError::not_found(entry_id))?;
        launch_plan(&entry.exec_command)
            .ok_or_else(|| EngineError::invalid_command(entry.exec_command.join(" ")))
    }
}
