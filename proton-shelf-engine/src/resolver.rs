//! Metadata resolution for discovered games.
//!
//! One `Resolver` serves a whole rescan: the Steam name index and the
//! anti-cheat registry are loaded once up front (cache-first, offline
//! degrades to empty), then every discovery is resolved independently
//! against them. Resolution never fails a scan; anything that goes wrong
//! degrades the entry to [`Resolution::Unresolved`] with a reason.

use std::cmp::Reverse;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};

use proton_shelf_catalog::{
    AntiCheatCatalog, AntiCheatRegistry, EgsCatalog, NameIndex, SteamCatalog, egs, steam,
};
use proton_shelf_core::{
    AntiCheatStatus, ControllerSupport, CoverSource, DetailRecord, Origin, RawDiscovery,
    Resolution, SourceCatalog, capitalize, is_generic_launcher_name, is_valid_candidate,
};
use proton_shelf_lib::download::ARTIFACT_TIMEOUT;
use proton_shelf_lib::{Cache, Downloader};
use proton_shelf_sources::{ExeMetadata, probe_exe};

/// Everything resolution contributes to an entry; the aggregator merges
/// this with overlays and play stats.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMetadata {
    pub display_name: String,
    pub description: String,
    pub cover: CoverSource,
    pub controller_support: ControllerSupport,
    pub anti_cheat_status: AntiCheatStatus,
    pub resolution: Resolution,
}

/// Per-rescan resolution context.
pub struct Resolver {
    steam: SteamCatalog,
    egs: EgsCatalog,
    index: NameIndex,
    registry: AntiCheatRegistry,
    downloader: Arc<Downloader>,
    images_dir: PathBuf,
    lang: String,
}

impl Resolver {
    /// Load the catalog index and the anti-cheat registry, cache-first.
    ///
    /// Either being unavailable is logged and degrades to empty; lookups
    /// against an empty index simply resolve nothing this scan.
    pub async fn prepare(
        cache: Cache,
        downloader: Arc<Downloader>,
        images_dir: PathBuf,
        lang: impl Into<String>,
    ) -> Self {
        let steam = SteamCatalog::new(cache.clone(), Arc::clone(&downloader));
        let egs = EgsCatalog::new(cache.clone(), Arc::clone(&downloader));
        let anticheat = AntiCheatCatalog::new(cache, Arc::clone(&downloader));

        let index = match steam.load_app_index().await {
            Ok(index) => index,
            Err(err) => {
                warn!("steam app index unavailable: {err}");
                NameIndex::from_records(Vec::new())
            }
        };
        let registry = match anticheat.load_registry().await {
            Ok(registry) => registry,
            Err(err) => {
                warn!("anti-cheat registry unavailable: {err}");
                AntiCheatRegistry::empty()
            }
        };

        Self {
            steam,
            egs,
            index,
            registry,
            downloader,
            images_dir,
            lang: lang.into(),
        }
    }

    /// Resolve one discovery. Infallible by design; failures degrade.
    pub async fn resolve(&self, raw: &RawDiscovery) -> ResolvedMetadata {
        match raw.origin {
            Origin::SteamInstalled => self.resolve_steam_installed(raw).await,
            Origin::EpicInstalled => self.resolve_epic_installed(raw).await,
            Origin::DesktopShortcut => self.resolve_shortcut(raw).await,
        }
    }

    // ── Steam-installed: the origin key is the app id ───────────────────

    async fn resolve_steam_installed(&self, raw: &RawDiscovery) -> ResolvedMetadata {
        let display_name = raw
            .display_name_hint
            .clone()
            .unwrap_or_else(|| format!("Steam app {}", raw.origin_key));

        let Ok(appid) = raw.origin_key.parse::<u32>() else {
            warn!("steam discovery with non-numeric key: {}", raw.origin_key);
            return self.unresolved(raw, display_name, "origin key is not an app id");
        };

        let detail = match self.steam.fetch_detail(appid, &self.lang).await {
            Ok(detail) => detail,
            Err(err) => {
                warn!("appdetails for {appid} failed: {err}");
                None
            }
        };

        match detail {
            Some(found) => {
                let mut detail = found.detail;
                detail.anti_cheat_status = self.anticheat_status(found.appid, &display_name);
                self.resolved_steam(found.appid, display_name, detail)
            }
            None => {
                let status = self.anticheat_status(appid, &display_name);
                ResolvedMetadata {
                    anti_cheat_status: status,
                    ..self.unresolved(raw, display_name, "no store data for app id")
                }
            }
        }
    }

    // ── Epic-installed: EGS description by slugified title ──────────────

    async fn resolve_epic_installed(&self, raw: &RawDiscovery) -> ResolvedMetadata {
        let title = raw
            .display_name_hint
            .clone()
            .unwrap_or_else(|| raw.origin_key.clone());
        let slug = egs::slugify(&title);

        let status = self
            .registry
            .status_for_epic_app(&raw.origin_key)
            .or_else(|| self.registry.status_for_name(&title))
            .unwrap_or_default();

        let description = if slug.is_empty() {
            None
        } else {
            match self.egs.fetch_description(&slug, &self.lang).await {
                Ok(description) => description,
                Err(err) => {
                    warn!("egs description for {slug} failed: {err}");
                    None
                }
            }
        };

        let cover_url = raw.icon_hint.clone().unwrap_or_default();
        let cover = if cover_url.is_empty() {
            CoverSource::Placeholder
        } else {
            self.localized_cover(&format!("epic_{}.jpg", raw.origin_key), &cover_url)
        };

        match description {
            Some(description) => {
                let detail = DetailRecord {
                    description: description.clone(),
                    cover_url,
                    controller_support: ControllerSupport::Unknown,
                    anti_cheat_status: status,
                    fetched_at: chrono::Utc::now().timestamp(),
                };
                ResolvedMetadata {
                    display_name: title,
                    description,
                    cover,
                    controller_support: ControllerSupport::Unknown,
                    anti_cheat_status: status,
                    resolution: Resolution::Resolved {
                        catalog: SourceCatalog::Egs,
                        catalog_id: slug,
                        detail,
                    },
                }
            }
            None => ResolvedMetadata {
                display_name: title,
                description: String::new(),
                cover,
                controller_support: ControllerSupport::Unknown,
                anti_cheat_status: status,
                resolution: Resolution::Unresolved {
                    reason: "no store page description".to_string(),
                },
            },
        }
    }

    // ── Desktop shortcuts: candidate pipeline against the name index ────

    async fn resolve_shortcut(&self, raw: &RawDiscovery) -> ResolvedMetadata {
        let probe = probe_metadata(raw);
        let candidates = shortcut_candidates(raw, probe.as_ref());
        debug!("candidates for {}: {candidates:?}", raw.origin_key);

        let hit = candidates
            .iter()
            .find_map(|candidate| self.index.lookup(candidate));

        let Some(record) = hit else {
            let display_name = fallback_display_name(raw);
            let status = self
                .registry
                .status_for_name(&display_name)
                .unwrap_or_default();
            return ResolvedMetadata {
                anti_cheat_status: status,
                ..self.unresolved(raw, display_name, "no catalog match")
            };
        };

        let display_name = record.display_name.clone();
        let Ok(appid) = record.catalog_id.parse::<u32>() else {
            debug!("catalog record {} has a non-numeric id", record.catalog_id);
            return self.unresolved(raw, display_name, "catalog id is not an app id");
        };

        let fetched = match self.steam.fetch_detail(appid, &self.lang).await {
            Ok(detail) => detail,
            Err(err) => {
                warn!("appdetails for {appid} failed: {err}");
                None
            }
        };

        // A matched index record identifies the app even when the store has
        // no detail for it; synthesize an empty record so the cover and the
        // anti-cheat status still resolve.
        let (final_id, mut detail) = match fetched {
            Some(found) => (found.appid, found.detail),
            None => (
                appid,
                DetailRecord {
                    cover_url: steam::cover_url(appid),
                    ..DetailRecord::default()
                },
            ),
        };
        detail.anti_cheat_status = self.anticheat_status(final_id, &record.display_name);
        self.resolved_steam(final_id, display_name, detail)
    }

    // ── Shared pieces ───────────────────────────────────────────────────

    fn anticheat_status(&self, appid: u32, name: &str) -> AntiCheatStatus {
        self.registry
            .status_for_steam_app(appid)
            .or_else(|| self.registry.status_for_name(name))
            .unwrap_or_default()
    }

    fn resolved_steam(
        &self,
        appid: u32,
        display_name: String,
        detail: DetailRecord,
    ) -> ResolvedMetadata {
        let cover = self.localized_cover(&format!("{appid}.jpg"), &detail.cover_url);
        ResolvedMetadata {
            display_name,
            description: detail.description.clone(),
            cover,
            controller_support: detail.controller_support,
            anti_cheat_status: detail.anti_cheat_status,
            resolution: Resolution::Resolved {
                catalog: SourceCatalog::Steam,
                catalog_id: appid.to_string(),
                detail,
            },
        }
    }

    fn unresolved(&self, raw: &RawDiscovery, display_name: String, reason: &str) -> ResolvedMetadata {
        ResolvedMetadata {
            display_name,
            description: String::new(),
            cover: hint_cover(raw),
            controller_support: ControllerSupport::Unknown,
            anti_cheat_status: AntiCheatStatus::Unknown,
            resolution: Resolution::Unresolved {
                reason: reason.to_string(),
            },
        }
    }

    /// Prefer a cover already localized under `images/`; otherwise serve
    /// the URL and schedule the download so later scans hit the local file.
    fn localized_cover(&self, file_name: &str, url: &str) -> CoverSource {
        let local = self.images_dir.join(file_name);
        if local.is_file() {
            return CoverSource::Local(local);
        }
        if url.is_empty() {
            return CoverSource::Placeholder;
        }
        self.downloader
            .fetch_async(url, local, ARTIFACT_TIMEOUT, |result| {
                if let Err(err) = result {
                    debug!("cover download failed: {err}");
                }
            });
        CoverSource::Url(url.to_string())
    }
}

/// Ordered lookup candidates for a shortcut discovery.
///
/// Construction order: probed product name, probed file description,
/// display-name hint, executable basename, containing folder. Generic
/// launcher strings and invalid candidates are dropped, then the list is
/// stably sorted by descending word count so the most specific names are
/// tried first (ties keep construction order).
pub fn shortcut_candidates(raw: &RawDiscovery, probe: Option<&ExeMetadata>) -> Vec<String> {
    let mut candidates = Vec::new();

    if let Some(metadata) = probe {
        for value in [&metadata.product_name, &metadata.file_description] {
            if let Some(text) = value {
                if !is_generic_launcher_name(text) {
                    candidates.push(text.clone());
                }
            }
        }
    }
    if let Some(hint) = &raw.display_name_hint {
        candidates.push(hint.clone());
    }
    if let Some(exe) = &raw.executable_path_hint {
        if let Some(stem) = exe.file_stem() {
            candidates.push(stem.to_string_lossy().into_owned());
        }
        if let Some(folder) = folder_candidate(exe) {
            candidates.push(folder);
        }
    }

    candidates.retain(|candidate| is_valid_candidate(candidate));
    candidates.sort_by_key(|candidate| Reverse(candidate.split_whitespace().count()));
    candidates
}

/// Name of the folder containing the executable, skipping over a
/// `bin`/`binaries` layer to the real game directory.
fn folder_candidate(exe: &Path) -> Option<String> {
    let parent = exe.parent()?;
    let name = parent.file_name()?.to_string_lossy();
    if name.eq_ignore_ascii_case("bin") || name.eq_ignore_ascii_case("binaries") {
        let grandparent = parent.parent()?;
        return Some(grandparent.file_name()?.to_string_lossy().into_owned());
    }
    Some(name.into_owned())
}

fn probe_metadata(raw: &RawDiscovery) -> Option<ExeMetadata> {
    let path = raw.executable_path_hint.as_ref()?;
    if !path.is_file() {
        return None;
    }
    match probe_exe(path) {
        Ok(metadata) => Some(metadata),
        Err(err) => {
            debug!("version probe failed for {}: {err}", path.display());
            None
        }
    }
}

/// Display name for entries nothing resolved: hint, else the capitalized
/// executable basename.
fn fallback_display_name(raw: &RawDiscovery) -> String {
    if let Some(hint) = &raw.display_name_hint {
        return hint.clone();
    }
    match raw.exe_basename() {
        Some(basename) => capitalize(&basename),
        None => capitalize(&raw.origin_key),
    }
}

/// Cover source from the discovery's own icon hint.
fn hint_cover(raw: &RawDiscovery) -> CoverSource {
    match raw.icon_hint.as_deref() {
        Some(icon) if icon.starts_with("http://") || icon.starts_with("https://") => {
            CoverSource::Url(icon.to_string())
        }
        Some(icon) => {
            let path = PathBuf::from(icon);
            if path.is_file() {
                CoverSource::Local(path)
            } else {
                CoverSource::Placeholder
            }
        }
        None => CoverSource::Placeholder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shortcut(key: &str) -> RawDiscovery {
        RawDiscovery::new(Origin::DesktopShortcut, key, vec!["wine".into(), "g.exe".into()])
    }

    #[test]
    fn candidates_prefer_specific_names() {
        let raw = shortcut("hl2.desktop")
            .with_display_name("Half-Life 2")
            .with_executable("/games/Half-Life 2/hl2.exe");
        let probe = ExeMetadata {
            product_name: Some("Half-Life 2".to_string()),
            file_description: None,
        };

        let candidates = shortcut_candidates(&raw, Some(&probe));
        // Multi-word candidates first; the bare basename trails.
        assert_eq!(
            candidates,
            vec!["Half-Life 2", "Half-Life 2", "Half-Life 2", "hl2"]
        );
    }

    #[test]
    fn candidate_sort_is_stable_on_ties() {
        let raw = shortcut("w3.desktop")
            .with_display_name("The Witcher 3")
            .with_executable("/games/Wild Hunt GOTY/bin/witcher3.exe");
        let probe = ExeMetadata {
            product_name: Some("The Witcher 3 Wild Hunt".to_string()),
            file_description: Some("CD PROJEKT RED game".to_string()),
        };

        let candidates = shortcut_candidates(&raw, Some(&probe));
        assert_eq!(
            candidates,
            vec![
                // 4 words, construction order preserved
                "The Witcher 3 Wild Hunt",
                "CD PROJEKT RED game",
                // 3 words
                "The Witcher 3",
                "Wild Hunt GOTY",
                // 1 word
                "witcher3",
            ]
        );
    }

    #[test]
    fn generic_launcher_probe_values_are_dropped() {
        let raw = shortcut("game.desktop").with_executable("/games/Stray/launcher.exe");
        let probe = ExeMetadata {
            product_name: Some("Launcher".to_string()),
            file_description: Some("Bootstrapper".to_string()),
        };

        let candidates = shortcut_candidates(&raw, Some(&probe));
        assert_eq!(candidates, vec!["launcher", "Stray"]);
    }

    #[test]
    fn shipping_binary_names_are_filtered() {
        let raw = shortcut("fn.desktop")
            .with_display_name("Fortnite")
            .with_executable("/games/Fortnite/FortniteClient-Win64-Shipping.exe");

        let candidates = shortcut_candidates(&raw, None);
        assert_eq!(candidates, vec!["Fortnite", "Fortnite"]);
    }

    #[test]
    fn bin_folder_defers_to_grandparent() {
        let raw = shortcut("w3.desktop").with_executable("/games/The Witcher 3/bin/witcher3.exe");
        let candidates = shortcut_candidates(&raw, None);
        assert_eq!(candidates, vec!["The Witcher 3", "witcher3"]);

        let raw = shortcut("st.desktop").with_executable("/games/Stray/Binaries/Stray.exe");
        let candidates = shortcut_candidates(&raw, None);
        assert_eq!(candidates, vec!["Stray", "Stray"]);
    }

    #[test]
    fn fallback_name_capitalizes_basename() {
        let raw = shortcut("indie.desktop").with_executable("/games/indie/MyIndieGame.exe");
        assert_eq!(fallback_display_name(&raw), "Myindiegame");

        let named = shortcut("indie.desktop")
            .with_display_name("My Indie Game")
            .with_executable("/games/indie/MyIndieGame.exe");
        assert_eq!(fallback_display_name(&named), "My Indie Game");
    }

    #[test]
    fn hint_cover_distinguishes_urls_from_paths() {
        let url = shortcut("a").with_icon("https://cdn.example.com/tall.jpg");
        assert_eq!(
            hint_cover(&url),
            CoverSource::Url("https://cdn.example.com/tall.jpg".to_string())
        );

        let missing = shortcut("b").with_icon("/nonexistent/icon.png");
        assert_eq!(hint_cover(&missing), CoverSource::Placeholder);

        assert_eq!(hint_cover(&shortcut("c")), CoverSource::Placeholder);
    }
}
