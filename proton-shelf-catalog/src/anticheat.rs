//! Community anti-cheat compatibility registry.
//!
//! One JSON document maps game names and store ids to a compatibility
//! verdict. The registry is advisory: offline means an empty registry and a
//! warning, never a failed scan.

use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use proton_shelf_core::normalize::normalize;
use proton_shelf_core::types::AntiCheatStatus;
use proton_shelf_lib::cache::ANTICHEAT_TTL;
use proton_shelf_lib::download::DEFAULT_HTTP_TIMEOUT;
use proton_shelf_lib::{Cache, Downloader};

use crate::error::CatalogError;

const REGISTRY_URL: &str =
    "https://raw.githubusercontent.com/AreWeAntiCheatYet/AreWeAntiCheatYet/HEAD/games.json";

/// Cache key for the parsed registry.
pub const REGISTRY_KEY: &str = "areweanticheatyet.json";

/// One registry entry as persisted in the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    steam_id: Option<String>,
    #[serde(default)]
    epic_id: Option<String>,
}

struct RegistryEntry {
    normalized_name: String,
    normalized_slug: String,
    status: AntiCheatStatus,
    steam_id: Option<String>,
    epic_id: Option<String>,
}

/// The loaded registry, ready for id and name lookups.
pub struct AntiCheatRegistry {
    entries: Vec<RegistryEntry>,
}

impl AntiCheatRegistry {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn from_stored(stored: Vec<StoredEntry>) -> Self {
        let entries = stored
            .into_iter()
            .map(|e| RegistryEntry {
                normalized_name: normalize(&e.name),
                // Slugs are dash-joined; undo that before normalizing so
                // they compare against candidate titles.
                normalized_slug: normalize(&e.slug.replace('-', " ")),
                status: AntiCheatStatus::from_label(&e.status),
                steam_id: e.steam_id,
                epic_id: e.epic_id,
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Verdict for a Steam app id, exact match.
    pub fn status_for_steam_app(&self, appid: u32) -> Option<AntiCheatStatus> {
        let id = appid.to_string();
        self.entries
            .iter()
            .find(|e| e.steam_id.as_deref() == Some(id.as_str()))
            .map(|e| e.status)
    }

    /// Verdict for an EGS app id, exact match.
    pub fn status_for_epic_app(&self, app_id: &str) -> Option<AntiCheatStatus> {
        if app_id.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.epic_id.as_deref() == Some(app_id))
            .map(|e| e.status)
    }

    /// Verdict by title, normalized against entry name or slug.
    pub fn status_for_name(&self, name: &str) -> Option<AntiCheatStatus> {
        let needle = normalize(name);
        if needle.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.normalized_name == needle || e.normalized_slug == needle)
            .map(|e| e.status)
    }
}

/// Registry access, cache-first.
pub struct AntiCheatCatalog {
    cache: Cache,
    downloader: Arc<Downloader>,
}

impl AntiCheatCatalog {
    pub fn new(cache: Cache, downloader: Arc<Downloader>) -> Self {
        Self { cache, downloader }
    }

    /// Load the registry, cache-first. Offline yields an empty registry.
    pub async fn load_registry(&self) -> Result<AntiCheatRegistry, CatalogError> {
        if let Some(stored) = self
            .cache
            .get_json::<Vec<StoredEntry>>(REGISTRY_KEY, ANTICHEAT_TTL)
        {
            debug!("anti-cheat registry: {} entries from cache", stored.len());
            return Ok(AntiCheatRegistry::from_stored(stored));
        }

        let body = match self
            .downloader
            .get_text(REGISTRY_URL, DEFAULT_HTTP_TIMEOUT)
            .await
        {
            Ok(body) => body,
            Err(err) => {
                warn!("anti-cheat registry unavailable: {err}");
                return Ok(AntiCheatRegistry::empty());
            }
        };

        let stored = parse_registry(&body)?;
        self.cache.put_json(REGISTRY_KEY, &stored)?;
        debug!("anti-cheat registry: {} entries fetched", stored.len());
        Ok(AntiCheatRegistry::from_stored(stored))
    }
}

/// Parse the raw registry document down to the fields we keep.
///
/// Store ids arrive under `storeIds {steam, epic}` and may be strings or
/// numbers depending on the entry's age.
fn parse_registry(body: &str) -> Result<Vec<StoredEntry>, CatalogError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let Some(items) = value.as_array() else {
        return Err(CatalogError::malformed(
            "anti-cheat registry root is not an array",
        ));
    };

    let mut stored = Vec::with_capacity(items.len());
    for item in items {
        let name = item
            .get("name")
            .and_then(|n| n.as_str())
            .unwrap_or_default()
            .to_string();
        if name.is_empty() {
            continue;
        }
        let slug = item
            .get("slug")
            .and_then(|s| s.as_str())
            .unwrap_or_default()
            .to_string();
        let status = item
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or_default()
            .to_string();
        let store_ids = item.get("storeIds");
        let steam_id = store_ids
            .and_then(|s| s.get("steam"))
            .and_then(id_string);
        let epic_id = store_ids.and_then(|s| s.get("epic")).and_then(id_string);
        stored.push(StoredEntry {
            name,
            slug,
            status,
            steam_id,
            epic_id,
        });
    }
    Ok(stored)
}

fn id_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proton_shelf_lib::ConfigStore;
    use tempfile::TempDir;

    const REGISTRY_BODY: &str = r#"[
        {"name":"Apex Legends","slug":"apex-legends","status":"Running",
         "storeIds":{"steam":"1172470"}},
        {"name":"Fortnite","slug":"fortnite","status":"Denied",
         "storeIds":{"epic":"fn"}},
        {"name":"ELDEN RING","slug":"elden-ring","status":"Supported",
         "storeIds":{"steam":1245620}},
        {"name":"Mystery","slug":"mystery","status":"SomeNewLabel","storeIds":{}}
    ]"#;

    fn registry() -> AntiCheatRegistry {
        AntiCheatRegistry::from_stored(parse_registry(REGISTRY_BODY).unwrap())
    }

    #[test]
    fn test_parse_registry() {
        let stored = parse_registry(REGISTRY_BODY).unwrap();
        assert_eq!(stored.len(), 4);
        assert_eq!(stored[0].steam_id.as_deref(), Some("1172470"));
        assert_eq!(stored[1].epic_id.as_deref(), Some("fn"));
        // Numeric store ids are normalized to strings.
        assert_eq!(stored[2].steam_id.as_deref(), Some("1245620"));
    }

    #[test]
    fn test_parse_registry_rejects_non_array() {
        assert!(parse_registry(r#"{"games":[]}"#).is_err());
    }

    #[test]
    fn test_status_by_steam_id() {
        let reg = registry();
        assert_eq!(
            reg.status_for_steam_app(1172470),
            Some(AntiCheatStatus::Running)
        );
        assert_eq!(
            reg.status_for_steam_app(1245620),
            Some(AntiCheatStatus::Supported)
        );
        assert_eq!(reg.status_for_steam_app(999), None);
    }

    #[test]
    fn test_status_by_epic_id() {
        let reg = registry();
        assert_eq!(reg.status_for_epic_app("fn"), Some(AntiCheatStatus::Denied));
        assert_eq!(reg.status_for_epic_app(""), None);
        assert_eq!(reg.status_for_epic_app("nope"), None);
    }

    #[test]
    fn test_status_by_name_and_slug() {
        let reg = registry();
        // Name match, case and glyphs folded by normalization.
        assert_eq!(
            reg.status_for_name("Elden Ring™"),
            Some(AntiCheatStatus::Supported)
        );
        // Slug match with dashes unfolded.
        assert_eq!(
            reg.status_for_name("apex legends"),
            Some(AntiCheatStatus::Running)
        );
        assert_eq!(reg.status_for_name("unlisted game"), None);
    }

    #[test]
    fn test_unknown_status_label() {
        let reg = registry();
        assert_eq!(
            reg.status_for_name("mystery"),
            Some(AntiCheatStatus::Unknown)
        );
    }

    #[tokio::test]
    async fn test_load_registry_from_cache() {
        let tmp = TempDir::new().unwrap();
        let cache = Cache::new(tmp.path().join("cache"));
        let config = Arc::new(ConfigStore::new(tmp.path().join("conf.toml")));
        let catalog = AntiCheatCatalog::new(cache.clone(), Arc::new(Downloader::new(config)));

        cache
            .put_json(REGISTRY_KEY, &parse_registry(REGISTRY_BODY).unwrap())
            .unwrap();

        let reg = catalog.load_registry().await.unwrap();
        assert_eq!(reg.len(), 4);
        assert_eq!(
            reg.status_for_steam_app(1172470),
            Some(AntiCheatStatus::Running)
        );
    }
}
