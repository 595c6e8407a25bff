//! TTL-governed on-disk cache for catalog snapshots, detail records and
//! cover images.
//!
//! Keys are relative paths under the cache root (`steam_apps.json`,
//! `images/220.jpg`). Freshness is judged purely by file mtime, so an entry
//! can be force-expired by touching it into the past and force-refreshed by
//! deleting it. All writes go through a temp file and a rename so readers
//! never observe a half-written entry.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// TTL for full external catalog snapshots (Steam app list).
pub const CATALOG_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);
/// TTL for per-app detail records.
pub const DETAIL_TTL: Duration = CATALOG_TTL;
/// TTL for per-slug EGS store descriptions.
pub const EGS_DESCRIPTION_TTL: Duration = Duration::from_secs(60 * 60);
/// TTL for the anti-cheat registry snapshot.
pub const ANTICHEAT_TTL: Duration = CATALOG_TTL;
/// TTL for the cached Epic installed-games list.
pub const LEGENDARY_LIST_TTL: Duration = Duration::from_secs(60 * 60);

/// On-disk cache rooted at `<user-cache>/PortProtonQT`.
#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path a key resolves to; the file may or may not exist.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Age of a cached entry, or `None` when absent.
    pub fn age(&self, key: &str) -> Option<Duration> {
        let modified = fs::metadata(self.path_for(key)).ok()?.modified().ok()?;
        SystemTime::now().duration_since(modified).ok()
    }

    /// Load a JSON entry if it exists and its mtime is within `ttl`.
    ///
    /// A payload that no longer parses is unlinked so the next fetch starts
    /// clean. Read errors degrade to a miss.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        let path = self.path_for(key);
        if !is_fresh(&path, ttl) {
            return None;
        }
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) => {
                log::debug!("cache read failed for {key}: {err}");
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("discarding unparseable cache entry {key}: {err}");
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    /// Serialize `value` under `key`, atomically.
    pub fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<PathBuf, StoreError> {
        let contents = serde_json::to_string(value)?;
        self.write_atomic(key, contents.as_bytes())
    }

    /// Load a raw entry. Blobs (cover images) do not expire.
    pub fn get_blob(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                log::debug!("cache read failed for {key}: {err}");
                None
            }
        }
    }

    /// Store a raw entry under `key`, atomically.
    pub fn put_blob(&self, key: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        self.write_atomic(key, bytes)
    }

    fn write_atomic(&self, key: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(path)
    }
}

fn is_fresh(path: &Path, ttl: Duration) -> bool {
    let Ok(meta) = fs::metadata(path) else {
        return false;
    };
    let Ok(modified) = meta.modified() else {
        return false;
    };
    match SystemTime::now().duration_since(modified) {
        Ok(age) => age <= ttl,
        // mtime in the future (clock skew) counts as fresh
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        name: String,
        appid: u32,
    }

    fn cache() -> (TempDir, Cache) {
        let dir = TempDir::new().unwrap();
        let cache = Cache::new(dir.path());
        (dir, cache)
    }

    #[test]
    fn json_round_trip_within_ttl() {
        let (_dir, cache) = cache();
        let value = Snapshot {
            name: "Half-Life 2".into(),
            appid: 220,
        };
        cache.put_json("steam_app_220.json", &value).unwrap();
        let loaded: Snapshot = cache.get_json("steam_app_220.json", Duration::MAX).unwrap();
        assert_eq!(loaded, value);
    }

    #[test]
    fn expired_entries_miss() {
        let (_dir, cache) = cache();
        cache.put_json("k.json", &1u32).unwrap();
        assert_eq!(cache.get_json::<u32>("k.json", Duration::ZERO), None);
        // The file itself is still there; only the TTL check failed.
        assert!(cache.path_for("k.json").exists());
    }

    #[test]
    fn unparseable_entries_are_unlinked() {
        let (_dir, cache) = cache();
        cache.put_blob("bad.json", b"{ not json").unwrap();
        assert_eq!(cache.get_json::<u32>("bad.json", Duration::MAX), None);
        assert!(!cache.path_for("bad.json").exists());
    }

    #[test]
    fn keys_may_contain_subdirectories() {
        let (_dir, cache) = cache();
        cache.put_blob("images/220.jpg", b"\xff\xd8").unwrap();
        assert_eq!(cache.get_blob("images/220.jpg").unwrap(), b"\xff\xd8");
        assert!(cache.age("images/220.jpg").is_some());
        assert!(cache.age("images/400.jpg").is_none());
    }

    #[test]
    fn missing_blob_is_a_miss() {
        let (_dir, cache) = cache();
        assert_eq!(cache.get_blob("absent.bin"), None);
    }
}
