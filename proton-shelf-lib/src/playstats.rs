//! Per-executable play statistics.
//!
//! Two plain-text files under the cache root, both keyed by executable
//! basename (extension stripped, may contain spaces):
//!
//! ```text
//! last_launch   <exe-basename> <iso-8601 local time>   one line per game
//! playtime      <exe-basename> <total-seconds>         one line per game
//! ```
//!
//! The format is shared with the desktop frontend, which writes the same
//! files when it launches games. Timestamps are local time without an
//! offset, the way they were historically written.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone};

use crate::error::StoreError;

pub const LAST_LAUNCH_FILE: &str = "last_launch";
pub const PLAYTIME_FILE: &str = "playtime";

/// Reader/writer for the play-statistics files.
#[derive(Debug, Clone)]
pub struct PlayStatsStore {
    last_launch_path: PathBuf,
    playtime_path: PathBuf,
}

impl PlayStatsStore {
    pub fn new(cache_root: &Path) -> Self {
        Self {
            last_launch_path: cache_root.join(LAST_LAUNCH_FILE),
            playtime_path: cache_root.join(PLAYTIME_FILE),
        }
    }

    /// Map of exe basename → last-launch epoch seconds.
    ///
    /// Malformed lines are skipped; a missing file is an empty map.
    pub fn load_last_launch(&self) -> HashMap<String, i64> {
        let Ok(contents) = fs::read_to_string(&self.last_launch_path) else {
            return HashMap::new();
        };
        let mut map = HashMap::new();
        for line in contents.lines() {
            let Some((exe, stamp)) = line.rsplit_once(' ') else {
                continue;
            };
            match parse_local_timestamp(stamp) {
                Some(epoch) => {
                    map.insert(exe.to_string(), epoch);
                }
                None => log::debug!("skipping malformed last-launch line: {line}"),
            }
        }
        map
    }

    /// Record a launch, replacing any previous entry for the executable.
    pub fn record_launch(&self, exe_basename: &str, at: DateTime<Local>) -> Result<(), StoreError> {
        let mut entries: BTreeMap<String, String> = BTreeMap::new();
        if let Ok(contents) = fs::read_to_string(&self.last_launch_path) {
            for line in contents.lines() {
                if let Some((exe, stamp)) = line.rsplit_once(' ') {
                    entries.insert(exe.to_string(), stamp.to_string());
                }
            }
        }
        entries.insert(
            exe_basename.to_string(),
            at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        );
        let body: String = entries
            .iter()
            .map(|(exe, stamp)| format!("{exe} {stamp}\n"))
            .collect();
        write_atomic(&self.last_launch_path, body.as_bytes())
    }

    /// Map of exe basename → accumulated play seconds.
    pub fn load_playtime(&self) -> HashMap<String, u64> {
        let Ok(contents) = fs::read_to_string(&self.playtime_path) else {
            return HashMap::new();
        };
        let mut map = HashMap::new();
        for line in contents.lines() {
            let Some((exe, seconds)) = line.rsplit_once(' ') else {
                continue;
            };
            match seconds.trim().parse::<u64>() {
                Ok(total) => {
                    map.insert(exe.to_string(), total);
                }
                Err(_) => log::debug!("skipping malformed playtime line: {line}"),
            }
        }
        map
    }

    /// Add play seconds for the executable; returns the new total.
    pub fn add_playtime(&self, exe_basename: &str, delta_seconds: u64) -> Result<u64, StoreError> {
        let mut totals: BTreeMap<String, u64> = self.load_playtime().into_iter().collect();
        let total = totals
            .entry(exe_basename.to_string())
            .and_modify(|t| *t = t.saturating_add(delta_seconds))
            .or_insert(delta_seconds);
        let total = *total;
        let body: String = totals
            .iter()
            .map(|(exe, seconds)| format!("{exe} {seconds}\n"))
            .collect();
        write_atomic(&self.playtime_path, body.as_bytes())?;
        Ok(total)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.to_path_buf().into_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Parse `2024-05-01T12:34:56` (optionally with fractional seconds) as
/// local time. Returns epoch seconds.
fn parse_local_timestamp(stamp: &str) -> Option<i64> {
    let naive = NaiveDateTime::parse_from_str(stamp.trim(), "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.timestamp()),
        // DST fold: take the earlier instant
        LocalResult::Ambiguous(dt, _) => Some(dt.timestamp()),
        LocalResult::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn store() -> (TempDir, PlayStatsStore) {
        let dir = TempDir::new().unwrap();
        let store = PlayStatsStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn missing_files_mean_empty_stats() {
        let (_dir, store) = store();
        assert!(store.load_last_launch().is_empty());
        assert!(store.load_playtime().is_empty());
    }

    #[test]
    fn record_launch_round_trips() {
        let (_dir, store) = store();
        let at = Local.with_ymd_and_hms(2024, 5, 1, 12, 34, 56).unwrap();
        store.record_launch("hl2", at).unwrap();
        let map = store.load_last_launch();
        assert_eq!(map.get("hl2"), Some(&at.timestamp()));
    }

    #[test]
    fn record_launch_replaces_previous_entry() {
        let (_dir, store) = store();
        let first = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let second = Local.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        store.record_launch("hl2", first).unwrap();
        store.record_launch("hl2", second).unwrap();
        let map = store.load_last_launch();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("hl2"), Some(&second.timestamp()));
    }

    #[test]
    fn exe_names_with_spaces_survive() {
        let (_dir, store) = store();
        let at = Local.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        store.record_launch("Half Life 2", at).unwrap();
        let map = store.load_last_launch();
        assert_eq!(map.get("Half Life 2"), Some(&at.timestamp()));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let (dir, store) = store();
        fs::write(
            dir.path().join(LAST_LAUNCH_FILE),
            "good 2024-05-01T10:00:00\nnonsense\nbad not-a-time\n",
        )
        .unwrap();
        let map = store.load_last_launch();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("good"));
    }

    #[test]
    fn playtime_accumulates() {
        let (_dir, store) = store();
        assert_eq!(store.add_playtime("hl2", 60).unwrap(), 60);
        assert_eq!(store.add_playtime("hl2", 30).unwrap(), 90);
        assert_eq!(store.add_playtime("portal", 10).unwrap(), 10);
        let map = store.load_playtime();
        assert_eq!(map.get("hl2"), Some(&90));
        assert_eq!(map.get("portal"), Some(&10));
    }

    #[test]
    fn fractional_second_timestamps_parse() {
        let (dir, store) = store();
        fs::write(dir.path().join(LAST_LAUNCH_FILE), "game 2024-05-01T10:00:00.123456\n").unwrap();
        assert!(store.load_last_launch().contains_key("game"));
    }
}
