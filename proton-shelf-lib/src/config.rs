//! User preferences file (`PortProtonQT.conf`).
//!
//! TOML with a handful of known sections (`[library]`, `[appearance]`,
//! `[proxy]`, `[window]`). Reads happen on demand; writes load the current
//! document, update just the touched key via `toml::Value` and write it
//! back atomically, so keys owned by other frontends survive round trips.
//! Last writer wins.

use std::path::{Path, PathBuf};

use proton_shelf_core::{DisplayFilter, SortMethod, TimeDetail};

use crate::error::StoreError;

/// Proxy configuration as stored in the `[proxy]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxySettings {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxySettings {
    pub fn is_configured(&self) -> bool {
        self.url.as_deref().is_some_and(|url| !url.is_empty())
    }

    /// Proxy URL with credentials spliced in when both are present and the
    /// URL does not already carry a userinfo part.
    pub fn effective_url(&self) -> Option<String> {
        let url = self.url.as_deref().filter(|url| !url.is_empty())?;
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !url.contains('@') => {
                match url.split_once("://") {
                    Some((scheme, rest)) => Some(format!("{scheme}://{user}:{pass}@{rest}")),
                    None => Some(format!("{user}:{pass}@{url}")),
                }
            }
            _ => Some(url.to_string()),
        }
    }
}

/// Typed accessor layer over the preferences file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── Library preferences ─────────────────────────────────────────────

    pub fn sort_method(&self) -> SortMethod {
        self.get_str("library", "sort_method")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn set_sort_method(&self, method: SortMethod) -> Result<(), StoreError> {
        self.set_value("library", "sort_method", toml::Value::String(method.as_str().into()))
    }

    pub fn display_filter(&self) -> DisplayFilter {
        self.get_str("library", "display_filter")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn set_display_filter(&self, filter: DisplayFilter) -> Result<(), StoreError> {
        self.set_value("library", "display_filter", toml::Value::String(filter.as_str().into()))
    }

    pub fn favorites(&self) -> Vec<String> {
        let doc = self.load_doc();
        doc.get("library")
            .and_then(|library| library.get("favorites"))
            .and_then(|value| value.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_favorite(&self, entry_id: &str) -> bool {
        self.favorites().iter().any(|id| id == entry_id)
    }

    /// Flip an entry's favorite bit; returns the new state.
    pub fn toggle_favorite(&self, entry_id: &str) -> Result<bool, StoreError> {
        let mut ids = self.favorites();
        let now_favorite = if let Some(pos) = ids.iter().position(|id| id == entry_id) {
            ids.remove(pos);
            false
        } else {
            ids.push(entry_id.to_string());
            true
        };
        let array = toml::Value::Array(ids.into_iter().map(toml::Value::String).collect());
        self.set_value("library", "favorites", array)?;
        Ok(now_favorite)
    }

    // ── Appearance ──────────────────────────────────────────────────────

    pub fn time_detail(&self) -> TimeDetail {
        self.get_str("appearance", "time_detail")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn set_time_detail(&self, detail: TimeDetail) -> Result<(), StoreError> {
        self.set_value("appearance", "time_detail", toml::Value::String(detail.as_str().into()))
    }

    pub fn theme(&self) -> String {
        self.get_str("appearance", "theme").unwrap_or_else(|| "standard".to_string())
    }

    pub fn card_size(&self) -> u32 {
        self.get_int("appearance", "card_size").unwrap_or(250) as u32
    }

    /// Store-page language used in catalog detail requests.
    pub fn language(&self) -> String {
        self.get_str("appearance", "language").unwrap_or_else(|| "en".to_string())
    }

    // ── Window geometry (persisted for the GUI frontend) ────────────────

    pub fn window_size(&self) -> (u32, u32) {
        let width = self.get_int("window", "width").unwrap_or(1280) as u32;
        let height = self.get_int("window", "height").unwrap_or(720) as u32;
        (width, height)
    }

    pub fn set_window_size(&self, width: u32, height: u32) -> Result<(), StoreError> {
        self.set_value("window", "width", toml::Value::Integer(width as i64))?;
        self.set_value("window", "height", toml::Value::Integer(height as i64))
    }

    // ── Proxy ───────────────────────────────────────────────────────────

    pub fn proxy(&self) -> ProxySettings {
        ProxySettings {
            url: self.get_str("proxy", "url"),
            username: self.get_str("proxy", "username"),
            password: self.get_str("proxy", "password"),
        }
    }

    // ── Generic dotted-key access (CLI `config get|set`) ────────────────

    /// Read any `section.key` as a display string.
    pub fn get(&self, dotted_key: &str) -> Option<String> {
        let (section, key) = dotted_key.split_once('.')?;
        let doc = self.load_doc();
        let value = doc.get(section)?.get(key)?;
        Some(render_value(value))
    }

    /// Write any `section.key`. Values that parse as integers or booleans
    /// are stored typed; everything else is stored as a string.
    pub fn set(&self, dotted_key: &str, value: &str) -> Result<(), StoreError> {
        let (section, key) = dotted_key
            .split_once('.')
            .ok_or_else(|| StoreError::config(format!("expected section.key, got '{dotted_key}'")))?;
        let typed = if let Ok(n) = value.parse::<i64>() {
            toml::Value::Integer(n)
        } else if let Ok(b) = value.parse::<bool>() {
            toml::Value::Boolean(b)
        } else {
            toml::Value::String(value.to_string())
        };
        self.set_value(section, key, typed)
    }

    // ── Document plumbing ───────────────────────────────────────────────

    fn load_doc(&self) -> toml::Value {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents
                .parse()
                .unwrap_or_else(|_| toml::Value::Table(Default::default())),
            Err(_) => toml::Value::Table(Default::default()),
        }
    }

    fn set_value(&self, section: &str, key: &str, value: toml::Value) -> Result<(), StoreError> {
        let mut doc = self.load_doc();
        let table = doc
            .as_table_mut()
            .ok_or_else(|| StoreError::config("preferences root is not a table"))?;
        let section_value = table
            .entry(section)
            .or_insert_with(|| toml::Value::Table(Default::default()));
        let section_table = section_value
            .as_table_mut()
            .ok_or_else(|| StoreError::config(format!("[{section}] is not a table")))?;
        section_table.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = toml::to_string_pretty(&doc)
            .map_err(|err| StoreError::config(format!("could not serialize preferences: {err}")))?;
        let tmp = self.path.with_extension("conf.tmp");
        std::fs::write(&tmp, &serialized)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn get_str(&self, section: &str, key: &str) -> Option<String> {
        let doc = self.load_doc();
        let value = doc.get(section)?.get(key)?.as_str()?.to_string();
        if value.is_empty() { None } else { Some(value) }
    }

    fn get_int(&self, section: &str, key: &str) -> Option<i64> {
        let doc = self.load_doc();
        doc.get(section)?.get(key)?.as_integer()
    }
}

fn render_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
