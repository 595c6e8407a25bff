//! Desktop-shortcut discovery.
//!
//! The wrapper drops one `.desktop` file per installed game into its data
//! directory. Each shortcut's `Exec=` line wraps a Windows executable; the
//! scanner tokenizes it and pulls that payload out as the executable hint.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use proton_shelf_core::exec::{tokenize, wrapped_windows_exe};
use proton_shelf_core::types::{Origin, RawDiscovery};
use proton_shelf_lib::AppDirs;

use crate::error::SourceError;

/// Environment override for the shortcut directory.
pub const DIR_ENV: &str = "PORTPROTON_DIR";

/// Flatpak data directory, the default install location.
const FLATPAK_DATA_DIR: &str = ".var/app/ru.linux_gaming.PortProton/data";

/// `Name=` value of the wrapper's own launcher shortcut.
const LAUNCHER_SELF_NAME: &str = "PortProton";

#[derive(Debug, Default, PartialEq)]
struct DesktopEntry {
    name: Option<String>,
    comment: Option<String>,
    icon: Option<String>,
    exec: Option<String>,
}

/// Scans the wrapper's shortcut directory for game entries.
pub struct DesktopShortcutScanner {
    redirect_path: PathBuf,
    dir_override: Option<PathBuf>,
}

impl DesktopShortcutScanner {
    pub fn new(dirs: &AppDirs) -> Self {
        Self {
            redirect_path: dirs.portproton_redirect_path(),
            dir_override: None,
        }
    }

    /// Scan a fixed directory, skipping resolution. Test entry point.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            redirect_path: PathBuf::new(),
            dir_override: Some(dir.into()),
        }
    }

    /// Resolve the shortcut directory: environment override, then the
    /// plain-text redirect file, then the flatpak default. `None` when no
    /// candidate exists on disk.
    pub fn shortcut_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.dir_override {
            return dir.is_dir().then(|| dir.clone());
        }
        if let Ok(dir) = std::env::var(DIR_ENV) {
            let path = PathBuf::from(dir);
            if path.is_dir() {
                return Some(path);
            }
        }
        if let Some(path) = redirect_target(&self.redirect_path) {
            if path.is_dir() {
                return Some(path);
            }
        }
        let flatpak = dirs::home_dir()?.join(FLATPAK_DATA_DIR);
        flatpak.is_dir().then_some(flatpak)
    }

    /// Collect one discovery per game shortcut. A missing directory is an
    /// empty library, not an error.
    pub fn scan(&self) -> Result<Vec<RawDiscovery>, SourceError> {
        let Some(dir) = self.shortcut_dir() else {
            debug!("no shortcut directory found, library is empty");
            return Ok(Vec::new());
        };

        let mut discoveries = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("desktop") {
                continue;
            }
            match self.read_shortcut(&path) {
                Ok(Some(discovery)) => discoveries.push(discovery),
                Ok(None) => {}
                Err(err) => warn!("skipping shortcut {}: {err}", path.display()),
            }
        }
        // Directory order is not stable; key order is.
        discoveries.sort_by(|a, b| a.origin_key.cmp(&b.origin_key));
        Ok(discoveries)
    }

    fn read_shortcut(&self, path: &Path) -> Result<Option<RawDiscovery>, SourceError> {
        let src = std::fs::read_to_string(path)?;
        let entry = parse_desktop_entry(&src);

        if entry.name.as_deref() == Some(LAUNCHER_SELF_NAME) {
            return Ok(None);
        }
        let Some(exec) = entry.exec.as_deref() else {
            return Err(SourceError::parse("shortcut has no Exec line"));
        };
        let tokens = tokenize(exec);
        if tokens.is_empty() {
            return Err(SourceError::parse("shortcut Exec line is empty"));
        }

        let mut discovery = RawDiscovery::new(
            Origin::DesktopShortcut,
            path.to_string_lossy().into_owned(),
            tokens.clone(),
        );
        if let Some(name) = entry.name.or(entry.comment) {
            discovery = discovery.with_display_name(name);
        }
        if let Some(icon) = entry.icon {
            discovery = discovery.with_icon(icon);
        }
        if let Some(exe) = wrapped_windows_exe(&tokens) {
            discovery = discovery.with_executable(PathBuf::from(exe));
        }
        Ok(Some(discovery))
    }
}

/// First non-comment line of the redirect file, as an absolute path.
fn redirect_target(redirect_path: &Path) -> Option<PathBuf> {
    let content = std::fs::read_to_string(redirect_path).ok()?;
    content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
}

/// Parse the `[Desktop Entry]` section of a shortcut file. Other sections
/// (actions, translations) are ignored.
fn parse_desktop_entry(src: &str) -> DesktopEntry {
    let mut parsed = DesktopEntry::default();
    let mut in_entry = false;

    for raw in src.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_entry = section == "Desktop Entry";
            continue;
        }
        if !in_entry {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Name" => parsed.name = Some(value.to_string()),
            "Comment" => parsed.comment = Some(value.to_string()),
            "Icon" => parsed.icon = Some(value.to_string()),
            "Exec" => parsed.exec = Some(value.to_string()),
            _ => {}
        }
    }
    parsed
}
