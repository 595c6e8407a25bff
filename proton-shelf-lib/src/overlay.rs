//! User override files (custom cover, name, description).
//!
//! Each game may have a directory `<data-root>/PortProtonQT/custom_data/<exe>/`
//! whose contents shadow catalog-provided metadata. The engine only reads
//! these; the "edit shortcut" UI writes them and requests a rescan.

use std::fs;
use std::path::{Path, PathBuf};

use proton_shelf_core::Overlay;

/// Cover filenames probed inside an overlay directory, in priority order.
const COVER_NAMES: &[&str] = &["cover.png", "cover.jpg", "cover.jpeg", "cover.bmp"];

/// Read-only view over the overlay root.
#[derive(Debug, Clone)]
pub struct OverlayStore {
    root: PathBuf,
}

impl OverlayStore {
    pub fn new(custom_data_root: impl Into<PathBuf>) -> Self {
        Self {
            root: custom_data_root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load overrides for one executable basename. Absence is not an error.
    pub fn load(&self, exe_basename: &str) -> Overlay {
        let dir = self.root.join(exe_basename);
        let mut overlay = Overlay::default();
        if !dir.is_dir() {
            return overlay;
        }
        for name in COVER_NAMES {
            let path = dir.join(name);
            if path.is_file() {
                overlay.cover_path = Some(path);
                break;
            }
        }
        overlay.display_name = read_trimmed(&dir.join("name.txt"));
        overlay.description = read_trimmed(&dir.join("desc.txt"));
        overlay
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    let contents = fs::read_to_string(path).ok()?;
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn absent_directory_yields_empty_overlay() {
        let dir = TempDir::new().unwrap();
        let store = OverlayStore::new(dir.path());
        assert!(store.load("hl2").is_empty());
    }

    #[test]
    fn files_override_fields_independently() {
        let dir = TempDir::new().unwrap();
        let game_dir = dir.path().join("hl2");
        fs::create_dir_all(&game_dir).unwrap();
        fs::write(game_dir.join("name.txt"), "Half-Life 2 (Modded)\n").unwrap();
        fs::write(game_dir.join("cover.png"), b"\x89PNG").unwrap();

        let store = OverlayStore::new(dir.path());
        let overlay = store.load("hl2");
        assert_eq!(overlay.display_name.as_deref(), Some("Half-Life 2 (Modded)"));
        assert_eq!(overlay.cover_path, Some(game_dir.join("cover.png")));
        assert_eq!(overlay.description, None);
    }

    #[test]
    fn cover_priority_prefers_png() {
        let dir = TempDir::new().unwrap();
        let game_dir = dir.path().join("game");
        fs::create_dir_all(&game_dir).unwrap();
        fs::write(game_dir.join("cover.jpg"), b"j").unwrap();
        fs::write(game_dir.join("cover.png"), b"p").unwrap();

        let store = OverlayStore::new(dir.path());
        assert_eq!(store.load("game").cover_path, Some(game_dir.join("cover.png")));
    }

    #[test]
    fn whitespace_only_name_is_ignored() {
        let dir = TempDir::new().unwrap();
        let game_dir = dir.path().join("game");
        fs::create_dir_all(&game_dir).unwrap();
        fs::write(game_dir.join("name.txt"), "   \n").unwrap();

        let store = OverlayStore::new(dir.path());
        assert_eq!(store.load("game").display_name, None);
    }
}
