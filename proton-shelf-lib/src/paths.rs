//! Well-known filesystem locations.
//!
//! The engine shares its on-disk layout with the PortProtonQT frontend so
//! both can read each other's state:
//!
//! ```text
//! <user-cache>/PortProtonQT/        cache root (catalog snapshots, covers, stats)
//! <user-config>/PortProtonQT.conf   preferences
//! <user-data>/PortProtonQT/         custom_data overlay root
//! ```

use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Directory name shared with the desktop frontend.
const APP_DIR_NAME: &str = "PortProtonQT";

/// Resolved user directories for cache, config and data.
#[derive(Debug, Clone)]
pub struct AppDirs {
    cache_root: PathBuf,
    config_dir: PathBuf,
    data_root: PathBuf,
}

impl AppDirs {
    /// Resolve from the platform's standard user directories.
    pub fn resolve() -> Result<Self, StoreError> {
        let cache = dirs::cache_dir()
            .ok_or_else(|| StoreError::config("could not determine user cache directory"))?;
        let config = dirs::config_dir()
            .ok_or_else(|| StoreError::config("could not determine user config directory"))?;
        let data = dirs::data_dir()
            .ok_or_else(|| StoreError::config("could not determine user data directory"))?;
        Ok(Self::at(cache.join(APP_DIR_NAME), config, data.join(APP_DIR_NAME)))
    }

    /// Build from explicit roots. Tests point this at temp directories.
    pub fn at(
        cache_root: impl Into<PathBuf>,
        config_dir: impl Into<PathBuf>,
        data_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            cache_root: cache_root.into(),
            config_dir: config_dir.into(),
            data_root: data_root.into(),
        }
    }

    /// `<user-cache>/PortProtonQT` — cache files, cover images, play stats.
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// `<user-config>/PortProtonQT.conf` — the preferences file.
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(format!("{APP_DIR_NAME}.conf"))
    }

    /// `<user-config>/PortProton.conf` — plain-text redirect to a custom
    /// wrapper install location, written by the wrapper's installer.
    pub fn portproton_redirect_path(&self) -> PathBuf {
        self.config_dir.join("PortProton.conf")
    }

    /// `<user-data>/PortProtonQT/custom_data` — per-executable overlay dirs.
    pub fn custom_data_dir(&self) -> PathBuf {
        self.data_root.join("custom_data")
    }

    /// `<cache-root>/images` — downloaded cover art.
    pub fn images_dir(&self) -> PathBuf {
        self.cache_root.join("images")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_under_explicit_roots() {
        let dirs = AppDirs::at("/tmp/c/PortProtonQT", "/tmp/cfg", "/tmp/d/PortProtonQT");
        assert_eq!(dirs.cache_root(), Path::new("/tmp/c/PortProtonQT"));
        assert_eq!(dirs.config_path(), Path::new("/tmp/cfg/PortProtonQT.conf"));
        assert_eq!(dirs.portproton_redirect_path(), Path::new("/tmp/cfg/PortProton.conf"));
        assert_eq!(dirs.custom_data_dir(), Path::new("/tmp/d/PortProtonQT/custom_data"));
        assert_eq!(dirs.images_dir(), Path::new("/tmp/c/PortProtonQT/images"));
    }
}
