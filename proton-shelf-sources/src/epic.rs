//! Installed-games discovery through the Epic `legendary` CLI.
//!
//! The scanner bootstraps the CLI binary into the cache root on first use,
//! then shells out to `legendary list --json` under a hard timeout. The
//! parsed list is cached for an hour so consecutive scans skip the
//! subprocess entirely.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use proton_shelf_core::types::{Origin, RawDiscovery};
use proton_shelf_lib::cache::LEGENDARY_LIST_TTL;
use proton_shelf_lib::download::ARTIFACT_TIMEOUT;
use proton_shelf_lib::{Cache, Downloader};

use crate::error::SourceError;

/// Upstream release artifact the scanner bootstraps itself with.
const LEGENDARY_URL: &str =
    "https://github.com/derrod/legendary/releases/latest/download/legendary";

/// Binary name under the cache root.
const LEGENDARY_BIN: &str = "legendary";

/// Cache key for the parsed game list.
pub const GAMES_LIST_KEY: &str = "legendary_games.json";

/// Hard ceiling on one `legendary list` invocation.
const LIST_TIMEOUT: Duration = Duration::from_secs(30);

/// One installed Epic game, as cached between scans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpicGameRecord {
    pub app_name: String,
    pub title: String,
    #[serde(default)]
    pub cover_url: Option<String>,
}

/// Scans an Epic library through the legendary CLI.
pub struct EpicScanner {
    cache: Cache,
    downloader: Arc<Downloader>,
    binary_override: Option<PathBuf>,
}

impl EpicScanner {
    pub fn new(cache: Cache, downloader: Arc<Downloader>) -> Self {
        Self {
            cache,
            downloader,
            binary_override: None,
        }
    }

    /// Use a fixed CLI binary instead of the bootstrapped one.
    pub fn with_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_override = Some(path.into());
        self
    }

    fn binary_path(&self) -> PathBuf {
        self.binary_override
            .clone()
            .unwrap_or_else(|| self.cache.path_for(LEGENDARY_BIN))
    }

    /// Collect one discovery per installed game.
    ///
    /// A fresh cached list short-circuits the subprocess; otherwise the CLI
    /// runs and its output is cached for the next hour.
    pub async fn scan(&self) -> Result<Vec<RawDiscovery>, SourceError> {
        let records = match self
            .cache
            .get_json::<Vec<EpicGameRecord>>(GAMES_LIST_KEY, LEGENDARY_LIST_TTL)
        {
            Some(records) => records,
            None => {
                let records = self.list_installed().await?;
                self.cache.put_json(GAMES_LIST_KEY, &records)?;
                records
            }
        };

        let binary = self.binary_path();
        Ok(records
            .into_iter()
            .map(|r| to_discovery(r, &binary))
            .collect())
    }

    async fn ensure_binary(&self) -> Result<PathBuf, SourceError> {
        let path = self.binary_path();
        if path.is_file() {
            return Ok(path);
        }
        if self.binary_override.is_some() {
            return Err(SourceError::unavailable(format!(
                "legendary binary missing at {}",
                path.display()
            )));
        }
        debug!("bootstrapping legendary CLI to {}", path.display());
        self.downloader
            .fetch(LEGENDARY_URL, &path, ARTIFACT_TIMEOUT)
            .await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms)?;
        }
        Ok(path)
    }

    async fn list_installed(&self) -> Result<Vec<EpicGameRecord>, SourceError> {
        let binary = self.ensure_binary().await?;
        let mut command = Command::new(&binary);
        command
            .args(["list", "--json"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            // The timeout below drops the future; take the child with it.
            .kill_on_drop(true);

        let output = tokio::time::timeout(LIST_TIMEOUT, command.output())
            .await
            .map_err(|_| SourceError::subprocess("legendary list timed out"))??;
        if !output.status.success() {
            return Err(SourceError::subprocess(format!(
                "legendary list exited with {}",
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let games = parse_game_list(&stdout)?;
        Ok(games.into_iter().map(|g| self.attach_cover(g)).collect())
    }

    fn attach_cover(&self, mut record: EpicGameRecord) -> EpicGameRecord {
        let sidecar = self
            .cache
            .path_for(&format!("metadata/{}.json", record.app_name));
        record.cover_url = sidecar_cover(&sidecar);
        record
    }
}

fn to_discovery(record: EpicGameRecord, binary: &Path) -> RawDiscovery {
    let EpicGameRecord {
        app_name,
        title,
        cover_url,
    } = record;
    let mut discovery = RawDiscovery::new(
        Origin::EpicInstalled,
        app_name.clone(),
        vec![
            binary.to_string_lossy().into_owned(),
            "launch".to_string(),
            app_name,
        ],
    )
    .with_display_name(title);
    if let Some(url) = cover_url {
        discovery = discovery.with_icon(url);
    }
    discovery
}

/// Parse `legendary list --json` output. DLC records (those that point at a
/// main game) are dropped.
fn parse_game_list(body: &str) -> Result<Vec<EpicGameRecord>, SourceError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let Some(items) = value.as_array() else {
        return Err(SourceError::parse("legendary list output is not an array"));
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        let Some(app_name) = item.get("app_name").and_then(|v| v.as_str()) else {
            continue;
        };
        let is_dlc = item
            .get("metadata")
            .and_then(|m| m.get("mainGameItem"))
            .is_some_and(|m| !m.is_null());
        if is_dlc {
            continue;
        }
        let title = item
            .get("app_title")
            .and_then(|v| v.as_str())
            .unwrap_or(app_name)
            .to_string();
        records.push(EpicGameRecord {
            app_name: app_name.to_string(),
            title,
            cover_url: None,
        });
    }
    Ok(records)
}

/// Tall box art from a legendary metadata sidecar; thumbnail as fallback.
fn sidecar_cover(path: &Path) -> Option<String> {
    let src = std::fs::read_to_string(path).ok()?;
    let value: serde_json::Value = serde_json::from_str(&src).ok()?;
    let images = value.get("metadata")?.get("keyImages")?.as_array()?;
    let url_of = |kind: &str| {
        images
            .iter()
            .find(|img| img.get("type").and_then(|t| t.as_str()) == Some(kind))
            .and_then(|img| img.get("url"))
            .and_then(|u| u.as_str())
            .map(str::to_string)
    };
    url_of("DieselGameBoxTall").or_else(|| url_of("Thumbnail"))
}
