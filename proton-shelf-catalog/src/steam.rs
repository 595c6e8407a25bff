//! Steam app index and per-app detail records.
//!
//! The full app list is one catalog snapshot cached for thirty days; detail
//! records come from the storefront appdetails endpoint and are cached per
//! app. DLC and demo records point back at their parent app; `fetch_detail`
//! follows that redirect one hop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use proton_shelf_core::types::{CatalogRecord, ControllerSupport, DetailRecord, SourceCatalog};
use proton_shelf_lib::cache::{CATALOG_TTL, DETAIL_TTL};
use proton_shelf_lib::download::DEFAULT_HTTP_TIMEOUT;
use proton_shelf_lib::{Cache, Downloader};

use crate::error::CatalogError;
use crate::index::NameIndex;

const APP_LIST_URL: &str = "https://api.steampowered.com/ISteamApps/GetAppList/v2/";
const DETAIL_URL: &str = "https://store.steampowered.com/api/appdetails";

/// Cache key for the raw app list as delivered by GetAppList.
pub const APP_LIST_KEY: &str = "steam_apps.json";
/// Cache key for the derived index, in snapshot order.
pub const APP_INDEX_KEY: &str = "steam_apps_index.json";

/// Network budget for the full catalog snapshot; the payload is large.
pub const SNAPSHOT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// A resolved detail record together with the app id it was served for.
///
/// The id differs from the requested one when the parent redirect applied;
/// callers key covers and anti-cheat lookups off this id.
#[derive(Debug, Clone, PartialEq)]
pub struct SteamDetail {
    pub appid: u32,
    pub detail: DetailRecord,
}

#[derive(Deserialize)]
struct AppListResponse {
    applist: AppListBody,
}

#[derive(Deserialize)]
struct AppListBody {
    #[serde(default)]
    apps: Vec<AppListItem>,
}

#[derive(Serialize, Deserialize)]
struct AppListItem {
    appid: u32,
    #[serde(default)]
    name: String,
}

/// Per-app detail fields as persisted in the cache, before cover synthesis.
#[derive(Debug, Serialize, Deserialize)]
struct StoredDetail {
    #[serde(default)]
    description: String,
    #[serde(default)]
    controller_support: Option<String>,
    #[serde(default)]
    parent_appid: Option<u32>,
    fetched_at: i64,
}

/// Steam catalog access: app index plus per-app detail records.
pub struct SteamCatalog {
    cache: Cache,
    downloader: Arc<Downloader>,
}

impl SteamCatalog {
    pub fn new(cache: Cache, downloader: Arc<Downloader>) -> Self {
        Self { cache, downloader }
    }

    /// Load the app index, cache-first.
    ///
    /// Freshness order: derived index file, raw list file, network snapshot.
    /// A fetched snapshot persists both files so the next load skips the
    /// derivation. Offline with a cold cache yields an empty index.
    pub async fn load_app_index(&self) -> Result<NameIndex, CatalogError> {
        if let Some(records) = self
            .cache
            .get_json::<Vec<CatalogRecord>>(APP_INDEX_KEY, CATALOG_TTL)
        {
            debug!("steam index: {} records from cache", records.len());
            return Ok(NameIndex::from_records(records));
        }

        let items = match self
            .cache
            .get_json::<Vec<AppListItem>>(APP_LIST_KEY, CATALOG_TTL)
        {
            Some(items) => items,
            None => match self.fetch_app_list().await {
                Ok(items) => items,
                Err(err) => {
                    warn!("steam app list unavailable: {err}");
                    return Ok(NameIndex::from_records(Vec::new()));
                }
            },
        };

        let records = derive_records(items);
        self.cache.put_json(APP_INDEX_KEY, &records)?;
        info!("steam index: {} records", records.len());
        Ok(NameIndex::from_records(records))
    }

    async fn fetch_app_list(&self) -> Result<Vec<AppListItem>, CatalogError> {
        let body = self
            .downloader
            .get_text(APP_LIST_URL, SNAPSHOT_HTTP_TIMEOUT)
            .await?;
        let response: AppListResponse = serde_json::from_str(&body)?;
        let items = response.applist.apps;
        self.cache.put_json(APP_LIST_KEY, &items)?;
        Ok(items)
    }

    /// Fetch the detail record for an app, cache-first.
    ///
    /// Returns `None` when the storefront has no data for the id or the
    /// network is unavailable (logged, not fatal). When the record points at
    /// a parent app the parent's record is returned instead, one hop only.
    pub async fn fetch_detail(
        &self,
        appid: u32,
        lang: &str,
    ) -> Result<Option<SteamDetail>, CatalogError> {
        let Some(stored) = self.stored_detail(appid, lang).await? else {
            return Ok(None);
        };

        if let Some(parent) = stored.parent_appid.filter(|&p| p != appid) {
            debug!("steam app {appid} defers to parent {parent}");
            if let Some(parent_stored) = self.stored_detail(parent, lang).await? {
                return Ok(Some(materialize(parent, parent_stored)));
            }
        }

        Ok(Some(materialize(appid, stored)))
    }

    async fn stored_detail(
        &self,
        appid: u32,
        lang: &str,
    ) -> Result<Option<StoredDetail>, CatalogError> {
        let key = detail_key(appid);
        if let Some(stored) = self.cache.get_json::<StoredDetail>(&key, DETAIL_TTL) {
            return Ok(Some(stored));
        }

        let url = format!("{DETAIL_URL}?appids={appid}&l={lang}");
        let body = match self.downloader.get_text(&url, DEFAULT_HTTP_TIMEOUT).await {
            Ok(body) => body,
            Err(err) => {
                warn!("appdetails for {appid} unavailable: {err}");
                return Ok(None);
            }
        };

        let Some(stored) = parse_appdetails(&body, appid)? else {
            return Ok(None);
        };
        self.cache.put_json(&key, &stored)?;
        Ok(Some(stored))
    }
}

/// Canonical cover-art URL for an app id.
pub fn cover_url(appid: u32) -> String {
    format!("https://steamcdn-a.akamaihd.net/steam/apps/{appid}/library_600x900_2x.jpg")
}

fn detail_key(appid: u32) -> String {
    format!("steam_app_{appid}.json")
}

fn materialize(appid: u32, stored: StoredDetail) -> SteamDetail {
    SteamDetail {
        appid,
        detail: DetailRecord {
            description: stored.description,
            cover_url: cover_url(appid),
            controller_support: ControllerSupport::from_steam_field(
                stored.controller_support.as_deref(),
            ),
            anti_cheat_status: Default::default(),
            fetched_at: stored.fetched_at,
        },
    }
}

fn derive_records(items: Vec<AppListItem>) -> Vec<CatalogRecord> {
    items
        .into_iter()
        .filter(|item| !item.name.trim().is_empty())
        .map(|item| CatalogRecord::new(SourceCatalog::Steam, item.appid.to_string(), item.name))
        .filter(|record| !record.normalized_name.is_empty())
        .collect()
}

/// Parse an appdetails response body down to the fields we keep.
///
/// The envelope is keyed by the decimal app id; `success: false` and missing
/// ids both yield `None`. The storefront serves `fullgame.appid` as either a
/// string or a number.
fn parse_appdetails(body: &str, appid: u32) -> Result<Option<StoredDetail>, CatalogError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let Some(envelope) = value.get(appid.to_string().as_str()) else {
        return Ok(None);
    };
    if !envelope
        .get("success")
        .and_then(|s| s.as_bool())
        .unwrap_or(false)
    {
        return Ok(None);
    }
    let Some(data) = envelope.get("data") else {
        return Ok(None);
    };

    let description = data
        .get("short_description")
        .and_then(|d| d.as_str())
        .unwrap_or_default()
        .to_string();
    let controller_support = data
        .get("controller_support")
        .and_then(|c| c.as_str())
        .map(str::to_string);
    let parent_appid = data
        .get("fullgame")
        .and_then(|f| f.get("appid"))
        .and_then(appid_value);

    Ok(Some(StoredDetail {
        description,
        controller_support,
        parent_appid,
        fetched_at: Utc::now().timestamp(),
    }))
}

fn appid_value(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    }
}
