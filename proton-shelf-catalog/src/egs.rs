//! Epic Games Store product descriptions.
//!
//! The storefront content API is keyed by product slug. Descriptions churn,
//! so the cache window is one hour rather than the thirty days the other
//! catalogs get.

use std::sync::Arc;

use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};

use proton_shelf_lib::cache::EGS_DESCRIPTION_TTL;
use proton_shelf_lib::download::DEFAULT_HTTP_TIMEOUT;
use proton_shelf_lib::{Cache, Downloader};

use crate::error::CatalogError;

const CONTENT_URL: &str = "https://store-content.ak.epicgames.com/api";

#[derive(Serialize, Deserialize)]
struct CachedDescription {
    description: String,
    timestamp: i64,
}

/// EGS content access, cache-first per slug.
pub struct EgsCatalog {
    cache: Cache,
    downloader: Arc<Downloader>,
}

impl EgsCatalog {
    pub fn new(cache: Cache, downloader: Arc<Downloader>) -> Self {
        Self { cache, downloader }
    }

    /// Fetch the product description for a slug, cache-first.
    ///
    /// Returns `None` when the product page has no usable description or the
    /// network is unavailable (logged, not fatal).
    pub async fn fetch_description(
        &self,
        slug: &str,
        lang: &str,
    ) -> Result<Option<String>, CatalogError> {
        let key = description_key(slug);
        if let Some(cached) = self
            .cache
            .get_json::<CachedDescription>(&key, EGS_DESCRIPTION_TTL)
        {
            return Ok(Some(cached.description));
        }

        let url = format!("{CONTENT_URL}/{lang}/content/products/{slug}");
        let body = match self.downloader.get_text(&url, DEFAULT_HTTP_TIMEOUT).await {
            Ok(body) => body,
            Err(err) => {
                warn!("egs content for {slug} unavailable: {err}");
                return Ok(None);
            }
        };

        let Some(description) = parse_product_description(&body)? else {
            return Ok(None);
        };
        self.cache.put_json(
            &key,
            &CachedDescription {
                description: description.clone(),
                timestamp: Utc::now().timestamp(),
            },
        )?;
        Ok(Some(description))
    }
}

pub fn description_key(slug: &str) -> String {
    format!("egs_app_{slug}.json")
}

/// URL-safe slug for a product title: lower-case, dash-joined, ASCII only.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Pull the description off a product page payload.
///
/// The about block of the first page wins; `shortDescription` is the
/// fallback field.
fn parse_product_description(body: &str) -> Result<Option<String>, CatalogError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let about = value
        .get("pages")
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("data"))
        .and_then(|d| d.get("about"));
    let description = about
        .and_then(|a| a.get("description"))
        .and_then(|d| d.as_str())
        .filter(|d| !d.trim().is_empty())
        .or_else(|| {
            about
                .and_then(|a| a.get("shortDescription"))
                .and_then(|d| d.as_str())
        });
    Ok(description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proton_shelf_lib::ConfigStore;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, EgsCatalog) {
        let tmp = TempDir::new().unwrap();
        let cache = Cache::new(tmp.path().join("cache"));
        let config = Arc::new(ConfigStore::new(tmp.path().join("conf.toml")));
        let catalog = EgsCatalog::new(cache, Arc::new(Downloader::new(config)));
        (tmp, catalog)
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Alan Wake 2"), "alan-wake-2");
        assert_eq!(slugify("Hades II"), "hades-ii");
        assert_eq!(slugify("  Control: Ultimate Edition  "), "control-ultimate-edition");
        assert_eq!(slugify("F.I.S.T."), "f-i-s-t");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_parse_description_about_block() {
        let body = r#"{"pages":[{"data":{"about":{
            "description":"A mind-bending thriller.",
            "shortDescription":"short"}}}]}"#;
        let desc = parse_product_description(body).unwrap().unwrap();
        assert_eq!(desc, "A mind-bending thriller.");
    }

    #[test]
    fn test_parse_description_short_fallback() {
        let body = r#"{"pages":[{"data":{"about":{"shortDescription":"short"}}}]}"#;
        let desc = parse_product_description(body).unwrap().unwrap();
        assert_eq!(desc, "short");

        // Whitespace-only descriptions fall through to the short field.
        let body =
            r#"{"pages":[{"data":{"about":{"description":"  ","shortDescription":"short"}}}]}"#;
        let desc = parse_product_description(body).unwrap().unwrap();
        assert_eq!(desc, "short");
    }

    #[test]
    fn test_parse_description_malformed_is_error() {
        assert!(parse_product_description("not json").is_err());
    }

    #[test]
    fn test_parse_description_missing() {
        let body = r#"{"pages":[]}"#;
        assert!(parse_product_description(body).unwrap().is_none());
        let body = r#"{}"#;
        assert!(parse_product_description(body).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_description_from_cache() {
        let (_tmp, catalog) = fixture();
        catalog
            .cache
            .put_json(
                &description_key("alan-wake-2"),
                &CachedDescription {
                    description: "cached".to_string(),
                    timestamp: 1,
                },
            )
            .unwrap();

        let desc = catalog
            .fetch_description("alan-wake-2", "en")
            .await
            .unwrap();
        assert_eq!(desc.as_deref(), Some("cached"));
    }
}
