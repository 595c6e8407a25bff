//! Bounded-concurrency HTTP transfer with per-URL coalescing.
//!
//! One `Downloader` is shared by the whole engine. At most
//! [`MAX_CONCURRENT_TRANSFERS`] requests run at a time, concurrent requests
//! for the same URL collapse into a single transfer whose result every
//! waiter receives, and file writes go through a `.partial` temp file so a
//! torn download never lands at the destination path.
//!
//! Proxy settings are re-read from the preferences file on every request,
//! so a config change takes effect without restarting the engine.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, OnceCell, Semaphore, mpsc};

use crate::config::ConfigStore;
use crate::error::StoreError;

/// Default timeout for small API fetches.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for large artifact downloads (CLI binaries, cover art).
pub const ARTIFACT_TIMEOUT: Duration = Duration::from_secs(300);

/// Width of the transfer pool.
pub const MAX_CONCURRENT_TRANSFERS: usize = 4;

/// Progress report for one in-flight transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub url: String,
    pub bytes_done: u64,
    pub total_bytes: Option<u64>,
    pub bytes_per_sec: u64,
}

struct ProxyState {
    /// Effective proxy URL the client was built with; empty means direct.
    key: String,
    client: reqwest::Client,
}

/// Shared HTTP fetcher. Cheap to share via `Arc`.
pub struct Downloader {
    config: Arc<ConfigStore>,
    proxy_state: Mutex<Option<ProxyState>>,
    in_flight: Mutex<HashMap<String, Arc<OnceCell<PathBuf>>>>,
    permits: Semaphore,
    progress: std::sync::Mutex<Option<mpsc::UnboundedSender<TransferEvent>>>,
}

impl Downloader {
    pub fn new(config: Arc<ConfigStore>) -> Self {
        Self {
            config,
            proxy_state: Mutex::new(None),
            in_flight: Mutex::new(HashMap::new()),
            permits: Semaphore::new(MAX_CONCURRENT_TRANSFERS),
            progress: std::sync::Mutex::new(None),
        }
    }

    /// Route transfer progress to `sink`; replaces any previous sink.
    pub fn set_progress(&self, sink: mpsc::UnboundedSender<TransferEvent>) {
        if let Ok(mut guard) = self.progress.lock() {
            *guard = Some(sink);
        }
    }

    /// Fetch `url` into `dest`.
    ///
    /// An existing destination short-circuits without touching the network.
    /// Concurrent calls for the same URL coalesce: the first caller performs
    /// the transfer, everyone else awaits the same outcome. A completed
    /// transfer is memoized for the process lifetime; a failed one is
    /// retried by the next caller.
    pub async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        timeout: Duration,
    ) -> Result<PathBuf, StoreError> {
        if dest.exists() {
            return Ok(dest.to_path_buf());
        }
        let cell = {
            let mut map = self.in_flight.lock().await;
            map.entry(url.to_string()).or_default().clone()
        };
        cell.get_or_try_init(|| self.transfer(url, dest, timeout))
            .await
            .cloned()
    }

    /// Schedule a fetch on the pool; `on_done` fires with the outcome.
    pub fn fetch_async<F>(
        self: &Arc<Self>,
        url: impl Into<String>,
        dest: impl Into<PathBuf>,
        timeout: Duration,
        on_done: F,
    ) where
        F: FnOnce(Result<PathBuf, StoreError>) + Send + 'static,
    {
        let downloader = Arc::clone(self);
        let url = url.into();
        let dest = dest.into();
        tokio::spawn(async move {
            let result = downloader.fetch(&url, &dest, timeout).await;
            on_done(result);
        });
    }

    /// GET a small API payload straight into memory.
    ///
    /// No coalescing; callers cache the parsed result themselves.
    pub async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, StoreError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| StoreError::cache("transfer pool closed"))?;
        match tokio::time::timeout(timeout, self.get_text_inner(url)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(timeout)),
        }
    }

    async fn get_text_inner(&self, url: &str) -> Result<String, StoreError> {
        let client = self.client().await?;
        let response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Http(status.as_u16()));
        }
        Ok(response.text().await?)
    }

    async fn transfer(
        &self,
        url: &str,
        dest: &Path,
        timeout: Duration,
    ) -> Result<PathBuf, StoreError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| StoreError::cache("transfer pool closed"))?;
        let result = match tokio::time::timeout(timeout, self.transfer_inner(url, dest)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(timeout)),
        };
        if result.is_err() {
            let _ = std::fs::remove_file(partial_path(dest));
        }
        result
    }

    async fn transfer_inner(&self, url: &str, dest: &Path) -> Result<PathBuf, StoreError> {
        let client = self.client().await?;
        let mut response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Http(status.as_u16()));
        }
        let total_bytes = response.content_length();

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let partial = partial_path(dest);
        let mut file = std::fs::File::create(&partial)?;
        let started = Instant::now();
        let mut bytes_done = 0u64;

        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk)?;
            bytes_done += chunk.len() as u64;
            let elapsed = started.elapsed().as_secs_f64();
            let bytes_per_sec = if elapsed > 0.0 {
                (bytes_done as f64 / elapsed) as u64
            } else {
                0
            };
            self.emit(TransferEvent {
                url: url.to_string(),
                bytes_done,
                total_bytes,
                bytes_per_sec,
            });
        }

        file.flush()?;
        drop(file);
        std::fs::rename(&partial, dest)?;
        log::debug!("fetched {url} -> {}", dest.display());
        Ok(dest.to_path_buf())
    }

    /// Handle to the shared client, rebuilt whenever proxy settings change.
    async fn client(&self) -> Result<reqwest::Client, StoreError> {
        let proxy_url = self.config.proxy().effective_url().unwrap_or_default();
        let mut state = self.proxy_state.lock().await;
        if let Some(current) = state.as_ref() {
            if current.key == proxy_url {
                return Ok(current.client.clone());
            }
        }
        let mut builder = reqwest::Client::builder();
        if !proxy_url.is_empty() {
            builder = builder.proxy(reqwest::Proxy::all(&proxy_url)?);
            log::debug!("transfer client rebuilt with proxy");
        }
        let client = builder.build()?;
        *state = Some(ProxyState {
            key: proxy_url,
            client: client.clone(),
        });
        Ok(client)
    }

    fn emit(&self, event: TransferEvent) {
        if let Ok(guard) = self.progress.lock() {
            if let Some(sink) = guard.as_ref() {
                let _ = sink.send(event);
            }
        }
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut partial = dest.to_path_buf().into_os_string();
    partial.push(".partial");
    PathBuf::from(partial)
}
