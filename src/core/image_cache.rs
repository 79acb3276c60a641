//! Write-once local cache of exhibit images
//!
//! Keyed by the source URL with path separators replaced. Entries are
//! never evicted during a session.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use crate::error::PlacenoteError;

/// Downloads raw image bytes
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PlacenoteError>;
}

/// HTTP(S) fetcher backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, PlacenoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlacenoteError::image_fetch("", e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PlacenoteError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PlacenoteError::image_fetch(url, e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PlacenoteError::image_fetch(url, e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Cache file name for an image reference
pub fn cache_key(url: &str) -> String {
    url.replace(['/', '\\'], "-")
}

/// One async lock per cache key; at most one fill in flight per key
type FillLocks = Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>;

/// Resolves image references to local files, downloading at most once
#[derive(Clone)]
pub struct ImageCache {
    dir: PathBuf,
    fetcher: Arc<dyn ImageFetcher>,
    fills: FillLocks,
}

impl ImageCache {
    pub fn new(dir: impl Into<PathBuf>, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            dir: dir.into(),
            fetcher,
            fills: Arc::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Local path under which `url` is (or would be) cached
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(cache_key(url))
    }

    /// Local file for an image reference.
    ///
    /// Empty reference: `None`. Local path: used as is. URL: cached copy,
    /// fetched and stored on first use.
    pub async fn resolve(&self, reference: &str) -> Result<Option<PathBuf>, PlacenoteError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Ok(None);
        }

        if let Some(local) = local_path(reference) {
            return if exists(&local).await {
                Ok(Some(local))
            } else {
                Err(PlacenoteError::image_fetch(reference, "local image not found"))
            };
        }

        let cached = self.path_for(reference);
        if exists(&cached).await {
            debug!(path = %cached.display(), "image cache hit");
            return Ok(Some(cached));
        }

        // Concurrent resolves of one URL wait for the first fill
        let fill = self.fill_lock(reference);
        let _filling = fill.lock().await;
        if exists(&cached).await {
            debug!(path = %cached.display(), "image filled by concurrent resolve");
            return Ok(Some(cached));
        }

        let bytes = self.fetcher.fetch(reference).await?;
        self.store(&cached, &bytes).await?;
        debug!(path = %cached.display(), bytes = bytes.len(), "image cached");
        Ok(Some(cached))
    }

    fn fill_lock(&self, reference: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut fills = self.fills.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(fills.entry(cache_key(reference)).or_default())
    }

    async fn store(&self, path: &Path, bytes: &[u8]) -> Result<(), PlacenoteError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(PlacenoteError::Cache)?;

        // Readers never see a half-written file
        let mut partial = path.as_os_str().to_owned();
        partial.push(".part");
        let partial = PathBuf::from(partial);
        tokio::fs::write(&partial, bytes)
            .await
            .map_err(PlacenoteError::Cache)?;
        tokio::fs::rename(&partial, path)
            .await
            .map_err(PlacenoteError::Cache)
    }
}

/// References without a scheme, or with `file://`, name local files
fn local_path(reference: &str) -> Option<PathBuf> {
    if let Some(path) = reference.strip_prefix("file://") {
        return Some(PathBuf::from(path));
    }
    if reference.contains("://") {
        return None;
    }
    Some(PathBuf::from(reference))
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves fixed bytes and counts calls
    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ImageFetcher for CountingFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, PlacenoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PlacenoteError::image_fetch(url, "offline"));
            }
            Ok(b"\xFF\xD8jpeg".to_vec())
        }
    }

    #[test]
    fn test_cache_key_replaces_separators() {
        assert_eq!(
            cache_key("https://example.org/img/bowl.jpg"),
            "https:--example.org-img-bowl.jpg"
        );
    }

    #[tokio::test]
    async fn test_fetch_once_then_reuse() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(CountingFetcher::default());
        let cache = ImageCache::new(dir.path(), fetcher.clone());
        let url = "https://example.org/img/bowl.jpg";

        let first = cache.resolve(url).await.unwrap().unwrap();
        let second = cache.resolve(url).await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(first, dir.path().join("https:--example.org-img-bowl.jpg"));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read(&first).unwrap(), b"\xFF\xD8jpeg");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_error_and_nothing_cached() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(CountingFetcher {
            fail: true,
            ..Default::default()
        });
        let cache = ImageCache::new(dir.path(), fetcher);
        let url = "https://example.org/missing.jpg";

        assert!(cache.resolve(url).await.is_err());
        assert!(!cache.path_for(url).exists());
    }

    #[tokio::test]
    async fn test_empty_reference_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(CountingFetcher::default());
        let cache = ImageCache::new(dir.path(), fetcher.clone());

        assert_eq!(cache.resolve("  ").await.unwrap(), None);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_local_path_used_directly() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("bowl.png");
        std::fs::write(&image, b"png").unwrap();

        let fetcher = Arc::new(CountingFetcher::default());
        let cache = ImageCache::new(dir.path().join("cache"), fetcher.clone());

        let resolved = cache.resolve(image.to_str().unwrap()).await.unwrap();
        assert_eq!(resolved, Some(image.clone()));

        let via_scheme = format!("file://{}", image.display());
        assert_eq!(cache.resolve(&via_scheme).await.unwrap(), Some(image));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    /// Holds every fetch open long enough for callers to overlap
    #[derive(Default)]
    struct SlowFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageFetcher for SlowFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, PlacenoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(b"\xFF\xD8jpeg".to_vec())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resolves_fetch_once() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(SlowFetcher::default());
        let cache = ImageCache::new(dir.path(), fetcher.clone());

        for round in 0..10 {
            let url = format!("https://example.org/img/{}.jpg", round);
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let cache = cache.clone();
                    let url = url.clone();
                    tokio::spawn(async move { cache.resolve(&url).await })
                })
                .collect();

            for handle in handles {
                let path = handle.await.unwrap().unwrap().unwrap();
                assert_eq!(path, cache.path_for(&url));
                assert_eq!(std::fs::read(&path).unwrap(), b"\xFF\xD8jpeg");
            }
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 10);
    }
}
