//! Image loading, caching and adjacent-image preloading.
//!
//! [`ImageCache`] fetches (HTTP or local file) and decodes images into RGBA
//! buffers kept in an LRU cache. [`HttpPreloader`] is the [`Preloader`] the
//! engine uses in production: it warms the cache in background tasks and
//! never reports failures back to the caller.

use crate::models::ImageRecord;
use lru::LruCache;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;

/// Best-effort request to have an image ready before it is displayed.
///
/// Implementations must not block and must swallow their own failures.
#[cfg_attr(test, mockall::automock)]
pub trait Preloader: Send + Sync {
    fn preload(&self, record: &ImageRecord);
}

/// Preloader that does nothing, used when preloading is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPreloader;

impl Preloader for NoopPreloader {
    fn preload(&self, _record: &ImageRecord) {}
}

/// Errors that can occur while loading an image
#[derive(Error, Debug)]
pub enum ImageLoadError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server answered {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Failed to read image file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Decoder task failed: {0}")]
    Task(String),

    #[error("Image has no locator")]
    MissingLocator,
}

/// An image decoded to 8-bit RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl DecodedImage {
    pub fn size_bytes(&self) -> usize {
        self.rgba.len()
    }
}

/// Bounded cache of decoded images keyed by locator.
pub struct ImageCache {
    client: reqwest::Client,
    entries: Mutex<LruCache<String, Arc<DecodedImage>>>,
}

impl ImageCache {
    pub fn new(max_images: usize, request_timeout: Duration) -> Result<Self, ImageLoadError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        let capacity = NonZeroUsize::new(max_images).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            client,
            entries: Mutex::new(LruCache::new(capacity)),
        })
    }

    pub fn get(&self, locator: &str) -> Option<Arc<DecodedImage>> {
        self.lock_entries().get(locator).cloned()
    }

    pub fn contains(&self, locator: &str) -> bool {
        self.lock_entries().contains(locator)
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert(&self, locator: impl Into<String>, image: DecodedImage) -> Arc<DecodedImage> {
        let image = Arc::new(image);
        self.lock_entries().put(locator.into(), Arc::clone(&image));
        image
    }

    /// Return the cached image or fetch and decode it.
    ///
    /// `http://` and `https://` locators are downloaded; anything else is read
    /// from the local filesystem.
    pub async fn load(&self, locator: &str) -> Result<Arc<DecodedImage>, ImageLoadError> {
        if locator.is_empty() {
            return Err(ImageLoadError::MissingLocator);
        }
        if let Some(image) = self.get(locator) {
            return Ok(image);
        }

        let bytes = if locator.starts_with("http://") || locator.starts_with("https://") {
            let response = self.client.get(locator).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ImageLoadError::Status {
                    status: status.as_u16(),
                    url: locator.to_string(),
                });
            }
            response.bytes().await?.to_vec()
        } else {
            tokio::fs::read(locator).await?
        };

        let decoded = tokio::task::spawn_blocking(move || decode(&bytes))
            .await
            .map_err(|e| ImageLoadError::Task(e.to_string()))??;

        tracing::debug!(
            "Loaded {} ({}x{}, {} bytes)",
            locator,
            decoded.width,
            decoded.height,
            decoded.size_bytes()
        );
        Ok(self.insert(locator, decoded))
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, LruCache<String, Arc<DecodedImage>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decode encoded image bytes into RGBA.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, ImageLoadError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    Ok(DecodedImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}

/// Warms an [`ImageCache`] from background tasks.
#[derive(Clone)]
pub struct HttpPreloader {
    cache: Arc<ImageCache>,
    runtime: Handle,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl HttpPreloader {
    pub fn new(cache: Arc<ImageCache>, runtime: Handle) -> Self {
        Self {
            cache,
            runtime,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

impl Preloader for HttpPreloader {
    fn preload(&self, record: &ImageRecord) {
        let locator = record.locator.clone();
        if locator.is_empty() || self.cache.contains(&locator) {
            return;
        }
        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if !in_flight.insert(locator.clone()) {
                return;
            }
        }

        let cache = Arc::clone(&self.cache);
        let in_flight = Arc::clone(&self.in_flight);
        let id = record.id.clone();
        self.runtime.spawn(async move {
            match cache.load(&locator).await {
                Ok(_) => tracing::trace!("Preloaded image {}", id),
                Err(e) => tracing::debug!("Preload of image {} failed: {}", id, e),
            }
            in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&locator);
        });
    }
}
