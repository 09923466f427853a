use crate::models::Filter;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration from `Folio.yaml`
///
/// Every section falls back to its defaults, so an empty or missing file
/// yields a usable configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub site: SiteSettings,
    pub content: ContentSettings,
    pub slideshow: SlideshowSettings,
    pub gallery: GallerySettings,
    pub cache: CacheSettings,
    pub debug_mode: bool,
}

/// Header and contact information shown around the slideshow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub title: String,
    pub subtitle: String,
    pub contact: Vec<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            title: "Portfolio".to_string(),
            subtitle: "Photography and Graphic Design".to_string(),
            contact: Vec::new(),
        }
    }
}

/// Where portfolio documents come from.
///
/// When `catalog_path` is set the local YAML catalog is used instead of the
/// CMS query API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSettings {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    pub use_cdn: bool,
    pub image_quality: u8,
    pub catalog_path: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            dataset: "production".to_string(),
            api_version: "2024-01-01".to_string(),
            use_cdn: false,
            image_quality: 90,
            catalog_path: None,
            request_timeout_secs: 15,
        }
    }
}

/// Timing and gesture thresholds of the slideshow engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideshowSettings {
    pub autoplay_interval_ms: u64,
    pub resume_delay_ms: u64,
    pub swipe_threshold_px: f32,
    pub tap_threshold_px: f32,
    pub drag_jitter_px: f32,
}

impl Default for SlideshowSettings {
    fn default() -> Self {
        Self {
            autoplay_interval_ms: default_autoplay_interval_ms(),
            resume_delay_ms: default_resume_delay_ms(),
            swipe_threshold_px: 40.0,
            tap_threshold_px: 10.0,
            drag_jitter_px: 10.0,
        }
    }
}

impl SlideshowSettings {
    pub fn autoplay_interval(&self) -> Duration {
        Duration::from_millis(self.autoplay_interval_ms.max(1))
    }

    pub fn resume_delay(&self) -> Duration {
        Duration::from_millis(self.resume_delay_ms)
    }
}

fn default_autoplay_interval_ms() -> u64 {
    3_000
}

fn default_resume_delay_ms() -> u64 {
    200
}

/// Filter shell behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GallerySettings {
    pub default_filter: Filter,
    pub show_all_filter: bool,
    pub chain_categories: bool,
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            default_filter: Filter::All,
            show_all_filter: true,
            chain_categories: false,
        }
    }
}

/// Decoded image cache bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub max_images: usize,
    pub preload_enabled: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_images: 16,
            preload_enabled: true,
        }
    }
}
