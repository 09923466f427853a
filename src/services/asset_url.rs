//! CDN URLs for CMS image assets.
//!
//! Image fields in portfolio documents point at their asset through a
//! reference string of the form `image-<assetId>-<width>x<height>-<format>`.
//! [`ImageUrlBuilder`] parses that reference and renders the public CDN URL
//! with the configured quality.

use crate::models::ContentSettings;
use regex::Regex;
use thiserror::Error;

const CDN_BASE: &str = "https://cdn.sanity.io/images";

/// Errors that can occur while resolving an asset reference
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AssetRefError {
    #[error("Malformed image asset reference: {0}")]
    Malformed(String),

    #[error("Image asset {0} has zero dimensions")]
    ZeroDimensions(String),

    #[error("No project id configured for asset URLs")]
    MissingProject,
}

/// A parsed image asset reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub asset_id: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
}

impl AssetRef {
    /// File name on the CDN: `<id>-<w>x<h>.<format>`.
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}x{}.{}",
            self.asset_id, self.width, self.height, self.format
        )
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Renders CDN URLs for one project/dataset.
pub struct ImageUrlBuilder {
    project_id: String,
    dataset: String,
    quality: u8,

    /// Regex for `image-<id>-<w>x<h>-<format>` references
    ref_pattern: Regex,
}

impl ImageUrlBuilder {
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>, quality: u8) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
            quality: quality.clamp(1, 100),
            ref_pattern: Regex::new(r"^image-([A-Za-z0-9]+)-(\d+)x(\d+)-([a-z0-9]+)$")
                .expect("Invalid asset reference regex"),
        }
    }

    pub fn from_settings(settings: &ContentSettings) -> Self {
        Self::new(
            settings.project_id.clone(),
            settings.dataset.clone(),
            settings.image_quality,
        )
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Parse an asset reference string.
    pub fn parse(&self, reference: &str) -> Result<AssetRef, AssetRefError> {
        let caps = self
            .ref_pattern
            .captures(reference.trim())
            .ok_or_else(|| AssetRefError::Malformed(reference.to_string()))?;

        let dimension = |i: usize| {
            caps[i]
                .parse::<u32>()
                .map_err(|_| AssetRefError::Malformed(reference.to_string()))
        };
        let width = dimension(2)?;
        let height = dimension(3)?;
        if width == 0 || height == 0 {
            return Err(AssetRefError::ZeroDimensions(reference.to_string()));
        }

        Ok(AssetRef {
            asset_id: caps[1].to_string(),
            width,
            height,
            format: caps[4].to_string(),
        })
    }

    /// URL of a parsed asset.
    pub fn url(&self, asset: &AssetRef) -> Result<String, AssetRefError> {
        if self.project_id.is_empty() {
            return Err(AssetRefError::MissingProject);
        }
        Ok(format!(
            "{}/{}/{}/{}?q={}",
            CDN_BASE,
            self.project_id,
            self.dataset,
            asset.file_name(),
            self.quality
        ))
    }

    /// Parse and render in one step.
    pub fn url_for_ref(&self, reference: &str) -> Result<String, AssetRefError> {
        let asset = self.parse(reference)?;
        self.url(&asset)
    }
}
