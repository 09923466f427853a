//! Services module - content loading and image delivery.
//!
//! Everything here is **framework-agnostic**: no Slint, no engine state, only
//! I/O and mapping. The UI and the gallery shell consume these through plain
//! values ([`PortfolioImage`](crate::models::PortfolioImage)) and the
//! [`Preloader`] seam.
//!
//! # Components
//!
//! - [`content`]: fetches portfolio documents from the CMS query API or a
//!   local YAML catalog, validates them against the portfolio schema and
//!   orders them by slider position. Errors recover into an empty list.
//! - [`asset_url`]: turns CMS image asset references into CDN URLs.
//! - [`preload`]: decoded-image LRU cache and the background preloader used
//!   by the slideshow engine.
//!
//! # Usage Example
//!
//! ```ignore
//! use folio::services::{ImageUrlBuilder, SanityClient, fetch_portfolio};
//!
//! let urls = ImageUrlBuilder::from_settings(&config.content);
//! let client = SanityClient::new(&config.content)?;
//! let images = fetch_portfolio(&client, &urls).await;
//! ```

pub mod asset_url;
pub mod content;
pub mod preload;

pub use asset_url::{AssetRef, AssetRefError, ImageUrlBuilder};
pub use content::{
    CatalogFile, ContentError, ContentSource, PortfolioDocument, SanityClient, build_portfolio,
    fetch_portfolio,
};
pub use preload::{
    DecodedImage, HttpPreloader, ImageCache, ImageLoadError, NoopPreloader, Preloader,
};
