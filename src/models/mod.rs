//! Data models for the Folio application.
//!
//! - [`PortfolioImage`], [`ImageRecord`], [`ImageSequence`]: content as delivered and as displayed
//! - [`Category`], [`Filter`]: the category taxonomy and the gallery's filter tabs
//! - [`SlideshowState`], [`PlaybackState`], [`Direction`]: engine values and pure transitions
//! - [`FolioConfig`]: settings loaded from `Folio.yaml`
//!
//! # Architecture Note
//!
//! Models carry no timers, locks or I/O. The engine in [`crate::slideshow`]
//! wraps [`SlideshowState`] in a mutex and turns its transitions into events.

pub mod config;
pub mod portfolio;
pub mod slideshow_state;

pub use config::{
    CacheSettings, ContentSettings, FolioConfig, GallerySettings, SiteSettings, SlideshowSettings,
};
pub use portfolio::{Category, Filter, ImageRecord, ImageSequence, PortfolioImage};
pub use slideshow_state::{Direction, PlaybackState, SlideshowState};
