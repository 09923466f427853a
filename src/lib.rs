// Folio - Portfolio slideshow for photography and graphic design
//
// This is the library crate containing the slideshow engine, the gallery
// shell, content loading and configuration. The binary crate (main.rs)
// provides the GUI entry point.

pub mod config;
pub mod gallery;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod slideshow;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use gallery::{GalleryEvent, GalleryShell, GalleryView};
pub use metrics::Metrics;
pub use models::{
    Category, Direction, Filter, FolioConfig, ImageRecord, PlaybackState, PortfolioImage,
};
pub use slideshow::{EngineServices, SlideshowCallbacks, SlideshowEngine, SlideshowEvent};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// Configuration directory, relative to the working directory
pub const CONFIG_DIR: &str = "Folio Data";
