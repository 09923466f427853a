//! Folio - Portfolio slideshow for photography and graphic design
//!
//! Main entry point for the GUI application.
//!
//! # Overview
//!
//! This binary crate provides the Slint GUI frontend for Folio. It initializes:
//! - Logging infrastructure (file rotation + console output)
//! - Tokio async runtime (timers, content fetches, image loads)
//! - Configuration loading ([`ConfigManager`])
//! - The portfolio content (CMS query API or local catalog)
//! - The gallery shell and its slideshow engine ([`GalleryShell`])
//! - GUI controller ([`GuiController`] - bridges Slint UI with the gallery)
//!
//! The application uses a hybrid threading model:
//! - **Main thread**: Runs the Slint event loop (blocking, synchronous)
//! - **Tokio workers**: Autoplay/resume timers, content fetch, image loading
//! - **Gallery listener**: Background std::thread for reactive UI updates
//!
//! # Execution Flow
//!
//! 1. Load `Folio Data/Folio.yaml` (+ `FOLIO_*` environment overrides)
//! 2. Initialize logging → logs/folio.<date>
//! 3. Create tokio runtime with 2 worker threads
//! 4. Fetch and validate portfolio documents (errors yield an empty gallery)
//! 5. Create image cache, preloader, gallery shell and GUI controller
//! 6. Run Slint event loop (blocks until window closed)
//! 7. Log the session metrics and shut the runtime down with a 5s timeout

use anyhow::{Context, Result};
use folio::logging::{LoggingOptions, setup_logging};
use folio::models::PortfolioImage;
use folio::services::{
    CatalogFile, HttpPreloader, ImageCache, ImageUrlBuilder, NoopPreloader, Preloader,
    SanityClient, fetch_portfolio,
};
use folio::ui::GuiController;
use folio::{
    APP_NAME, CONFIG_DIR, ConfigManager, EngineServices, FolioConfig, GalleryShell, Metrics,
    VERSION,
};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    // Configuration comes first so debug_mode can pick the log level
    let config_manager = ConfigManager::new(CONFIG_DIR)?;
    let config = config_manager.load_config()?;

    let _log_guard = setup_logging(&LoggingOptions {
        debug_mode: config.debug_mode,
        ..LoggingOptions::default()
    })?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("folio-worker")
        .build()
        .context("Failed to create tokio runtime")?;

    tracing::info!("Tokio runtime initialized with {} worker threads", 2);

    let images = runtime.block_on(load_portfolio(&config_manager, &config));
    if images.is_empty() {
        tracing::warn!("Portfolio is empty; the gallery will show placeholders");
    }

    let metrics = Arc::new(Metrics::new());
    let cache = Arc::new(
        ImageCache::new(
            config.cache.max_images,
            Duration::from_secs(config.content.request_timeout_secs),
        )
        .context("Failed to create image cache")?,
    );

    let preloader: Arc<dyn Preloader> = if config.cache.preload_enabled {
        Arc::new(HttpPreloader::new(Arc::clone(&cache), runtime.handle().clone()))
    } else {
        tracing::info!("Image preloading disabled");
        Arc::new(NoopPreloader)
    };

    let services = EngineServices::new(runtime.handle().clone())
        .with_preloader(preloader)
        .with_metrics(Arc::clone(&metrics));

    let gallery = GalleryShell::new(images, config.gallery, config.slideshow, services);

    let gui_controller = GuiController::new(
        gallery,
        cache,
        &config.site,
        Arc::clone(&metrics),
        runtime.handle().clone(),
    )?;

    tracing::info!("GUI controller initialized, launching window");

    // Run the GUI (blocks until window is closed)
    let result = gui_controller.run();

    tracing::info!("GUI closed, shutting down");
    metrics.log_summary();

    runtime.shutdown_timeout(Duration::from_secs(5));

    tracing::info!("Application shutdown complete");

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}

/// Fetch the portfolio from the local catalog when configured, otherwise from the CMS.
async fn load_portfolio(
    config_manager: &ConfigManager,
    config: &FolioConfig,
) -> Vec<PortfolioImage> {
    let urls = ImageUrlBuilder::from_settings(&config.content);

    if let Some(path) = config_manager.catalog_path(config) {
        tracing::info!("Loading portfolio from catalog {}", path);
        return fetch_portfolio(&CatalogFile::new(path), &urls).await;
    }

    match SanityClient::new(&config.content) {
        Ok(client) => fetch_portfolio(&client, &urls).await,
        Err(e) => {
            tracing::error!("Content API unavailable: {}", e);
            Vec::new()
        }
    }
}
