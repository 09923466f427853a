//! Environment overrides for Folio.yaml
//!
//! Kept in its own test binary: `FOLIO_*` variables are process-wide and
//! would leak into the other configuration tests.

use camino::Utf8PathBuf;
use folio::ConfigManager;
use folio::models::Filter;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_environment_overrides_file_values() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    fs::write(
        config_path.join("Folio.yaml"),
        "slideshow:\n  autoplay_interval_ms: 4000\n  resume_delay_ms: 300\n",
    )
    .unwrap();

    // SAFETY: the only test in this binary; no other thread reads the environment
    unsafe {
        std::env::set_var("FOLIO_SLIDESHOW__AUTOPLAY_INTERVAL_MS", "5000");
        std::env::set_var("FOLIO_GALLERY__CHAIN_CATEGORIES", "true");
        std::env::set_var("FOLIO_GALLERY__DEFAULT_FILTER", "photography");
    }

    let manager = ConfigManager::new(&config_path).unwrap();
    let config = manager.load_config().unwrap();

    assert_eq!(config.slideshow.autoplay_interval_ms, 5_000);
    assert_eq!(config.slideshow.resume_delay_ms, 300);
    assert!(config.gallery.chain_categories);
    assert_eq!(config.gallery.default_filter, Filter::Photography);
    assert!(config.gallery.show_all_filter);
}
