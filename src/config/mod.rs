use crate::models::FolioConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Prefix of environment overrides, e.g. `FOLIO_SLIDESHOW__AUTOPLAY_INTERVAL_MS`.
pub const ENV_PREFIX: &str = "FOLIO";

/// Configuration manager for loading and saving YAML configuration files.
///
/// Manages the configuration directory (`Folio Data`):
/// - `Folio.yaml`: site, content, slideshow, gallery and cache settings
/// - an optional local portfolio catalog referenced by `content.catalog_path`
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing configuration files (e.g., "Folio Data")
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            config_path: config_dir.join("Folio.yaml"),
            config_dir,
        })
    }

    /// Load `Folio.yaml` layered with `FOLIO_*` environment overrides.
    ///
    /// # Returns
    /// The loaded FolioConfig; missing file and missing keys fall back to defaults
    pub fn load_config(&self) -> Result<FolioConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                self.config_path
            );
        }

        let settings = ::config::Config::builder()
            .add_source(
                ::config::File::new(self.config_path.as_str(), ::config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        let config: FolioConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse config: {}", self.config_path))?;

        tracing::info!("Loaded config from {}", self.config_path);
        Ok(config)
    }

    /// Save the configuration file.
    ///
    /// # Arguments
    /// * `config` - The FolioConfig to save
    pub fn save_config(&self, config: &FolioConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    /// Resolve `content.catalog_path`; relative paths are taken from the config directory.
    pub fn catalog_path(&self, config: &FolioConfig) -> Option<Utf8PathBuf> {
        let path = config.content.catalog_path.as_deref()?.trim();
        if path.is_empty() {
            return None;
        }
        let path = Utf8Path::new(path);
        Some(if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        })
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}
