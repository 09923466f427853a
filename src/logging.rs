use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::fs;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Where and how to log.
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Directory for log files (e.g., "logs")
    pub log_dir: String,
    /// Prefix for log files (e.g., "folio")
    pub log_prefix: String,
    /// Debug level instead of info, unless `RUST_LOG` says otherwise
    pub debug_mode: bool,
    /// Also log to the console with ANSI colors
    pub console_output: bool,
    /// Write the log file as JSON lines
    pub json_file: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            log_prefix: "folio".to_string(),
            debug_mode: false,
            console_output: true,
            json_file: false,
        }
    }
}

impl LoggingOptions {
    /// `RUST_LOG` wins; otherwise `debug` or `info` depending on debug mode.
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if self.debug_mode {
                EnvFilter::new("debug")
            } else {
                EnvFilter::new("info")
            }
        })
    }
}

/// Create the log directory if needed.
pub fn ensure_log_dir(log_dir: &str) -> Result<Utf8PathBuf> {
    let log_path = Utf8PathBuf::from(log_dir);
    if !log_path.exists() {
        fs::create_dir_all(&log_path)
            .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
    }
    Ok(log_path)
}

/// Setup logging with a daily rotating file appender and optional console output.
///
/// # Returns
/// A guard that must be held for the duration of the program to keep logging active
pub fn setup_logging(
    options: &LoggingOptions,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    ensure_log_dir(&options.log_dir)?;

    // Create daily rotating file appender
    let file_appender = rolling::daily(&options.log_dir, &options.log_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let text_file_layer = (!options.json_file).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking.clone())
            .with_ansi(false) // No ANSI codes in log files
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });

    let json_file_layer = options.json_file.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_thread_ids(true)
            .with_current_span(false)
    });

    let console_layer = options.console_output.then(|| {
        tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(options.env_filter())
        .with(text_file_layer)
        .with(json_file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install the global tracing subscriber")?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, debug={}, console={}, json={}",
        options.log_dir,
        options.log_prefix,
        options.debug_mode,
        options.console_output,
        options.json_file
    );

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_setup_logging() {
        let temp_dir = TempDir::new().unwrap();
        let options = LoggingOptions {
            log_dir: temp_dir.path().join("logs").to_str().unwrap().to_string(),
            log_prefix: "test".to_string(),
            console_output: false,
            ..LoggingOptions::default()
        };

        // Installing the global subscriber can only succeed once per process,
        // but the directory is created either way
        let _result = setup_logging(&options);
        assert!(Utf8PathBuf::from(&options.log_dir).exists());
    }

    #[test]
    fn test_log_directory_created() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("nested").join("logs");

        let created = ensure_log_dir(log_dir.to_str().unwrap()).unwrap();
        assert!(created.exists());
        // Idempotent
        assert!(ensure_log_dir(log_dir.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_default_options() {
        let options = LoggingOptions::default();
        assert_eq!(options.log_dir, "logs");
        assert_eq!(options.log_prefix, "folio");
        assert!(!options.json_file);
    }
}
