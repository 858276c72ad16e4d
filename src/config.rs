//! Print job options: recognized settings, defaults, and TOML loading.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid option: {0}")]
    Invalid(String),
}

/// Options recognized by the orchestrator. Every field has a serde default
/// so a partial TOML file (or `PrintOptions::default()`) is always usable.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrintOptions {
    /// Selector handed to the page locator capability.
    #[serde(default = "default_page_selector")]
    pub page_selector: String,
    /// Page count at or below which the whole set prints in a single pass.
    /// Consulted exactly once, at job start.
    #[serde(default = "default_batch_threshold")]
    pub batch_threshold: usize,
    /// Explicit batch size. When absent the planner derives one from the
    /// page count and the host capability class.
    #[serde(default)]
    pub batch_size: Option<usize>,
    /// Never prompt; every batch proceeds automatically.
    #[serde(default)]
    pub auto_mode: bool,
    /// Prompt before each batch. When false (and not in auto mode) a single
    /// upfront prompt picks automatic or manual mode for the whole job.
    #[serde(default = "default_confirm_each_batch")]
    pub confirm_each_batch: bool,
    /// Pause between batches, giving the host print pipeline room to drain.
    #[serde(default = "default_delay_between_batches_ms")]
    pub delay_between_batches_ms: u64,
    /// Hard upper bound on waiting for the host print-completion signal.
    #[serde(default = "default_completion_timeout_ms")]
    pub completion_timeout_ms: u64,
    /// Fixed wait used when the host exposes no completion signal.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            page_selector: default_page_selector(),
            batch_threshold: default_batch_threshold(),
            batch_size: None,
            auto_mode: false,
            confirm_each_batch: default_confirm_each_batch(),
            delay_between_batches_ms: default_delay_between_batches_ms(),
            completion_timeout_ms: default_completion_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl PrintOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_selector.trim().is_empty() {
            return Err(ConfigError::Invalid("page_selector must not be empty".to_string()));
        }
        if self.batch_threshold == 0 {
            return Err(ConfigError::Invalid("batch_threshold must be >= 1".to_string()));
        }
        if self.batch_size == Some(0) {
            return Err(ConfigError::Invalid("batch_size must be >= 1 when set".to_string()));
        }
        Ok(())
    }

    pub fn delay_between_batches(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.delay_between_batches_ms)
    }

    pub fn completion_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.completion_timeout_ms)
    }

    pub fn settle_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.settle_delay_ms)
    }
}

// Default value functions
fn default_page_selector() -> String { ".print-page".to_string() }
fn default_batch_threshold() -> usize { 100 }
fn default_confirm_each_batch() -> bool { true }
fn default_delay_between_batches_ms() -> u64 { 500 }
fn default_completion_timeout_ms() -> u64 { 8000 }
fn default_settle_delay_ms() -> u64 { 3000 }

/// Load options from a TOML file at the given path.
pub fn load_options(path: &str) -> Result<PrintOptions, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!("Failed to read options file '{}': {}", path, e);
        ConfigError::Io(e)
    })?;
    let options: PrintOptions = toml::from_str(&contents).map_err(|e| {
        tracing::error!("Failed to parse options TOML: {}", e);
        ConfigError::Toml(e)
    })?;
    options.validate()?;
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let options = PrintOptions::default();
        assert_eq!(options.page_selector, ".print-page");
        assert_eq!(options.batch_threshold, 100);
        assert_eq!(options.batch_size, None);
        assert!(!options.auto_mode);
        assert!(options.confirm_each_batch);
        assert_eq!(options.delay_between_batches_ms, 500);
        assert_eq!(options.completion_timeout_ms, 8000);
        assert_eq!(options.settle_delay_ms, 3000);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_load_options_success() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("print.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "batch_size = 80\nauto_mode = true\ndelay_between_batches_ms = 250").unwrap();
        file.flush().unwrap();
        let options = load_options(file_path.to_str().unwrap()).unwrap();
        assert_eq!(options.batch_size, Some(80));
        assert!(options.auto_mode);
        assert_eq!(options.delay_between_batches_ms, 250);
        // Defaults for missing fields
        assert_eq!(options.batch_threshold, 100);
        assert_eq!(options.page_selector, ".print-page");
    }

    #[test]
    fn test_load_options_missing_file() {
        let result = load_options("nonexistent_options.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_options_invalid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not a valid toml").unwrap();
        file.flush().unwrap();
        let result = load_options(file_path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_validate_rejects_bad_options() {
        let mut options = PrintOptions::default();
        options.page_selector = "  ".to_string();
        assert!(matches!(options.validate(), Err(ConfigError::Invalid(_))));

        let mut options = PrintOptions::default();
        options.batch_size = Some(0);
        assert!(matches!(options.validate(), Err(ConfigError::Invalid(_))));

        let mut options = PrintOptions::default();
        options.batch_threshold = 0;
        assert!(matches!(options.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_options_rejects_invalid_values() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("zero_batch.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "batch_size = 0").unwrap();
        file.flush().unwrap();
        let result = load_options(file_path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
