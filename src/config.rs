use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::buckets::{BucketDefinition, BucketError};
use crate::normalize::UnknownBucketPolicy;

/// Application configuration loaded from TOML config file.
/// All fields have sensible defaults — the config file is optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Data files to load (at most two). Empty means the embedded sample.
    pub data_files: Vec<PathBuf>,
    /// Shared dashboard password. `APP_PASSWORD` takes precedence.
    pub password: Option<String>,
    /// Draw bars one at a time.
    pub animate: bool,
    /// Pause between animation frames in milliseconds.
    pub frame_delay_ms: u64,
    /// Width of the longest bar in characters.
    pub chart_width: usize,
    /// Reject unknown bucket codes instead of dropping them.
    pub strict_buckets: bool,
    /// Bucket order override.
    pub buckets: BucketsConfig,
}

/// Bucket order configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct BucketsConfig {
    /// Ordered bucket codes; the last one is the overflow bucket.
    /// Empty means the built-in eleven.
    pub order: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_files: Vec::new(),
            password: None,
            animate: true,
            frame_delay_ms: crate::render::DEFAULT_FRAME_DELAY.as_millis() as u64,
            chart_width: crate::render::DEFAULT_CHART_WIDTH,
            strict_buckets: false,
            buckets: BucketsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load config from `~/.config/jobdash/config.toml`.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::debug!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from an explicit path.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse {}: {}. Using defaults.",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!(
                    "Failed to read {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Bucket order: configured list, or the built-in default.
    pub fn bucket_order(&self) -> Result<BucketDefinition, BucketError> {
        if self.buckets.order.is_empty() {
            Ok(BucketDefinition::default())
        } else {
            BucketDefinition::new(self.buckets.order.clone())
        }
    }

    pub fn bucket_policy(&self) -> UnknownBucketPolicy {
        if self.strict_buckets {
            UnknownBucketPolicy::Strict
        } else {
            UnknownBucketPolicy::Lenient
        }
    }

    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay_ms)
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
