//! Configuration loading for transformers-embed.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/transformers-embed/config.toml.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Model loaded when no identifier is configured.
pub const DEFAULT_MODEL_NAME: &str = "Xenova/all-MiniLM-L6-v2";

/// Maximum number of documents sent to the pipeline in one call.
pub const DEFAULT_BATCH_SIZE: usize = 512;

/// Prefix of environment variable overrides (EMBED_LOG_LEVEL,
/// EMBED_EMBEDDINGS__BATCH_SIZE, ...).
pub const ENV_PREFIX: &str = "EMBED";

const APP_NAME: &str = "transformers-embed";

/// Parameters of the embedding adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingsParams {
    /// Model identifier handed to the pipeline factory
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Deadline for each batch inference call, in milliseconds.
    /// None disables the deadline.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Maximum number of documents embedded in a single pipeline call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Replace newlines with spaces before embedding
    #[serde(default = "default_strip_new_lines")]
    pub strip_new_lines: bool,
}

fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_strip_new_lines() -> bool {
    true
}

impl Default for EmbeddingsParams {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            timeout_ms: None,
            batch_size: default_batch_size(),
            strip_new_lines: default_strip_new_lines(),
        }
    }
}

impl EmbeddingsParams {
    /// Create parameters for the given model with all other fields defaulted.
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ..Default::default()
        }
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Enable or disable newline stripping.
    pub fn with_strip_new_lines(mut self, strip: bool) -> Self {
        self.strip_new_lines = strip;
        self
    }

    /// Set the per-batch timeout, rounded up to whole milliseconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    /// Per-batch timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_name.trim().is_empty() {
            return Err(ConfigError::invalid("model_name", "must not be empty"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::invalid("batch_size", "must be > 0"));
        }
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::invalid("timeout_ms", "must be > 0 when set"));
        }
        Ok(())
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Adapter parameters
    #[serde(default)]
    pub embeddings: EmbeddingsParams,

    /// Directory holding downloaded model files
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_cache_dir() -> String {
    ProjectDirs::from("", "", APP_NAME)
        .map(|p| p.cache_dir().join("models"))
        .unwrap_or_else(|| PathBuf::from(".cache").join(APP_NAME).join("models"))
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            embeddings: EmbeddingsParams::default(),
            cache_dir: default_cache_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/transformers-embed/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (EMBED_*, nested keys joined by `__`)
    ///
    /// CLI flags should be applied by the caller after this returns; call
    /// [`EmbeddingsParams::validate`] once they are in place.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir = ProjectDirs::from("", "", APP_NAME)
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("cache_dir", default_cache_dir())?
            .set_default("log_level", default_log_level())?
            .set_default("embeddings.model_name", default_model_name())?
            .set_default("embeddings.batch_size", default_batch_size() as i64)?
            .set_default("embeddings.strip_new_lines", default_strip_new_lines())?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Cache directory as a path.
    pub fn cache_path(&self) -> PathBuf {
        PathBuf::from(&self.cache_dir)
    }
}
