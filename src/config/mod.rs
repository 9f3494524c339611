//! Configuration
//!
//! Layered with the `config` crate. Precedence, lowest first: built-in
//! defaults, the global file (`$XDG_CONFIG_HOME/taskfs/config.toml`), an
//! explicit `--config` file, then `TASKFS__SECTION__KEY` environment variables.

pub mod facade;
pub mod merge;
pub mod sources;
pub mod storage;
pub mod xdg;

pub use facade::ConfigLoader;
pub use storage::{StorageBackend, StorageConfig};

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

fn default_max_upload_bytes() -> u64 {
    64 * 1024 * 1024
}

fn default_spool_bytes() -> usize {
    4 * 1024 * 1024
}

/// Limits applied to uploaded archives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted upload, before decompression
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: u64,

    /// Uploads up to this size are buffered in memory, larger ones on disk
    #[serde(default = "default_spool_bytes")]
    pub spool_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_upload_bytes(),
            spool_bytes: default_spool_bytes(),
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskfsConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TaskfsConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.upload.max_bytes == 0 {
            return Err(ApiError::ConfigError(
                "upload.max_bytes must be greater than zero".to_string(),
            ));
        }
        self.storage.validate()
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))
    }
}
