//! StorageConfig: which collection store to open and where it lives.

use crate::config::xdg;
use crate::error::ApiError;
use crate::store::{CollectionStore, FsCollectionStore, MemoryCollectionStore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Fs,
    Memory,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Blob directory for the `fs` backend; `None` means the platform data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(root) = &self.root {
            if root.as_os_str().is_empty() {
                return Err(ApiError::ConfigError(
                    "storage.root must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Resolve the blob directory: explicit root, else `<data dir>/collections`.
    pub fn resolve_root(&self) -> Result<PathBuf, ApiError> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => Ok(xdg::data_dir()?.join("collections")),
        }
    }

    /// Open the configured store.
    pub fn open_store(&self) -> Result<Arc<dyn CollectionStore>, ApiError> {
        match self.backend {
            StorageBackend::Fs => {
                let root = self.resolve_root()?;
                tracing::debug!(root = %root.display(), "Opening filesystem collection store");
                Ok(Arc::new(FsCollectionStore::new(root)?))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory collection store; nothing is persisted");
                Ok(Arc::new(MemoryCollectionStore::new()))
            }
        }
    }
}
