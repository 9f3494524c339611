//! Virtual File Index
//!
//! Read-side queries over a stored collection. Every call opens a fresh stream
//! and releases it before returning.

use crate::archive::ArchiveDecoder;
use crate::error::ApiError;
use crate::path;
use crate::store::CollectionStore;
use crate::types::{CollectionId, VirtualFile};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct VirtualFileIndex {
    store: Arc<dyn CollectionStore>,
}

impl VirtualFileIndex {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CollectionStore> {
        &self.store
    }

    /// Decode the whole collection, contents included, in archive order.
    pub fn list_all(&self, id: &CollectionId) -> Result<Vec<VirtualFile>, ApiError> {
        let stream = self.store.read(id)?;
        let mut decoder = ArchiveDecoder::new(stream);
        let files = decoder.files()?.collect::<Result<Vec<_>, _>>()?;
        debug!(collection = %id, entries = files.len(), "Listed collection");
        Ok(files)
    }

    /// Look up one path. Stops reading at the first matching record.
    pub fn find_by_path(
        &self,
        id: &CollectionId,
        file_path: &str,
    ) -> Result<Option<VirtualFile>, ApiError> {
        let wanted = path::normalize(file_path);
        let stream = self.store.read(id)?;
        let mut decoder = ArchiveDecoder::new(stream);
        let found = decoder.files()?.find_path(&wanted)?;
        debug!(collection = %id, path = %wanted, found = found.is_some(), "Path lookup");
        Ok(found)
    }
}
