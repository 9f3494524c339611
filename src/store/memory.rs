//! In-process collection store. Blobs are shared immutable buffers, so a copy
//! is a reference bump and readers keep the snapshot they opened.

use super::{CollectionStore, CollectionStream};
use crate::error::StorageError;
use crate::types::CollectionId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
pub struct MemoryCollectionStore {
    blobs: RwLock<HashMap<CollectionId, Arc<[u8]>>>,
}

impl MemoryCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl CollectionStore for MemoryCollectionStore {
    fn write(&self, id: &CollectionId, source: &mut dyn Read) -> Result<u64, StorageError> {
        let mut buffer = Vec::new();
        source.read_to_end(&mut buffer).map_err(|e| {
            StorageError::unavailable(format!("failed to stream collection {}", id), e)
        })?;
        let written = buffer.len() as u64;
        self.blobs.write().insert(*id, Arc::from(buffer));
        debug!(collection = %id, bytes = written, "Collection replaced in memory");
        Ok(written)
    }

    fn read(&self, id: &CollectionId) -> Result<CollectionStream, StorageError> {
        let blob = self
            .blobs
            .read()
            .get(id)
            .cloned()
            .ok_or(StorageError::CollectionNotFound(*id))?;
        Ok(Box::new(Cursor::new(blob)))
    }

    fn copy(&self, source: &CollectionId, dest: &CollectionId) -> Result<(), StorageError> {
        let mut blobs = self.blobs.write();
        let blob = blobs
            .get(source)
            .cloned()
            .ok_or(StorageError::CollectionNotFound(*source))?;
        blobs.insert(*dest, blob);
        Ok(())
    }

    fn delete(&self, id: &CollectionId) -> Result<(), StorageError> {
        self.blobs.write().remove(id);
        Ok(())
    }

    fn exists(&self, id: &CollectionId) -> Result<bool, StorageError> {
        Ok(self.blobs.read().contains_key(id))
    }
}
