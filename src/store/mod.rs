//! Collection Store
//!
//! Persists one opaque archive blob per collection id. Every write replaces the
//! whole blob; there is no per-file mutation.

pub mod fs;
pub mod memory;

pub use fs::FsCollectionStore;
pub use memory::MemoryCollectionStore;

use crate::error::StorageError;
use crate::types::CollectionId;
use std::io::Read;

/// Scoped read handle. Dropping it releases the underlying file or buffer.
pub type CollectionStream = Box<dyn Read + Send>;

/// Collection Store interface
pub trait CollectionStore: Send + Sync {
    /// Atomically replace the collection with the bytes of `source`.
    ///
    /// Returns the number of bytes stored. If `source` fails partway the
    /// previous content stays in place.
    fn write(&self, id: &CollectionId, source: &mut dyn Read) -> Result<u64, StorageError>;

    /// Open the collection for streaming.
    fn read(&self, id: &CollectionId) -> Result<CollectionStream, StorageError>;

    /// Duplicate the stored bytes of `source` into `dest` without re-encoding.
    fn copy(&self, source: &CollectionId, dest: &CollectionId) -> Result<(), StorageError>;

    /// Remove the collection. Deleting an absent id succeeds.
    fn delete(&self, id: &CollectionId) -> Result<(), StorageError>;

    fn exists(&self, id: &CollectionId) -> Result<bool, StorageError>;

    /// blake3 digest of the stored bytes, hex encoded
    fn digest(&self, id: &CollectionId) -> Result<String, StorageError> {
        let mut stream = self.read(id)?;
        let mut hasher = blake3::Hasher::new();
        std::io::copy(&mut stream, &mut hasher).map_err(|e| {
            StorageError::unavailable(format!("failed to hash collection {}", id), e)
        })?;
        Ok(hex::encode(hasher.finalize().as_bytes()))
    }
}
