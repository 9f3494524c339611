//! Filesystem-backed collection store: one `<uuid>.tar` blob per collection.

use super::{CollectionStore, CollectionStream};
use crate::concurrency::CollectionLockManager;
use crate::error::StorageError;
use crate::types::CollectionId;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const BLOB_EXTENSION: &str = "tar";
const INCOMING_PREFIX: &str = ".incoming-";

/// Blob directory store with replace-by-rename commits
pub struct FsCollectionStore {
    root: PathBuf,
    locks: CollectionLockManager,
}

impl FsCollectionStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::unavailable(
                format!("failed to create store directory {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            locks: CollectionLockManager::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, id: &CollectionId) -> PathBuf {
        self.root
            .join(format!("{}.{}", id.as_hyphenated(), BLOB_EXTENSION))
    }

    fn open(&self, id: &CollectionId) -> Result<File, StorageError> {
        let lock = self.locks.get_lock(id);
        let _guard = lock.read();
        File::open(self.blob_path(id)).map_err(|e| StorageError::from_open(*id, e))
    }
}

impl CollectionStore for FsCollectionStore {
    fn write(&self, id: &CollectionId, source: &mut dyn Read) -> Result<u64, StorageError> {
        let target = self.blob_path(id);
        let lock = self.locks.get_lock(id);
        let _guard = lock.write();

        // Dropping the temp file on any error path removes it.
        let mut incoming = tempfile::Builder::new()
            .prefix(INCOMING_PREFIX)
            .suffix(".tmp")
            .tempfile_in(&self.root)
            .map_err(|e| StorageError::unavailable("failed to create temp file", e))?;
        let written = io::copy(source, incoming.as_file_mut()).map_err(|e| {
            StorageError::unavailable(format!("failed to stream collection {}", id), e)
        })?;
        incoming
            .as_file()
            .sync_all()
            .map_err(|e| StorageError::unavailable("failed to sync temp file", e))?;
        incoming.persist(&target).map_err(|e| {
            StorageError::unavailable(format!("failed to commit collection {}", id), e.error)
        })?;

        info!(collection = %id, bytes = written, "Collection replaced");
        Ok(written)
    }

    fn read(&self, id: &CollectionId) -> Result<CollectionStream, StorageError> {
        let file = self.open(id)?;
        debug!(collection = %id, "Collection opened for reading");
        Ok(Box::new(BufReader::new(file)))
    }

    fn copy(&self, source: &CollectionId, dest: &CollectionId) -> Result<(), StorageError> {
        let mut file = self.open(source)?;
        if source == dest {
            return Ok(());
        }
        let bytes = self.write(dest, &mut file)?;
        info!(source = %source, dest = %dest, bytes, "Collection copied");
        Ok(())
    }

    fn delete(&self, id: &CollectionId) -> Result<(), StorageError> {
        let lock = self.locks.get_lock(id);
        let _guard = lock.write();
        match std::fs::remove_file(self.blob_path(id)) {
            Ok(()) => {
                info!(collection = %id, "Collection deleted");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(collection = %id, "Delete of absent collection ignored");
                Ok(())
            }
            Err(e) => Err(StorageError::unavailable(
                format!("failed to delete collection {}", id),
                e,
            )),
        }
    }

    fn exists(&self, id: &CollectionId) -> Result<bool, StorageError> {
        self.blob_path(id)
            .try_exists()
            .map_err(|e| StorageError::unavailable(format!("failed to stat collection {}", id), e))
    }
}
