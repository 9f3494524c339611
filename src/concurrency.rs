//! Per-collection write serialization
//!
//! Writers of the same collection take that collection's lock exclusively so
//! replace-by-rename commits happen one at a time. Readers only take the shared
//! side while opening the blob; the open handle keeps its snapshot afterwards.

use crate::types::CollectionId;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Lock registry keyed by collection id
///
/// Locks are created on first use and dropped from the registry once no
/// caller holds a handle, so the map does not grow with every id ever seen.
#[derive(Default)]
pub struct CollectionLockManager {
    locks: Mutex<HashMap<CollectionId, Arc<RwLock<()>>>>,
}

impl CollectionLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the lock for a collection, creating it on first use.
    pub fn get_lock(&self, id: &CollectionId) -> Arc<RwLock<()>> {
        let mut map = self.locks.lock();
        map.retain(|_, lock| Arc::strong_count(lock) > 1);
        map.entry(*id)
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    /// Number of collections with a live lock handle
    pub fn tracked(&self) -> usize {
        let map = self.locks.lock();
        map.values().filter(|lock| Arc::strong_count(lock) > 1).count()
    }
}
