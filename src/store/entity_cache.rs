use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::model::{new_handle, Entity, EntityHandle, EntityKey};

/// Cache entry for a fetched entity
#[derive(Clone, Debug)]
struct CacheEntry {
    handle: EntityHandle,
    dirty: bool, // true if edited but not yet committed
}

/// Session cache of fetched entities, keyed by (kind, id).
///
/// Lives as long as one connection; there is no expiry.
#[derive(Debug, Default)]
pub struct EntityCache {
    entries: Arc<RwLock<HashMap<EntityKey, CacheEntry>>>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle of a cached entity
    pub async fn get(&self, key: &EntityKey) -> Option<EntityHandle> {
        let entries = self.entries.read().await;
        entries.get(key).map(|entry| entry.handle.clone())
    }

    /// Cache a freshly fetched entity and return the handle everyone shares.
    ///
    /// If the key is already cached the existing handle wins, so callers
    /// never end up with two copies of one entity.
    pub async fn put(&self, entity: Entity) -> EntityHandle {
        let key = EntityKey::new(entity.kind(), entity.id());
        let mut entries = self.entries.write().await;
        entries
            .entry(key)
            .or_insert_with(|| CacheEntry {
                handle: new_handle(entity),
                dirty: false,
            })
            .handle
            .clone()
    }

    /// Mark an entity as edited but not yet committed
    pub async fn mark_dirty(&self, key: &EntityKey) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(key) {
            entry.dirty = true;
        }
    }

    /// Mark an entry as clean (written to the backend)
    pub async fn mark_clean(&self, key: &EntityKey) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(key) {
            entry.dirty = false;
        }
    }

    pub async fn is_dirty(&self, key: &EntityKey) -> bool {
        let entries = self.entries.read().await;
        entries.get(key).map(|e| e.dirty).unwrap_or(false)
    }

    /// Keys of all uncommitted entries, sorted
    pub async fn dirty_keys(&self) -> Vec<EntityKey> {
        let entries = self.entries.read().await;
        let mut keys: Vec<EntityKey> = entries
            .iter()
            .filter(|(_, entry)| entry.dirty)
            .map(|(key, _)| *key)
            .collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Clear the entire cache
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }
}
