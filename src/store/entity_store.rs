use std::path::PathBuf;

use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::error::{LcaError, Result};
use crate::logic::{EditValidator, Resolver};
use crate::model::{Depth, Entity, EntityGraph, EntityHandle, EntityKey, EntityKind, FieldShape};
use crate::store::archive::ArchiveBackend;
use crate::store::entity_cache::EntityCache;
use crate::store::ipc::IpcBackend;
use crate::store::traits::{Backend, Descriptor};

/// Where a session's data lives
#[derive(Debug, Clone, PartialEq)]
pub enum BackendConfig {
    Service(ServiceConfig),
    Archive { path: PathBuf },
}

impl BackendConfig {
    pub fn endpoint(&self) -> String {
        match self {
            BackendConfig::Service(service) => service.endpoint(),
            BackendConfig::Archive { path } => path.display().to_string(),
        }
    }
}

pub async fn connect(config: &BackendConfig) -> Result<Box<dyn Backend>> {
    match config {
        BackendConfig::Service(service) => Ok(Box::new(IpcBackend::connect(service).await?)),
        BackendConfig::Archive { path } => Ok(Box::new(ArchiveBackend::open(path)?)),
    }
}

/// Backend-agnostic access to one dataset: resolution, caching and edits
/// on top of a single backend connection.
pub struct EntityStore {
    backend: Box<dyn Backend>,
    cache: EntityCache,
}

impl EntityStore {
    pub async fn connect(config: &BackendConfig) -> Result<Self> {
        Ok(Self::with_backend(connect(config).await?))
    }

    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            cache: EntityCache::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        self.backend.endpoint()
    }

    /// Descriptors of a kind, in backend order
    pub async fn summaries(&self, kind: EntityKind) -> Result<Vec<Descriptor>> {
        self.backend.list(kind).await
    }

    /// Cached entity handle, fetching on first use
    pub async fn get(&self, kind: EntityKind, id: Uuid) -> Result<EntityHandle> {
        let key = EntityKey::new(kind, id);
        if let Some(handle) = self.cache.get(&key).await {
            log::debug!("cache hit {}", key);
            return Ok(handle);
        }

        let entity = match self.backend.fetch(kind, id).await {
            Ok(entity) => entity,
            Err(LcaError::NotFound { .. }) => return Err(self.classify_missing(kind, id).await),
            Err(e) => return Err(e),
        };
        if entity.kind() != kind {
            return Err(LcaError::Schema(format!(
                "expected {} {} but found a {}",
                kind,
                id,
                entity.kind()
            )));
        }
        Ok(self.cache.put(entity).await)
    }

    /// A miss under the expected kind is a schema violation when the id is
    /// filed under another kind
    async fn classify_missing(&self, kind: EntityKind, id: Uuid) -> LcaError {
        match self.backend.locate(id).await {
            Ok(Some(actual)) if actual != kind => LcaError::Schema(format!(
                "{} is referenced as {} but stored as {}",
                id, kind, actual
            )),
            Ok(_) => LcaError::NotFound { kind, id },
            Err(e) => e,
        }
    }

    /// Fetch an entity and resolve its references into a graph
    pub async fn select(&self, kind: EntityKind, id: Uuid, depth: Depth) -> Result<EntityGraph> {
        Resolver::hydrate(self, kind, id, depth).await
    }

    /// Set one registry field of a cached entity.
    ///
    /// Reference fields take the target's UUID, which must resolve to the
    /// expected kind. Nothing changes unless the whole edit validates.
    pub async fn edit(&self, kind: EntityKind, id: Uuid, field: &str, value: &str) -> Result<()> {
        let def = EditValidator::field(kind, field)?;
        let handle = self.get(kind, id).await?;

        let new_value = match def.shape {
            FieldShape::Reference(expected, _) => {
                let target_id = Uuid::parse_str(value.trim()).map_err(|_| {
                    LcaError::validation(field, format!("'{}' is not a UUID", value.trim()))
                })?;
                let target = self.get(expected, target_id).await.map_err(|e| match e {
                    LcaError::NotFound { .. } | LcaError::Schema(_) => LcaError::validation(
                        field,
                        format!("{} does not resolve to a {}", target_id, expected),
                    ),
                    other => other,
                })?;
                let reference = target.read().to_ref();
                serde_json::to_value(reference)
                    .map_err(|e| LcaError::validation(field, e.to_string()))?
            }
            _ => EditValidator::parse_scalar(def, value)?,
        };

        let edited = EditValidator::apply(&handle.read(), field, new_value)?;
        *handle.write() = edited;
        let key = EntityKey::new(kind, id);
        self.cache.mark_dirty(&key).await;
        log::debug!("edited {} field {}", key, field);
        Ok(())
    }

    /// Write the cached entity back; the entry is clean afterwards
    pub async fn commit(&self, kind: EntityKind, id: Uuid) -> Result<()> {
        let key = EntityKey::new(kind, id);
        let handle = self.get(kind, id).await?;
        let entity = handle.read().clone();
        self.backend.write(&entity).await?;
        self.cache.mark_clean(&key).await;
        log::info!("committed {}", key);
        Ok(())
    }

    /// Fetch straight from the backend, ignoring the cache
    pub async fn refetch(&self, kind: EntityKind, id: Uuid) -> Result<Entity> {
        self.backend.fetch(kind, id).await
    }

    /// Entities edited but not committed
    pub async fn dirty(&self) -> Vec<EntityKey> {
        self.cache.dirty_keys().await
    }

    /// Drop the cache and release the backend. Consumes the store, so a
    /// connection is closed at most once.
    pub async fn close(self) -> Result<()> {
        self.cache.clear().await;
        self.backend.close().await
    }
}
