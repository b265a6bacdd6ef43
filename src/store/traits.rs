use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::model::{Entity, EntityKind};

/// Lightweight listing entry: enough to pick an entity without hydrating it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(rename = "@type")]
    pub kind: EntityKind,
    #[serde(rename = "@id")]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Descriptor {
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// One source of LCA documents: a live modeling service or a JSON-LD archive.
///
/// Implementations return entities with raw, unresolved references; the
/// entity store does resolution and caching on top.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// `host:port` or the archive path, used in error messages
    fn endpoint(&self) -> &str;
    /// Descriptors of every entity of a kind, in backend order
    async fn list(&self, kind: EntityKind) -> Result<Vec<Descriptor>>;
    async fn fetch(&self, kind: EntityKind, id: Uuid) -> Result<Entity>;
    async fn write(&self, entity: &Entity) -> Result<()>;
    /// The kind a document with this id is actually stored under, if known
    async fn locate(&self, _id: Uuid) -> Result<Option<EntityKind>> {
        Ok(None)
    }
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
