use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::model::{EdgeRole, Entity, EntityKind};

/// Shared, mutable view of one cached entity.
///
/// Every graph and the store cache hold clones of the same handle, so an edit
/// made through the store is visible in graphs already handed out.
pub type EntityHandle = Arc<RwLock<Entity>>;

pub fn new_handle(entity: Entity) -> EntityHandle {
    Arc::new(RwLock::new(entity))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: Uuid,
}

impl EntityKey {
    pub fn new(kind: EntityKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// How far ownership references are followed from the root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Depth {
    #[default]
    Full,
    Levels(usize),
}

impl Depth {
    /// Whether entities owned at `level` (root is 0) are still expanded
    pub fn expands(self, level: usize) -> bool {
        match self {
            Depth::Full => true,
            Depth::Levels(max) => level < max,
        }
    }
}

/// A resolved reference edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub from: EntityKey,
    pub field: String,
    pub to: EntityKey,
    pub role: EdgeRole,
}

/// Product of a `select`: the root entity and everything it references,
/// keyed by (kind, id). Shared sub-graphs appear once in `nodes`.
#[derive(Debug, Clone)]
pub struct EntityGraph {
    pub root: EntityKey,
    pub nodes: BTreeMap<EntityKey, EntityHandle>,
    pub links: Vec<Link>,
}

impl EntityGraph {
    pub fn new(root: EntityKey, handle: EntityHandle) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(root, handle);
        Self {
            root,
            nodes,
            links: Vec::new(),
        }
    }

    pub fn root_handle(&self) -> &EntityHandle {
        // the root is inserted by `new` and never removed
        &self.nodes[&self.root]
    }

    pub fn get(&self, key: &EntityKey) -> Option<&EntityHandle> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Clone of a node's current content
    pub fn entity(&self, key: &EntityKey) -> Option<Entity> {
        self.nodes.get(key).map(|h| h.read().clone())
    }

    /// Follow one resolved field from a node
    pub fn follow(&self, from: &EntityKey, field: &str) -> Option<&EntityHandle> {
        self.links
            .iter()
            .find(|l| &l.from == from && l.field == field)
            .and_then(|l| self.nodes.get(&l.to))
    }

    pub fn outgoing<'a>(&'a self, from: &'a EntityKey) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |l| &l.from == from)
    }

    /// Content of every node, detached from the shared handles
    pub fn snapshot(&self) -> BTreeMap<EntityKey, Entity> {
        self.nodes
            .iter()
            .map(|(key, handle)| (*key, handle.read().clone()))
            .collect()
    }
}
