use std::collections::{BTreeMap, HashSet, VecDeque};

use uuid::Uuid;

use crate::error::{LcaError, Result};
use crate::model::{
    Depth, EdgeRole, EntityGraph, EntityHandle, EntityKey, EntityKind, Link, Ref,
};
use crate::store::EntityStore;

/// Owned copy of a reference slot, so no entity lock is held across fetches
#[derive(Debug, Clone)]
struct PendingRef {
    field: String,
    target: Ref,
    expected: EntityKind,
    role: EdgeRole,
}

fn pending_refs(handle: &EntityHandle) -> Vec<PendingRef> {
    let entity = handle.read();
    entity
        .references()
        .into_iter()
        .map(|slot| PendingRef {
            field: slot.field,
            target: slot.target.clone(),
            expected: slot.expected,
            role: slot.role,
        })
        .collect()
}

pub struct Resolver;

impl Resolver {
    /// Resolve one raw reference against the store.
    ///
    /// The declared `@type` (when present) and the fetched document must
    /// both match the expected kind; anything else is a schema violation.
    pub async fn resolve_reference(
        store: &EntityStore,
        field: &str,
        target: &Ref,
        expected: EntityKind,
    ) -> Result<EntityHandle> {
        if let Some(declared) = target.ref_type.as_deref() {
            if declared != expected.type_name() {
                return Err(LcaError::Schema(format!(
                    "'{}' expects {} but references {} {}",
                    field, expected, declared, target.id
                )));
            }
        }
        store.get(expected, target.id).await
    }

    /// Fetch `kind`/`id` and everything it references.
    ///
    /// Ownership edges are followed breadth first while `depth` allows;
    /// metadata edges of every expanded entity are resolved and kind-checked
    /// but not expanded further.
    pub async fn hydrate(
        store: &EntityStore,
        kind: EntityKind,
        id: Uuid,
        depth: Depth,
    ) -> Result<EntityGraph> {
        let root = EntityKey::new(kind, id);
        let handle = store.get(kind, id).await?;
        let mut graph = EntityGraph::new(root, handle);

        let mut expanded: HashSet<EntityKey> = HashSet::new();
        let mut queue: VecDeque<(EntityKey, usize)> = VecDeque::new();
        queue.push_back((root, 0));

        while let Some((key, level)) = queue.pop_front() {
            if !depth.expands(level) || !expanded.insert(key) {
                continue;
            }
            let Some(handle) = graph.get(&key).cloned() else {
                continue;
            };

            for pending in pending_refs(&handle) {
                let target = Self::resolve_reference(
                    store,
                    &pending.field,
                    &pending.target,
                    pending.expected,
                )
                .await?;
                let to = EntityKey::new(pending.expected, pending.target.id);
                graph.nodes.entry(to).or_insert(target);
                graph.links.push(Link {
                    from: key,
                    field: pending.field,
                    to,
                    role: pending.role,
                });
                if pending.role == EdgeRole::Ownership {
                    queue.push_back((to, level + 1));
                }
            }
        }

        check_ownership_acyclic(&graph)?;
        check_reference_process(&graph)?;
        log::debug!(
            "hydrated {} with {} entities and {} links",
            root,
            graph.len(),
            graph.links.len()
        );
        Ok(graph)
    }
}

/// A product system needs a reference process with exactly one functional
/// unit. Skipped when `depth` stopped short of the process.
pub fn check_reference_process(graph: &EntityGraph) -> Result<()> {
    if graph.root.kind != EntityKind::ProductSystem {
        return Ok(());
    }
    let has_ref = graph
        .root_handle()
        .read()
        .as_product_system()
        .map_or(false, |system| system.ref_process.is_some());
    if !has_ref {
        return Err(LcaError::Schema(format!(
            "product system {} has no reference process",
            graph.root.id
        )));
    }
    let Some(handle) = graph.follow(&graph.root, "refProcess") else {
        return Ok(());
    };
    let entity = handle.read();
    if let Some(process) = entity.as_process() {
        process.functional_unit()?;
    }
    Ok(())
}

/// Ownership edges must form a DAG; shared sub-graphs are fine
pub fn check_ownership_acyclic(graph: &EntityGraph) -> Result<()> {
    let mut children: BTreeMap<EntityKey, Vec<EntityKey>> = BTreeMap::new();
    for link in graph.links.iter().filter(|l| l.role == EdgeRole::Ownership) {
        children.entry(link.from).or_default().push(link.to);
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Active,
        Done,
    }

    fn visit(
        key: EntityKey,
        children: &BTreeMap<EntityKey, Vec<EntityKey>>,
        marks: &mut BTreeMap<EntityKey, Mark>,
        path: &mut Vec<EntityKey>,
    ) -> Result<()> {
        match marks.get(&key) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Active) => {
                let start = path.iter().position(|k| *k == key).unwrap_or(0);
                let cycle: Vec<String> = path[start..]
                    .iter()
                    .chain(std::iter::once(&key))
                    .map(|k| k.to_string())
                    .collect();
                return Err(LcaError::Schema(format!(
                    "ownership cycle: {}",
                    cycle.join(" -> ")
                )));
            }
            None => {}
        }
        marks.insert(key, Mark::Active);
        path.push(key);
        for child in children.get(&key).into_iter().flatten() {
            visit(*child, children, marks, path)?;
        }
        path.pop();
        marks.insert(key, Mark::Done);
        Ok(())
    }

    let mut marks = BTreeMap::new();
    let mut path = Vec::new();
    for key in children.keys() {
        visit(*key, &children, &mut marks, &mut path)?;
    }
    Ok(())
}
