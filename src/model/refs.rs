use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::model::EntityKind;

/// A raw, unresolved link from one document to another.
///
/// `@type` is what the referring document claims; the registry says what the
/// field expects. Resolution checks both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ref {
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub ref_type: Option<String>,
    #[serde(rename = "@id")]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Ref {
    pub fn new(kind: EntityKind, id: Uuid, name: Option<String>) -> Self {
        Self {
            ref_type: Some(kind.type_name().to_string()),
            id,
            name,
            category: None,
            other: Map::new(),
        }
    }

    /// The kind the referring document declares, if it names a root kind
    pub fn declared_kind(&self) -> Option<EntityKind> {
        self.ref_type.as_deref().and_then(EntityKind::from_type_name)
    }

    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// Whether a reference field owns its target or merely points at metadata.
///
/// Only ownership edges are followed recursively when a graph is hydrated;
/// metadata edges resolve one level and may point back at visited entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeRole {
    Ownership,
    Metadata,
}

/// One reference field occurrence inside an entity, ready for resolution
#[derive(Debug, Clone, PartialEq)]
pub struct RefSlot<'a> {
    /// Concrete path, e.g. `exchanges[2].flow`
    pub field: String,
    pub target: &'a Ref,
    pub expected: EntityKind,
    pub role: EdgeRole,
}

/// Strip array indices so a concrete path can be looked up in the registry
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut in_index = false;
    for c in path.chars() {
        match c {
            '[' => {
                in_index = true;
                out.push('[');
            }
            ']' => {
                in_index = false;
                out.push(']');
            }
            _ if in_index => {}
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("exchanges[12].flow"), "exchanges[].flow");
        assert_eq!(normalize_path("processDocumentation.reviewer"), "processDocumentation.reviewer");
        assert_eq!(normalize_path("processes[0]"), "processes[]");
    }

    #[test]
    fn test_ref_keeps_unknown_keys() {
        let json = serde_json::json!({
            "@type": "Flow",
            "@id": "0d3ab0a0-4b3e-4a6e-9d9e-0b5e6a1f8c11",
            "name": "Water",
            "flowType": "ELEMENTARY_FLOW",
            "refUnit": "kg"
        });
        let r: Ref = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(r.declared_kind(), Some(EntityKind::Flow));
        assert_eq!(r.other.len(), 2);
        assert_eq!(serde_json::to_value(&r).unwrap(), json);
    }
}
