use serde_json::{Map, Number, Value};

use crate::error::{LcaError, Result};
use crate::model::registry;
use crate::model::{Entity, EntityKind, FieldDef, FieldShape};

/// Keys that make up an entity's identity
const IDENTITY_FIELDS: [&str; 2] = ["@id", "@type"];

pub struct EditValidator;

impl EditValidator {
    /// Look up an editable field of `kind`
    pub fn field(kind: EntityKind, path: &str) -> Result<&'static FieldDef> {
        if IDENTITY_FIELDS.contains(&path) {
            return Err(LcaError::validation(path, "entity identity is immutable"));
        }
        let def = registry::field(kind, path)
            .ok_or_else(|| LcaError::validation(path, format!("{} has no such field", kind)))?;
        if !def.is_editable() {
            return Err(LcaError::validation(
                path,
                "list entries cannot be edited individually",
            ));
        }
        Ok(def)
    }

    /// Parse user input for a scalar field. Empty input clears the field.
    pub fn parse_scalar(def: &FieldDef, raw: &str) -> Result<Value> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Value::Null);
        }
        match def.shape {
            FieldShape::Text => Ok(Value::String(raw.to_string())),
            FieldShape::Number => {
                let number: f64 = raw
                    .parse()
                    .map_err(|_| LcaError::validation(def.path, format!("'{}' is not a number", raw)))?;
                Number::from_f64(number)
                    .map(Value::Number)
                    .ok_or_else(|| LcaError::validation(def.path, "number must be finite"))
            }
            FieldShape::Flag => match raw.to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
                "false" | "no" | "n" | "0" => Ok(Value::Bool(false)),
                _ => Err(LcaError::validation(def.path, format!("'{}' is not yes/no", raw))),
            },
            FieldShape::Reference(kind, _) => Err(LcaError::validation(
                def.path,
                format!("expects a {} reference, not a literal", kind),
            )),
        }
    }

    /// Produce the edited entity without touching the original.
    ///
    /// The value is written into the JSON form at a dotted path and decoded
    /// back, so type mismatches surface as validation errors.
    pub fn apply(entity: &Entity, path: &str, value: Value) -> Result<Entity> {
        let mut doc = serde_json::to_value(entity)
            .map_err(|e| LcaError::validation(path, e.to_string()))?;
        set_path(&mut doc, path, value)?;
        let edited: Entity =
            serde_json::from_value(doc).map_err(|e| LcaError::validation(path, e.to_string()))?;
        if edited.kind() != entity.kind() || edited.id() != entity.id() {
            return Err(LcaError::validation(path, "entity identity is immutable"));
        }
        Ok(edited)
    }
}

fn set_path(doc: &mut Value, path: &str, value: Value) -> Result<()> {
    let mut segments: Vec<&str> = path.split('.').collect();
    let last = segments
        .pop()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| LcaError::validation(path, "empty field path"))?;

    let mut current = doc;
    for segment in segments {
        let obj = current
            .as_object_mut()
            .ok_or_else(|| LcaError::validation(path, format!("'{}' is not an object", segment)))?;
        let slot = obj
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if slot.is_null() {
            *slot = Value::Object(Map::new());
        }
        current = slot;
    }

    let obj = current
        .as_object_mut()
        .ok_or_else(|| LcaError::validation(path, "parent is not an object"))?;
    if value.is_null() {
        obj.remove(last);
    } else {
        obj.insert(last.to_string(), value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn process() -> Entity {
        serde_json::from_value(json!({
            "@type": "Process",
            "@id": "7a1c2e0f-1b2c-4d3e-8f90-a1b2c3d4e5f6",
            "name": "Electricity, at grid",
            "processType": "UNIT_PROCESS"
        }))
        .unwrap()
    }

    #[test]
    fn test_identity_is_immutable() {
        let err = EditValidator::field(EntityKind::Process, "@id").unwrap_err();
        assert!(matches!(err, LcaError::Validation { .. }));
    }

    #[test]
    fn test_unknown_and_list_fields_rejected() {
        assert!(EditValidator::field(EntityKind::Process, "colour").is_err());
        assert!(EditValidator::field(EntityKind::Process, "exchanges[].flow").is_err());
        assert!(EditValidator::field(EntityKind::Process, "processType").is_ok());
    }

    #[test]
    fn test_parse_scalar_shapes() {
        let amount = EditValidator::field(EntityKind::ProductSystem, "targetAmount").unwrap();
        assert_eq!(EditValidator::parse_scalar(amount, "2.5").unwrap(), json!(2.5));
        assert!(EditValidator::parse_scalar(amount, "lots").is_err());

        let infra = EditValidator::field(EntityKind::Process, "isInfrastructureProcess").unwrap();
        assert_eq!(EditValidator::parse_scalar(infra, "yes").unwrap(), json!(true));
        assert!(EditValidator::parse_scalar(infra, "maybe").is_err());
    }

    #[test]
    fn test_apply_creates_nested_objects() {
        let edited = EditValidator::apply(
            &process(),
            "processDocumentation.geographyDescription",
            json!("ERCOT region"),
        )
        .unwrap();
        let doc = edited.as_process().unwrap().process_documentation.as_ref().unwrap();
        assert_eq!(doc.geography_description.as_deref(), Some("ERCOT region"));
    }

    #[test]
    fn test_apply_null_clears_field() {
        let edited = EditValidator::apply(&process(), "processType", Value::Null).unwrap();
        assert_eq!(edited.as_process().unwrap().process_type, None);
    }

    #[test]
    fn test_apply_rejects_wrong_type() {
        let err = EditValidator::apply(&process(), "processType", json!({"nested": true}))
            .unwrap_err();
        assert!(matches!(err, LcaError::Validation { .. }));
    }
}
