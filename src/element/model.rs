//! Configuration element model.
//!
//! Elements are immutable snapshots of configuration state: object types
//! with their fields and annotations, and instances carrying arbitrary
//! nested data. The diff engine never mutates elements; it only reads
//! before and after snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::{ElementId, ElementKind};

/// A field declared by an object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Identity of the field.
    pub id: ElementId,
    /// Name of the field's value type.
    pub field_type: String,
    /// Annotations attached to the field.
    pub annotations: BTreeMap<String, Value>,
}

impl Field {
    /// Creates a field with no annotations.
    #[must_use]
    pub fn new(id: ElementId, field_type: impl Into<String>) -> Self {
        Self {
            id,
            field_type: field_type.into(),
            annotations: BTreeMap::new(),
        }
    }

    /// Adds an annotation to the field.
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: Value) -> Self {
        self.annotations.insert(key.into(), value);
        self
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.id.name().unwrap_or_default()
    }
}

/// An object type: a named schema declaring fields and annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectType {
    /// Identity of the type.
    pub id: ElementId,
    /// Fields declared by the type, keyed by field name.
    pub fields: BTreeMap<String, Field>,
    /// Annotations attached to the type itself.
    pub annotations: BTreeMap<String, Value>,
}

impl ObjectType {
    /// Creates an object type with no fields or annotations.
    #[must_use]
    pub const fn new(id: ElementId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
            annotations: BTreeMap::new(),
        }
    }

    /// Adds a field to the type, keyed by the field's own name.
    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.insert(field.name().to_string(), field);
        self
    }

    /// Adds an annotation to the type.
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: Value) -> Self {
        self.annotations.insert(key.into(), value);
        self
    }
}

/// A configuration instance of an object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Identity of the instance.
    pub id: ElementId,
    /// Name of the type this instance configures.
    pub type_name: String,
    /// Instance data as an arbitrary nested value.
    pub value: Value,
}

impl Instance {
    /// Creates an instance carrying the given data.
    #[must_use]
    pub fn new(id: ElementId, type_name: impl Into<String>, value: Value) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            value,
        }
    }
}

/// A top-level configuration element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum Element {
    /// An object type declaration.
    Type(ObjectType),
    /// A field declaration.
    Field(Field),
    /// A configuration instance.
    Instance(Instance),
}

impl Element {
    /// Returns the identity of the element.
    #[must_use]
    pub const fn id(&self) -> &ElementId {
        match self {
            Self::Type(object_type) => &object_type.id,
            Self::Field(field) => &field.id,
            Self::Instance(instance) => &instance.id,
        }
    }

    /// Returns the kind of the element.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Type(_) => ElementKind::Type,
            Self::Field(_) => ElementKind::Field,
            Self::Instance(_) => ElementKind::Instance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_type_keys_fields_by_name() {
        let type_id = ElementId::object_type("crm", "Lead");
        let object_type = ObjectType::new(type_id)
            .with_field(Field::new(
                ElementId::field("crm", "Lead", "email"),
                "string",
            ))
            .with_field(Field::new(
                ElementId::field("crm", "Lead", "score"),
                "number",
            ));

        assert_eq!(object_type.fields.len(), 2);
        assert!(object_type.fields.contains_key("email"));
        assert!(object_type.fields.contains_key("score"));
    }

    #[test]
    fn test_element_id_and_kind() {
        let instance = Element::Instance(Instance::new(
            ElementId::instance("crm", "Lead", "default"),
            "Lead",
            json!({"email": "a@b.c"}),
        ));
        assert_eq!(instance.kind(), ElementKind::Instance);
        assert_eq!(
            instance.id(),
            &ElementId::instance("crm", "Lead", "default")
        );
    }
}
