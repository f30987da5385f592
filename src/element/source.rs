//! Read-only element lookup.

use std::collections::BTreeMap;

use super::id::ElementId;
use super::model::Element;

/// Read-only lookup of elements by identity.
///
/// Validators and other consumers use this to inspect the surrounding
/// configuration without taking ownership of it.
pub trait ElementSource: Send + Sync {
    /// Looks up an element by identity.
    fn get(&self, id: &ElementId) -> Option<&Element>;
}

/// In-memory element lookup backed by an ordered map.
#[derive(Debug, Default, Clone)]
pub struct InMemoryElements {
    elements: BTreeMap<ElementId, Element>,
}

impl InMemoryElements {
    /// Creates an empty element source.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            elements: BTreeMap::new(),
        }
    }

    /// Creates a source from the given elements.
    ///
    /// Later elements overwrite earlier ones with the same identity.
    #[must_use]
    pub fn from_elements(elements: impl IntoIterator<Item = Element>) -> Self {
        let mut source = Self::new();
        for element in elements {
            source.insert(element);
        }
        source
    }

    /// Inserts an element, keyed by its own identity.
    pub fn insert(&mut self, element: Element) {
        self.elements.insert(element.id().clone(), element);
    }

    /// Returns the number of stored elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if no elements are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterates over the stored elements in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }
}

impl ElementSource for InMemoryElements {
    fn get(&self, id: &ElementId) -> Option<&Element> {
        self.elements.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::model::{Field, Instance};
    use serde_json::json;

    #[test]
    fn test_lookup_by_id() {
        let field_id = ElementId::field("crm", "Lead", "email");
        let source = InMemoryElements::from_elements([Element::Field(Field::new(
            field_id.clone(),
            "string",
        ))]);

        assert_eq!(source.len(), 1);
        assert!(source.get(&field_id).is_some());
        assert!(source.get(&ElementId::field("crm", "Lead", "phone")).is_none());
    }

    #[test]
    fn test_later_elements_overwrite() {
        let instance_id = ElementId::instance("crm", "Lead", "default");
        let source = InMemoryElements::from_elements([
            Element::Instance(Instance::new(instance_id.clone(), "Lead", json!({"a": 1}))),
            Element::Instance(Instance::new(instance_id.clone(), "Lead", json!({"a": 2}))),
        ]);

        assert_eq!(source.len(), 1);
        match source.get(&instance_id) {
            Some(Element::Instance(instance)) => assert_eq!(instance.value, json!({"a": 2})),
            other => panic!("unexpected element: {other:?}"),
        }
    }
}
