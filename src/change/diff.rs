//! Structural diff engine.
//!
//! Compares two configuration snapshots and produces the flat set of
//! changes between them. Typed objects are compared per field, instance
//! data is compared recursively per map key and list index, and primitives
//! by deep equality. Equal inputs always produce an empty change set.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::debug;

use crate::element::{Element, ElementHasher, ElementId, Field, Instance, ObjectType};
use crate::error::DiffError;

use super::model::{Change, ChangeData, ChangeSet};

/// Engine for computing changes between two snapshots.
#[derive(Debug, Default)]
pub struct DiffEngine {
    hasher: ElementHasher,
}

impl DiffEngine {
    /// Creates a new diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hasher: ElementHasher::new(),
        }
    }

    /// Computes the changes between a before and an after snapshot.
    ///
    /// Elements present on one side only become a single add or remove.
    /// Elements present on both sides are compared in depth.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::IncomparableElements`] if the two sides carry
    /// elements of different kinds under the same identity.
    pub fn diff_snapshots(
        &self,
        before: &[Element],
        after: &[Element],
    ) -> Result<ChangeSet, DiffError> {
        let before_map: BTreeMap<&ElementId, &Element> =
            before.iter().map(|element| (element.id(), element)).collect();
        let after_map: BTreeMap<&ElementId, &Element> =
            after.iter().map(|element| (element.id(), element)).collect();

        let ids: BTreeSet<&ElementId> =
            before_map.keys().chain(after_map.keys()).copied().collect();

        let mut changes = ChangeSet::new();
        for id in ids {
            match (before_map.get(id), after_map.get(id)) {
                (Some(old), None) => {
                    debug!(element = %id, "element removed");
                    changes.push(Change::remove(
                        (*id).clone(),
                        ChangeData::Element(Box::new((*old).clone())),
                    ));
                }
                (None, Some(new)) => {
                    debug!(element = %id, "element added");
                    changes.push(Change::add(
                        (*id).clone(),
                        ChangeData::Element(Box::new((*new).clone())),
                    ));
                }
                (Some(old), Some(new)) => {
                    if self.hasher.hash_element(old) == self.hasher.hash_element(new) {
                        debug!(element = %id, "element unchanged, skipping");
                        continue;
                    }
                    self.diff_element(old, new, &mut changes)?;
                }
                (None, None) => {}
            }
        }

        debug!(%changes, "diff complete");
        Ok(changes)
    }

    fn diff_element(
        &self,
        before: &Element,
        after: &Element,
        changes: &mut ChangeSet,
    ) -> Result<(), DiffError> {
        match (before, after) {
            (Element::Type(old), Element::Type(new)) => {
                Self::diff_type(old, new, changes);
                Ok(())
            }
            (Element::Field(old), Element::Field(new)) => {
                Self::diff_field(old, new, changes);
                Ok(())
            }
            (Element::Instance(old), Element::Instance(new)) => {
                Self::diff_instance(old, new, changes);
                Ok(())
            }
            (old, new) => Err(DiffError::IncomparableElements {
                id: old.id().clone(),
                before_kind: old.kind(),
                after_kind: new.kind(),
            }),
        }
    }

    fn diff_type(before: &ObjectType, after: &ObjectType, changes: &mut ChangeSet) {
        if before.annotations != after.annotations {
            changes.push(Change::modify(
                before.id.clone(),
                ChangeData::Value(annotations_value(&before.annotations)),
                ChangeData::Value(annotations_value(&after.annotations)),
            ));
        }

        let names: BTreeSet<&String> = before.fields.keys().chain(after.fields.keys()).collect();
        for name in names {
            match (before.fields.get(name), after.fields.get(name)) {
                (Some(old), None) => changes.push(Change::remove(
                    old.id.clone(),
                    ChangeData::Element(Box::new(Element::Field(old.clone()))),
                )),
                (None, Some(new)) => changes.push(Change::add(
                    new.id.clone(),
                    ChangeData::Element(Box::new(Element::Field(new.clone()))),
                )),
                (Some(old), Some(new)) => Self::diff_field(old, new, changes),
                (None, None) => {}
            }
        }
    }

    fn diff_field(before: &Field, after: &Field, changes: &mut ChangeSet) {
        if before.field_type != after.field_type || before.annotations != after.annotations {
            changes.push(Change::modify(
                before.id.clone(),
                ChangeData::Element(Box::new(Element::Field(before.clone()))),
                ChangeData::Element(Box::new(Element::Field(after.clone()))),
            ));
        }
    }

    fn diff_instance(before: &Instance, after: &Instance, changes: &mut ChangeSet) {
        if before.type_name != after.type_name {
            changes.push(Change::modify(
                before.id.clone(),
                ChangeData::Element(Box::new(Element::Instance(before.clone()))),
                ChangeData::Element(Box::new(Element::Instance(after.clone()))),
            ));
            return;
        }
        Self::diff_values(&before.id, &before.value, &after.value, changes);
    }

    fn diff_values(id: &ElementId, before: &Value, after: &Value, changes: &mut ChangeSet) {
        if before == after {
            return;
        }
        match (before, after) {
            (Value::Object(old), Value::Object(new)) => {
                let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
                for key in keys {
                    let child = id.join_key(key.clone());
                    match (old.get(key), new.get(key)) {
                        (Some(removed), None) => changes.push(Change::remove(
                            child,
                            ChangeData::Value(removed.clone()),
                        )),
                        (None, Some(added)) => {
                            changes.push(Change::add(child, ChangeData::Value(added.clone())));
                        }
                        (Some(left), Some(right)) => {
                            Self::diff_values(&child, left, right, changes);
                        }
                        (None, None) => {}
                    }
                }
            }
            (Value::Array(old), Value::Array(new)) => {
                // Lists compare position by position; reordering shows up as
                // per-index modifications.
                let shared = old.len().min(new.len());
                for index in 0..shared {
                    Self::diff_values(&id.join_index(index), &old[index], &new[index], changes);
                }
                for (index, removed) in old.iter().enumerate().skip(shared) {
                    changes.push(Change::remove(
                        id.join_index(index),
                        ChangeData::Value(removed.clone()),
                    ));
                }
                for (index, added) in new.iter().enumerate().skip(shared) {
                    changes.push(Change::add(
                        id.join_index(index),
                        ChangeData::Value(added.clone()),
                    ));
                }
            }
            _ => changes.push(Change::modify(
                id.clone(),
                ChangeData::Value(before.clone()),
                ChangeData::Value(after.clone()),
            )),
        }
    }
}

fn annotations_value(annotations: &BTreeMap<String, Value>) -> Value {
    Value::Object(
        annotations
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    )
}
