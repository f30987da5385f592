//! Change model.
//!
//! A [`Change`] records one difference between two configuration snapshots.
//! Changes are created by the diff engine, carried through planning, and
//! consumed by exactly one plan item.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::element::{Element, ElementId};

/// The kind of difference a change records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    /// The element or value exists only in the after snapshot.
    Add,
    /// The element or value exists only in the before snapshot.
    Remove,
    /// The element or value exists in both snapshots with different content.
    Modify,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Modify => "modify",
        };
        write!(f, "{label}")
    }
}

/// The before or after content of a change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeData {
    /// A whole element.
    Element(Box<Element>),
    /// A nested value inside instance data.
    Value(Value),
}

/// One recorded difference between two snapshots.
///
/// An add carries only after content, a remove only before content, and a
/// modify carries both. The constructors enforce this shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    id: ElementId,
    action: ChangeAction,
    before: Option<ChangeData>,
    after: Option<ChangeData>,
}

impl Change {
    /// Creates an addition of the given content.
    #[must_use]
    pub const fn add(id: ElementId, after: ChangeData) -> Self {
        Self {
            id,
            action: ChangeAction::Add,
            before: None,
            after: Some(after),
        }
    }

    /// Creates a removal of the given content.
    #[must_use]
    pub const fn remove(id: ElementId, before: ChangeData) -> Self {
        Self {
            id,
            action: ChangeAction::Remove,
            before: Some(before),
            after: None,
        }
    }

    /// Creates a modification from `before` to `after`.
    ///
    /// The diff engine only calls this when the two sides actually differ.
    #[must_use]
    pub const fn modify(id: ElementId, before: ChangeData, after: ChangeData) -> Self {
        Self {
            id,
            action: ChangeAction::Modify,
            before: Some(before),
            after: Some(after),
        }
    }

    /// Returns the identity the change applies to.
    #[must_use]
    pub const fn id(&self) -> &ElementId {
        &self.id
    }

    /// Returns the action of the change.
    #[must_use]
    pub const fn action(&self) -> ChangeAction {
        self.action
    }

    /// Returns the before content, if any.
    #[must_use]
    pub const fn before(&self) -> Option<&ChangeData> {
        self.before.as_ref()
    }

    /// Returns the after content, if any.
    #[must_use]
    pub const fn after(&self) -> Option<&ChangeData> {
        self.after.as_ref()
    }

    /// Returns true if the change targets a top-level element.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.id.is_top_level()
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action, self.id)
    }
}

/// The full set of changes computed from one diff.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    /// Appends a change.
    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    /// Returns the recorded changes.
    #[must_use]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Returns the number of recorded changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns true if no changes were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns true if at least one change was recorded.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Returns the number of additions.
    #[must_use]
    pub fn adds(&self) -> usize {
        self.count(ChangeAction::Add)
    }

    /// Returns the number of removals.
    #[must_use]
    pub fn removes(&self) -> usize {
        self.count(ChangeAction::Remove)
    }

    /// Returns the number of modifications.
    #[must_use]
    pub fn modifies(&self) -> usize {
        self.count(ChangeAction::Modify)
    }

    /// Iterates over the recorded changes.
    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    fn count(&self, action: ChangeAction) -> usize {
        self.changes
            .iter()
            .filter(|change| change.action() == action)
            .count()
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} changes ({} to add, {} to remove, {} to modify)",
            self.len(),
            self.adds(),
            self.removes(),
            self.modifies()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value(data: serde_json::Value) -> ChangeData {
        ChangeData::Value(data)
    }

    #[test]
    fn test_add_has_only_after() {
        let change = Change::add(
            ElementId::instance("crm", "Lead", "default").join_key("owner"),
            value(json!("alice")),
        );

        assert_eq!(change.action(), ChangeAction::Add);
        assert!(change.before().is_none());
        assert!(change.after().is_some());
    }

    #[test]
    fn test_remove_has_only_before() {
        let change = Change::remove(
            ElementId::field("crm", "Lead", "email"),
            value(json!("string")),
        );

        assert_eq!(change.action(), ChangeAction::Remove);
        assert!(change.before().is_some());
        assert!(change.after().is_none());
    }

    #[test]
    fn test_change_set_counters() {
        let mut set = ChangeSet::new();
        assert!(set.is_empty());
        assert!(!set.has_changes());

        set.push(Change::add(
            ElementId::field("crm", "Lead", "email"),
            value(json!("string")),
        ));
        set.push(Change::remove(
            ElementId::field("crm", "Lead", "phone"),
            value(json!("string")),
        ));
        set.push(Change::modify(
            ElementId::instance("crm", "Lead", "default").join_key("owner"),
            value(json!("alice")),
            value(json!("bob")),
        ));

        assert_eq!(set.len(), 3);
        assert_eq!(set.adds(), 1);
        assert_eq!(set.removes(), 1);
        assert_eq!(set.modifies(), 1);
        assert!(set.has_changes());
        assert_eq!(
            set.to_string(),
            "3 changes (1 to add, 1 to remove, 1 to modify)"
        );
    }
}
