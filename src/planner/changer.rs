//! Pluggable dependency changers.
//!
//! A dependency changer contributes extra ordering constraints to the change
//! graph. Changers are pure functions over a read-only graph snapshot; the
//! planner applies each changer's batch of edge edits before running the
//! next one, in the order the caller registered them.

use serde::Serialize;

use crate::element::ElementId;

use super::graph::GraphView;

/// Whether a dependency edge is being added or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyAction {
    /// Add an edge from `source` to `target`.
    Add,
    /// Remove the edge from `source` to `target`, if present.
    Remove,
}

/// One edge edit requested by a dependency changer.
///
/// Edges are keyed by top-level element identity and mean "source depends
/// on target": the target completes before the source starts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyChange {
    /// Whether the edge is added or removed.
    pub action: DependencyAction,
    /// The dependent element.
    pub source: ElementId,
    /// The element depended on.
    pub target: ElementId,
}

impl DependencyChange {
    /// Creates an edge addition.
    #[must_use]
    pub const fn add(source: ElementId, target: ElementId) -> Self {
        Self {
            action: DependencyAction::Add,
            source,
            target,
        }
    }

    /// Creates an edge removal.
    #[must_use]
    pub const fn remove(source: ElementId, target: ElementId) -> Self {
        Self {
            action: DependencyAction::Remove,
            source,
            target,
        }
    }
}

/// Contributes dependency edges to the change graph.
pub trait DependencyChanger: Send + Sync {
    /// Returns the name of the changer, used in logs.
    fn name(&self) -> &str;

    /// Computes the edge edits this changer wants, given the current graph.
    fn changes(&self, view: &GraphView<'_>) -> Vec<DependencyChange>;
}
