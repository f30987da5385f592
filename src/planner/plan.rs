//! Finalized execution plans.
//!
//! A [`Plan`] is the acyclic, grouped graph produced by the cycle resolver.
//! Each [`PlanItem`] is one deployable unit: a single changed element, or a
//! group of elements whose changes must land together.

use std::fmt;

use chrono::{DateTime, Utc};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::change::{Change, ChangeAction, Finding};
use crate::element::ElementId;
use crate::error::PlanError;

/// Opaque handle of one item within a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlanItemId(pub(crate) NodeIndex);

/// One deployable unit of a plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanItem {
    ids: Vec<ElementId>,
    action: ChangeAction,
    changes: Vec<Change>,
    blocked: Option<Finding>,
}

impl PlanItem {
    pub(crate) const fn new(
        ids: Vec<ElementId>,
        action: ChangeAction,
        changes: Vec<Change>,
    ) -> Self {
        Self {
            ids,
            action,
            changes,
            blocked: None,
        }
    }

    /// Returns the identities of the elements in this item.
    ///
    /// Single-element items have exactly one identity; grouped items list
    /// every member.
    #[must_use]
    pub fn ids(&self) -> &[ElementId] {
        &self.ids
    }

    /// Returns the summarizing action for the item.
    ///
    /// Grouped items with mixed member actions summarize as `Modify`.
    #[must_use]
    pub const fn action(&self) -> ChangeAction {
        self.action
    }

    /// Returns the fine-grained changes carried by this item.
    #[must_use]
    pub fn detailed_changes(&self) -> &[Change] {
        &self.changes
    }

    /// Returns true if this item groups more than one element.
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.ids.len() > 1
    }

    /// Returns the validation finding blocking this item, if any.
    #[must_use]
    pub const fn blocking_finding(&self) -> Option<&Finding> {
        self.blocked.as_ref()
    }

    /// Returns a readable name for the item.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" + ")
    }

    pub(crate) fn block(&mut self, finding: Finding) {
        self.blocked = Some(finding);
    }
}

impl fmt::Display for PlanItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action, self.display_name())?;
        if self.blocked.is_some() {
            write!(f, " [blocked]")?;
        }
        Ok(())
    }
}

/// A finalized, acyclic, grouped execution plan.
#[derive(Debug)]
pub struct Plan {
    id: Uuid,
    created_at: DateTime<Utc>,
    before_fingerprint: Option<String>,
    after_fingerprint: Option<String>,
    graph: DiGraph<PlanItem, ()>,
    order: Vec<NodeIndex>,
}

impl Plan {
    pub(crate) fn new(graph: DiGraph<PlanItem, ()>) -> Result<Self, PlanError> {
        let order = Self::dependency_order(&graph)?;
        Ok(Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            before_fingerprint: None,
            after_fingerprint: None,
            graph,
            order,
        })
    }

    pub(crate) fn set_fingerprints(&mut self, before: String, after: String) {
        self.before_fingerprint = Some(before);
        self.after_fingerprint = Some(after);
    }

    /// Returns the unique identity of this plan.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns when this plan was finalized.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the fingerprint of the before snapshot, if recorded.
    #[must_use]
    pub fn before_fingerprint(&self) -> Option<&str> {
        self.before_fingerprint.as_deref()
    }

    /// Returns the fingerprint of the after snapshot, if recorded.
    #[must_use]
    pub fn after_fingerprint(&self) -> Option<&str> {
        self.after_fingerprint.as_deref()
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns true if the plan has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns true if the plan carries any work.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.is_empty()
    }

    /// Iterates over the items in dependency order.
    ///
    /// Every item appears after all the items it depends on.
    pub fn items(&self) -> impl Iterator<Item = (PlanItemId, &PlanItem)> {
        self.order.iter().filter_map(|&index| {
            self.graph
                .node_weight(index)
                .map(|item| (PlanItemId(index), item))
        })
    }

    /// Looks up an item by handle.
    #[must_use]
    pub fn item(&self, id: PlanItemId) -> Option<&PlanItem> {
        self.graph.node_weight(id.0)
    }

    /// Returns the items the given item directly depends on.
    #[must_use]
    pub fn dependencies(&self, id: PlanItemId) -> Vec<PlanItemId> {
        self.graph
            .neighbors_directed(id.0, Direction::Outgoing)
            .map(PlanItemId)
            .collect()
    }

    /// Returns the items that directly depend on the given item.
    #[must_use]
    pub fn dependents(&self, id: PlanItemId) -> Vec<PlanItemId> {
        self.graph
            .neighbors_directed(id.0, Direction::Incoming)
            .map(PlanItemId)
            .collect()
    }

    /// Returns the number of items summarized as additions.
    #[must_use]
    pub fn adds(&self) -> usize {
        self.count(ChangeAction::Add)
    }

    /// Returns the number of items summarized as removals.
    #[must_use]
    pub fn removes(&self) -> usize {
        self.count(ChangeAction::Remove)
    }

    /// Returns the number of items summarized as modifications.
    #[must_use]
    pub fn modifies(&self) -> usize {
        self.count(ChangeAction::Modify)
    }

    /// Re-checks that the plan is acyclic.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::CycleDetected`] if a cycle is present.
    pub fn verify(&self) -> Result<(), PlanError> {
        Self::dependency_order(&self.graph).map(|_| ())
    }

    /// Blocks the item containing the given element behind a finding.
    ///
    /// The executor settles blocked items as skipped without invoking the
    /// adapter, and cascades the skip to their dependents. Naming an
    /// element outside the plan is a no-op.
    pub fn block(&mut self, target: &ElementId, finding: Finding) {
        let found = self
            .graph
            .node_indices()
            .find(|&index| {
                self.graph
                    .node_weight(index)
                    .is_some_and(|item| item.ids.contains(target))
            });
        match found.and_then(|index| self.graph.node_weight_mut(index)) {
            Some(item) => item.block(finding),
            None => debug!(element = %target, "no plan item to block"),
        }
    }

    fn count(&self, action: ChangeAction) -> usize {
        self.graph
            .node_weights()
            .filter(|item| item.action == action)
            .count()
    }

    fn dependency_order(graph: &DiGraph<PlanItem, ()>) -> Result<Vec<NodeIndex>, PlanError> {
        let mut sorted = toposort(graph, None).map_err(|cycle| PlanError::CycleDetected {
            ids: graph
                .node_weight(cycle.node_id())
                .map(|item| item.ids.clone())
                .unwrap_or_default(),
        })?;
        // Edges point from dependent to dependency; reversing the sort puts
        // dependencies first.
        sorted.reverse();
        Ok(sorted)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Plan {} ({} items: {} to add, {} to remove, {} to modify)",
            self.id,
            self.len(),
            self.adds(),
            self.removes(),
            self.modifies()
        )?;
        for (position, (_, item)) in self.items().enumerate() {
            writeln!(f, "  {}. {item}", position + 1)?;
        }
        Ok(())
    }
}
