//! Change graph construction.
//!
//! Builds the raw dependency graph over one node per changed top-level
//! element. Nested changes attach to their top-level parent's node. The
//! builder adds structural edges derived from the element hierarchy first,
//! then applies each registered dependency changer's batch in order.

use std::collections::BTreeMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use tracing::{debug, warn};

use crate::change::{Change, ChangeAction, ChangeSet};
use crate::element::{ElementId, ElementKind};

use super::changer::{DependencyAction, DependencyChange};

/// One graph node: all changes touching a single top-level element.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeNode {
    /// Identity of the top-level element.
    pub id: ElementId,
    /// Coarse action for the element as a whole.
    ///
    /// This is the action of the change targeting the element itself, or
    /// `Modify` when only nested details changed.
    pub action: ChangeAction,
    /// All changes grouped under this element, in diff order.
    pub changes: Vec<Change>,
}

/// Dependency graph over changed top-level elements.
///
/// Edges mean "source depends on target": the target must complete before
/// the source starts.
#[derive(Debug)]
pub struct ChangeGraph {
    graph: DiGraph<ChangeNode, ()>,
    indices: BTreeMap<ElementId, NodeIndex>,
}

impl ChangeGraph {
    /// Builds the graph from a change set.
    ///
    /// Changes are grouped by their top-level parent element, then the
    /// structural edges implied by the element hierarchy are added.
    #[must_use]
    pub fn build(changes: ChangeSet) -> Self {
        let mut grouped: BTreeMap<ElementId, Vec<Change>> = BTreeMap::new();
        for change in changes {
            grouped
                .entry(change.id().top_level_parent())
                .or_default()
                .push(change);
        }

        let mut graph = DiGraph::new();
        let mut indices = BTreeMap::new();
        for (id, node_changes) in grouped {
            let action = node_changes
                .iter()
                .find(|change| change.id() == &id)
                .map_or(ChangeAction::Modify, Change::action);
            let index = graph.add_node(ChangeNode {
                id: id.clone(),
                action,
                changes: node_changes,
            });
            indices.insert(id, index);
        }

        let mut built = Self { graph, indices };
        built.add_structural_edges();
        debug!(
            nodes = built.node_count(),
            edges = built.edge_count(),
            "change graph built"
        );
        built
    }

    /// Applies one changer's batch of edge edits.
    ///
    /// Edits naming elements outside the graph are logged and skipped, as
    /// are self edges and duplicate additions.
    pub fn apply(&mut self, changer: &str, batch: Vec<DependencyChange>) {
        for edit in batch {
            let (Some(&source), Some(&target)) = (
                self.indices.get(&edit.source),
                self.indices.get(&edit.target),
            ) else {
                debug!(
                    changer,
                    source = %edit.source,
                    target = %edit.target,
                    "edge edit names an element outside the graph, skipping"
                );
                continue;
            };
            match edit.action {
                DependencyAction::Add => {
                    if source == target {
                        warn!(changer, element = %edit.source, "self edge rejected");
                        continue;
                    }
                    if self.graph.find_edge(source, target).is_none() {
                        self.graph.add_edge(source, target, ());
                    }
                }
                DependencyAction::Remove => {
                    if let Some(edge) = self.graph.find_edge(source, target) {
                        self.graph.remove_edge(edge);
                    }
                }
            }
        }
    }

    /// Returns a read-only snapshot of the current graph.
    #[must_use]
    pub const fn view(&self) -> GraphView<'_> {
        GraphView {
            graph: &self.graph,
            indices: &self.indices,
        }
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub(crate) fn into_inner(self) -> DiGraph<ChangeNode, ()> {
        self.graph
    }

    fn add_structural_edges(&mut self) {
        let nodes: Vec<(ElementId, ChangeAction)> = self
            .graph
            .node_weights()
            .map(|node| (node.id.clone(), node.action))
            .collect();

        for (id, action) in &nodes {
            match (id.kind(), action) {
                // A field lands after the type declaring it.
                (ElementKind::Field, ChangeAction::Add | ChangeAction::Modify) => {
                    if let Some(type_id) = declaring_type(id)
                        && matches!(
                            self.action_of(&type_id),
                            Some(ChangeAction::Add | ChangeAction::Modify)
                        )
                    {
                        self.add_structural_edge(id, &type_id);
                    }
                }
                // An instance cannot exist before its type does.
                (ElementKind::Instance, ChangeAction::Add) => {
                    if let Some(type_id) = declaring_type(id)
                        && self.action_of(&type_id) == Some(ChangeAction::Add)
                    {
                        self.add_structural_edge(id, &type_id);
                    }
                }
                // Instance data follows the shape of its type's fields.
                (ElementKind::Instance, ChangeAction::Modify) => {
                    for (other_id, other_action) in &nodes {
                        if other_id.kind() == ElementKind::Field
                            && matches!(other_action, ChangeAction::Add | ChangeAction::Remove)
                            && same_declaring_type(id, other_id)
                        {
                            self.add_structural_edge(id, other_id);
                        }
                    }
                }
                // A type goes away only after its children have.
                (ElementKind::Type, ChangeAction::Remove) => {
                    for (other_id, other_action) in &nodes {
                        if matches!(
                            other_id.kind(),
                            ElementKind::Field | ElementKind::Instance
                        ) && *other_action == ChangeAction::Remove
                            && declaring_type(other_id).as_ref() == Some(id)
                        {
                            self.add_structural_edge(id, other_id);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn action_of(&self, id: &ElementId) -> Option<ChangeAction> {
        self.indices
            .get(id)
            .and_then(|index| self.graph.node_weight(*index))
            .map(|node| node.action)
    }

    fn add_structural_edge(&mut self, source: &ElementId, target: &ElementId) {
        if let (Some(&source_index), Some(&target_index)) =
            (self.indices.get(source), self.indices.get(target))
            && source_index != target_index
            && self.graph.find_edge(source_index, target_index).is_none()
        {
            debug!(source = %source, target = %target, "structural dependency");
            self.graph.add_edge(source_index, target_index, ());
        }
    }
}

/// Read-only snapshot of a change graph, handed to dependency changers.
#[derive(Debug, Clone, Copy)]
pub struct GraphView<'a> {
    graph: &'a DiGraph<ChangeNode, ()>,
    indices: &'a BTreeMap<ElementId, NodeIndex>,
}

impl<'a> GraphView<'a> {
    /// Iterates over all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &'a ChangeNode> {
        self.graph.node_weights()
    }

    /// Looks up a node by top-level element identity.
    #[must_use]
    pub fn node(&self, id: &ElementId) -> Option<&'a ChangeNode> {
        self.indices
            .get(id)
            .and_then(|index| self.graph.node_weight(*index))
    }

    /// Returns true if the graph has a node for the given identity.
    #[must_use]
    pub fn contains(&self, id: &ElementId) -> bool {
        self.indices.contains_key(id)
    }

    /// Returns all edges as `(source, target)` identity pairs.
    #[must_use]
    pub fn edges(&self) -> Vec<(&'a ElementId, &'a ElementId)> {
        self.graph
            .edge_references()
            .filter_map(|edge| {
                let source = self.graph.node_weight(edge.source())?;
                let target = self.graph.node_weight(edge.target())?;
                Some((&source.id, &target.id))
            })
            .collect()
    }

    /// Returns true if `source` directly depends on `target`.
    #[must_use]
    pub fn depends_on(&self, source: &ElementId, target: &ElementId) -> bool {
        match (self.indices.get(source), self.indices.get(target)) {
            (Some(&source_index), Some(&target_index)) => {
                self.graph.find_edge(source_index, target_index).is_some()
            }
            _ => false,
        }
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

fn declaring_type(id: &ElementId) -> Option<ElementId> {
    id.type_name()
        .map(|type_name| ElementId::object_type(id.service_name(), type_name))
}

fn same_declaring_type(left: &ElementId, right: &ElementId) -> bool {
    left.service_name() == right.service_name() && left.type_name() == right.type_name()
}
