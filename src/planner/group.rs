//! Cycle resolution and grouping.
//!
//! Collapses strongly connected components of the change graph into plan
//! items. Cycles are only collapsible when every member belongs to the same
//! parent element; anything else is a planning failure naming the members.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::change::ChangeAction;
use crate::element::ElementId;
use crate::error::PlanError;

use super::graph::{ChangeGraph, ChangeNode};
use super::plan::{Plan, PlanItem};

/// Resolves the change graph into a finalized plan.
///
/// Singleton components become single-element items. Larger components
/// merge into one grouped item when all members share a parent element,
/// with edges into and out of the members redirected to the group.
///
/// # Errors
///
/// Returns [`PlanError::UnresolvableCycle`] when a cycle spans elements
/// with different parents, and [`PlanError::CycleDetected`] if the
/// collapsed graph still fails the acyclicity check.
pub fn resolve(graph: ChangeGraph) -> Result<Plan, PlanError> {
    let source = graph.into_inner();
    let components = tarjan_scc(&source);

    let mut condensed: DiGraph<PlanItem, ()> =
        DiGraph::with_capacity(components.len(), source.edge_count());
    let mut remap: HashMap<NodeIndex, NodeIndex> = HashMap::new();

    for members in components {
        let item = if let [only] = members.as_slice() {
            single_item(&source, *only)
        } else {
            debug!(members = members.len(), "collapsing dependency cycle");
            merge_members(&source, &members)?
        };
        let group_index = condensed.add_node(item);
        for member in members {
            remap.insert(member, group_index);
        }
    }

    let mut seen: BTreeSet<(NodeIndex, NodeIndex)> = BTreeSet::new();
    for edge in source.edge_references() {
        let (Some(&from), Some(&to)) = (remap.get(&edge.source()), remap.get(&edge.target()))
        else {
            continue;
        };
        if from != to && seen.insert((from, to)) {
            condensed.add_edge(from, to, ());
        }
    }

    Plan::new(condensed)
}

fn single_item(source: &DiGraph<ChangeNode, ()>, index: NodeIndex) -> PlanItem {
    let node = &source[index];
    PlanItem::new(vec![node.id.clone()], node.action, node.changes.clone())
}

fn merge_members(
    source: &DiGraph<ChangeNode, ()>,
    members: &[NodeIndex],
) -> Result<PlanItem, PlanError> {
    let mut nodes: Vec<&ChangeNode> = members.iter().map(|&index| &source[index]).collect();
    nodes.sort_by(|left, right| left.id.cmp(&right.id));

    let parents: Vec<Option<ElementId>> = nodes.iter().map(|node| node.id.parent()).collect();
    let shared = match parents.first() {
        Some(Some(parent)) => Some(parent.clone()),
        _ => None,
    };
    let mergeable =
        shared.is_some() && parents.iter().all(|parent| parent.as_ref() == shared.as_ref());
    if !mergeable {
        return Err(PlanError::UnresolvableCycle {
            ids: nodes.iter().map(|node| node.id.clone()).collect(),
        });
    }

    let mut ids = Vec::with_capacity(nodes.len());
    let mut changes = Vec::new();
    let mut action: Option<ChangeAction> = None;
    for node in nodes {
        ids.push(node.id.clone());
        changes.extend(node.changes.iter().cloned());
        action = match action {
            None => Some(node.action),
            Some(previous) if previous == node.action => Some(previous),
            Some(_) => Some(ChangeAction::Modify),
        };
    }

    Ok(PlanItem::new(
        ids,
        action.unwrap_or(ChangeAction::Modify),
        changes,
    ))
}
