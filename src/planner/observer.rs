//! Injected plan telemetry.
//!
//! Callers that want visibility into planning and execution milestones
//! implement [`PlanObserver`] and register it on the deployer or executor.
//! All hooks default to no-ops, so implementations only override what they
//! care about.

use crate::change::ChangeSet;

use super::executor::ItemOutcome;
use super::plan::PlanItem;

/// Receives notifications at plan computation and execution milestones.
pub trait PlanObserver: Send + Sync {
    /// Called after the diff engine produced the change set.
    fn on_changes(&self, _changes: &ChangeSet) {}

    /// Called after the dependency graph was built and all changers ran.
    fn on_graph(&self, _nodes: usize, _edges: usize) {}

    /// Called when an item is handed to the adapter.
    fn on_item_started(&self, _item: &PlanItem) {}

    /// Called when an item reaches its final outcome.
    fn on_item_settled(&self, _item: &PlanItem, _outcome: &ItemOutcome) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PlanObserver for NoopObserver {}
