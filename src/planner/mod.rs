//! Dependency planning and graph-ordered execution.
//!
//! Builds a dependency graph over a change set, lets pluggable changers
//! reshape it, collapses cycles into grouped plan items, and executes the
//! resulting acyclic plan with bounded concurrency.

mod changer;
mod executor;
mod graph;
mod group;
mod observer;
mod plan;

pub use changer::{DependencyAction, DependencyChange, DependencyChanger};
pub use executor::{
    CancelToken, ChangeApplier, ExecutionReport, ItemOutcome, ItemResult, Outcome, PlanExecutor,
    SkipCause,
};
pub use graph::{ChangeGraph, ChangeNode, GraphView};
pub use group::resolve;
pub use observer::{NoopObserver, PlanObserver};
pub use plan::{Plan, PlanItem, PlanItemId};
