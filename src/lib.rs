// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![warn(missing_docs)]                // All public items should be documented
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::redundant_clone)]     // Useless clones warning

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Confplan
//!
//! A change planning and graph-ordered deployment engine for declarative
//! configuration.
//!
//! ## Overview
//!
//! Confplan turns two configuration snapshots into an executable plan:
//!
//! - Diff a before and an after snapshot into a flat change set
//! - Validate the changes before anything runs
//! - Build a dependency graph and let pluggable changers reshape it
//! - Collapse dependency cycles into grouped plan items
//! - Execute the plan concurrently, in dependency order, against an adapter
//!
//! ## Architecture
//!
//! The pipeline is **plan first, execute second**:
//!
//! 1. **Diff**: [`DiffEngine`] compares snapshots element by element
//! 2. **Plan**: the planner orders changes into an acyclic [`Plan`]
//! 3. **Execute**: [`PlanExecutor`] hands ready items to a [`ChangeApplier`]
//!
//! Adapter failures never abort the run; the executor skips dependents and
//! keeps going, and the final [`ExecutionReport`] names every item exactly
//! once.
//!
//! ## Modules
//!
//! - [`element`]: Element model, identity, hashing, and lookup
//! - [`change`]: Change model, diff engine, and validation
//! - [`planner`]: Dependency graph, cycle grouping, and execution
//! - [`deployer`]: High-level facade wiring the pipeline together
//!
//! ## Example
//!
//! ```no_run
//! use confplan::{Deployer, Element, ElementId, Instance, Outcome, PlanItem};
//!
//! #[tokio::main]
//! async fn main() -> confplan::Result<()> {
//!     let before: Vec<Element> = Vec::new();
//!     let after = vec![Element::Instance(Instance::new(
//!         ElementId::instance("crm", "Lead", "default"),
//!         "Lead",
//!         serde_json::json!({"email": "a@b.c"}),
//!     ))];
//!
//!     let deployer = Deployer::new();
//!     let report = deployer
//!         .deploy(&before, &after, |_item: &PlanItem| Outcome::Success)
//!         .await?;
//!     tracing::info!(%report, "deployment finished");
//!     Ok(())
//! }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod change;
pub mod deployer;
pub mod element;
pub mod error;
pub mod planner;

// ============================================================================
// Re-exports
// ============================================================================

pub use change::{
    Change, ChangeAction, ChangeData, ChangeSet, ChangeValidator, DiffEngine, Finding, Severity,
};
pub use deployer::Deployer;
pub use element::{
    Element, ElementHasher, ElementId, ElementKind, ElementSource, Field, InMemoryElements,
    Instance, ObjectType,
};
pub use error::{ConfplanError, Result};
pub use planner::{
    CancelToken, ChangeApplier, ChangeGraph, DependencyChange, DependencyChanger, ExecutionReport,
    GraphView, ItemOutcome, ItemResult, NoopObserver, Outcome, Plan, PlanExecutor, PlanItem,
    PlanObserver, SkipCause,
};
