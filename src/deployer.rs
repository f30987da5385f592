//! High-level planning and deployment facade.
//!
//! The [`Deployer`] wires the pipeline together: diff two snapshots, run
//! validators, build and reshape the dependency graph, collapse cycles into
//! a finalized [`Plan`], and hand the plan to the executor. Callers that
//! only want the plan stop after [`Deployer::plan`]; [`Deployer::deploy`]
//! runs the whole pipeline through execution.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::change::{run_validators, ChangeValidator, DiffEngine};
use crate::element::{Element, ElementHasher, InMemoryElements};
use crate::error::Result;
use crate::planner::{
    resolve, CancelToken, ChangeApplier, ChangeGraph, DependencyChanger, ExecutionReport,
    NoopObserver, Plan, PlanExecutor, PlanObserver,
};

/// Plans and deploys configuration changes between two snapshots.
pub struct Deployer {
    diff_engine: DiffEngine,
    hasher: ElementHasher,
    changers: Vec<Box<dyn DependencyChanger>>,
    validators: Vec<Box<dyn ChangeValidator>>,
    observer: Arc<dyn PlanObserver>,
    concurrency: Option<usize>,
    cancel: CancelToken,
}

impl Deployer {
    /// Creates a deployer with no changers, no validators, and unbounded
    /// concurrency.
    #[must_use]
    pub fn new() -> Self {
        Self {
            diff_engine: DiffEngine::new(),
            hasher: ElementHasher::new(),
            changers: Vec::new(),
            validators: Vec::new(),
            observer: Arc::new(NoopObserver),
            concurrency: None,
            cancel: CancelToken::new(),
        }
    }

    /// Registers a dependency changer.
    ///
    /// Changers run in registration order after the structural edges are in
    /// place; later changers see the edges earlier ones added.
    #[must_use]
    pub fn with_changer(mut self, changer: Box<dyn DependencyChanger>) -> Self {
        self.changers.push(changer);
        self
    }

    /// Registers a change validator.
    ///
    /// Error findings block the affected plan item and its dependents;
    /// warnings are logged and do not affect the plan.
    #[must_use]
    pub fn with_validator(mut self, validator: Box<dyn ChangeValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    /// Registers an observer for planning and execution milestones.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn PlanObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Bounds the number of plan items handed to the adapter at once.
    #[must_use]
    pub const fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = Some(limit);
        self
    }

    /// Attaches a cancellation token for in-flight deployments.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Computes a finalized plan from a before and an after snapshot.
    ///
    /// # Errors
    ///
    /// Returns a diff error if the snapshots carry elements of different
    /// kinds under one identity, and a planning error if a dependency cycle
    /// cannot be collapsed.
    pub fn plan(&self, before: &[Element], after: &[Element]) -> Result<Plan> {
        let changes = self.diff_engine.diff_snapshots(before, after)?;
        info!(%changes, "computed change set");
        self.observer.on_changes(&changes);

        let target = InMemoryElements::from_elements(after.iter().cloned());
        let findings = run_validators(&self.validators, changes.changes(), &target);

        let mut graph = ChangeGraph::build(changes);
        for changer in &self.changers {
            let batch = changer.changes(&graph.view());
            debug!(
                changer = changer.name(),
                changes = batch.len(),
                "applying dependency changes"
            );
            graph.apply(changer.name(), batch);
        }
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "dependency graph ready"
        );
        self.observer
            .on_graph(graph.node_count(), graph.edge_count());

        let mut plan = resolve(graph)?;
        plan.set_fingerprints(
            self.hasher.hash_snapshot(before),
            self.hasher.hash_snapshot(after),
        );

        for finding in findings {
            if finding.is_blocking() {
                warn!(%finding, "blocking plan item");
                let target_id = finding.id.clone();
                plan.block(&target_id, finding);
            } else {
                warn!(%finding, "validation warning");
            }
        }

        info!(plan = %plan.id(), items = plan.len(), "plan finalized");
        Ok(plan)
    }

    /// Executes an already-computed plan against the given adapter.
    ///
    /// # Errors
    ///
    /// Returns a planning error if the plan fails its acyclicity re-check.
    /// Adapter failures are recorded in the report, not returned as errors.
    pub async fn execute<A>(&self, plan: &Plan, applier: A) -> Result<ExecutionReport>
    where
        A: ChangeApplier + 'static,
    {
        let mut executor = PlanExecutor::new()
            .with_observer(Arc::clone(&self.observer))
            .with_cancel_token(self.cancel.clone());
        if let Some(limit) = self.concurrency {
            executor = executor.with_concurrency(limit);
        }
        Ok(executor.execute(plan, applier).await?)
    }

    /// Plans and executes in one pass.
    ///
    /// # Errors
    ///
    /// Returns any error [`Deployer::plan`] or [`Deployer::execute`] would
    /// return.
    pub async fn deploy<A>(
        &self,
        before: &[Element],
        after: &[Element],
        applier: A,
    ) -> Result<ExecutionReport>
    where
        A: ChangeApplier + 'static,
    {
        let plan = self.plan(before, after)?;
        self.execute(&plan, applier).await
    }
}

impl Default for Deployer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{Change, ChangeAction, Finding};
    use crate::element::{ElementId, ElementSource, Field, Instance, ObjectType};
    use crate::planner::{
        DependencyChange, GraphView, ItemOutcome, Outcome, PlanItem, SkipCause,
    };
    use serde_json::json;

    fn lead_type() -> Element {
        Element::Type(
            ObjectType::new(ElementId::object_type("crm", "Lead")).with_field(Field::new(
                ElementId::field("crm", "Lead", "email"),
                "string",
            )),
        )
    }

    fn lead_instance() -> Element {
        Element::Instance(Instance::new(
            ElementId::instance("crm", "Lead", "default"),
            "Lead",
            json!({"email": "a@b.c"}),
        ))
    }

    struct RejectRemovals;

    impl ChangeValidator for RejectRemovals {
        fn name(&self) -> &str {
            "reject-removals"
        }

        fn validate(&self, changes: &[Change], _elements: &dyn ElementSource) -> Vec<Finding> {
            changes
                .iter()
                .filter(|change| change.action() == ChangeAction::Remove)
                .map(|change| Finding::error(change.id().clone(), "removals are not allowed"))
                .collect()
        }
    }

    struct CoupleFields;

    impl DependencyChanger for CoupleFields {
        fn name(&self) -> &str {
            "couple-fields"
        }

        fn changes(&self, view: &GraphView<'_>) -> Vec<DependencyChange> {
            let alpha = ElementId::field("crm", "Lead", "alpha");
            let beta = ElementId::field("crm", "Lead", "beta");
            if view.contains(&alpha) && view.contains(&beta) {
                vec![
                    DependencyChange::add(alpha.clone(), beta.clone()),
                    DependencyChange::add(beta, alpha),
                ]
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn test_plan_orders_type_before_instance() {
        let deployer = Deployer::new();

        let plan = deployer
            .plan(&[], &[lead_instance(), lead_type()])
            .expect("plan should resolve");

        assert_eq!(plan.len(), 2);
        let order: Vec<Vec<ElementId>> = plan.items().map(|(_, item)| item.ids().to_vec()).collect();
        assert_eq!(order[0], vec![ElementId::object_type("crm", "Lead")]);
        assert_eq!(order[1], vec![ElementId::instance("crm", "Lead", "default")]);
    }

    #[test]
    fn test_plan_records_snapshot_fingerprints() {
        let deployer = Deployer::new();
        let after = vec![lead_type()];

        let plan = deployer.plan(&[], &after).expect("plan should resolve");

        let hasher = ElementHasher::new();
        assert_eq!(plan.before_fingerprint(), Some(hasher.hash_snapshot(&[]).as_str()));
        assert_eq!(
            plan.after_fingerprint(),
            Some(hasher.hash_snapshot(&after).as_str())
        );
    }

    #[test]
    fn test_identical_snapshots_produce_empty_plan() {
        let deployer = Deployer::new();
        let snapshot = vec![lead_type(), lead_instance()];

        let plan = deployer
            .plan(&snapshot, &snapshot)
            .expect("plan should resolve");

        assert!(plan.is_empty());
        assert!(!plan.has_changes());
    }

    #[test]
    fn test_error_finding_blocks_plan_item() {
        let deployer = Deployer::new().with_validator(Box::new(RejectRemovals));

        let plan = deployer
            .plan(&[lead_type()], &[])
            .expect("plan should resolve");

        let type_id = ElementId::object_type("crm", "Lead");
        let (_, item) = plan
            .items()
            .find(|(_, item)| item.ids().contains(&type_id))
            .expect("type item");
        assert!(item.blocking_finding().is_some());
    }

    #[test]
    fn test_changer_declared_cycle_merges_into_group() {
        let type_id = ElementId::object_type("crm", "Lead");
        let bare = Element::Type(ObjectType::new(type_id.clone()));
        let full = Element::Type(
            ObjectType::new(type_id)
                .with_field(Field::new(ElementId::field("crm", "Lead", "alpha"), "string"))
                .with_field(Field::new(ElementId::field("crm", "Lead", "beta"), "string")),
        );

        let deployer = Deployer::new().with_changer(Box::new(CoupleFields));

        let plan = deployer.plan(&[bare], &[full]).expect("plan should resolve");

        assert_eq!(plan.len(), 1);
        let (_, item) = plan.items().next().expect("one item");
        assert!(item.is_group());
        assert_eq!(item.action(), ChangeAction::Add);
    }

    #[tokio::test]
    async fn test_deploy_applies_all_items() {
        let deployer = Deployer::new();

        let report = deployer
            .deploy(&[], &[lead_type(), lead_instance()], |_item: &PlanItem| {
                Outcome::Success
            })
            .await
            .expect("deploy should run");

        assert_eq!(report.results().len(), 2);
        assert!(report.all_successful());
    }

    #[tokio::test]
    async fn test_deploy_skips_blocked_items() {
        let deployer = Deployer::new().with_validator(Box::new(RejectRemovals));

        let report = deployer
            .deploy(&[lead_type()], &[], |_item: &PlanItem| Outcome::Success)
            .await
            .expect("deploy should run");

        let type_id = ElementId::object_type("crm", "Lead");
        match report.outcome_for(&type_id) {
            Some(ItemOutcome::Skipped {
                cause: SkipCause::Blocked { .. },
            }) => {}
            other => panic!("expected blocked skip, got {other:?}"),
        }
        assert!(!report.all_successful());
    }

    #[tokio::test]
    async fn test_deploy_of_converged_snapshots_is_empty() {
        let deployer = Deployer::new();
        let snapshot = vec![lead_type()];

        let report = deployer
            .deploy(&snapshot, &snapshot, |_item: &PlanItem| Outcome::Success)
            .await
            .expect("deploy should run");

        assert!(report.results().is_empty());
        assert!(report.all_successful());
    }
}
