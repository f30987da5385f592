//! Concurrent plan execution.
//!
//! Walks a finalized plan, handing every ready item to the injected adapter.
//! Items with no unfinished dependencies run concurrently; a failure settles
//! the failing item and skips everything that depends on it, while unrelated
//! items keep running. Execution always produces a total report: every item
//! ends in exactly one outcome.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::change::ChangeAction;
use crate::element::ElementId;
use crate::error::PlanError;

use super::observer::{NoopObserver, PlanObserver};
use super::plan::{Plan, PlanItem, PlanItemId};

/// Outcome reported by the adapter for one plan item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The item was applied.
    Success,
    /// The item could not be applied.
    Failure {
        /// Reason for the failure.
        reason: String,
    },
    /// The adapter chose not to apply the item.
    ///
    /// A skip settles the item; dependents still run.
    Skip,
}

/// Applies plan items against an external service.
///
/// This is the only extension point into adapter code. The executor treats
/// the call as opaque and never holds shared state while awaiting it.
#[async_trait]
pub trait ChangeApplier: Send + Sync {
    /// Applies one plan item and reports the outcome.
    async fn apply(&self, item: &PlanItem) -> Outcome;
}

#[async_trait]
impl ChangeApplier for Box<dyn ChangeApplier> {
    async fn apply(&self, item: &PlanItem) -> Outcome {
        (**self).apply(item).await
    }
}

#[async_trait]
impl<F> ChangeApplier for F
where
    F: Fn(&PlanItem) -> Outcome + Send + Sync,
{
    async fn apply(&self, item: &PlanItem) -> Outcome {
        self(item)
    }
}

/// Why an item was settled without the adapter applying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipCause {
    /// The adapter declined the item; dependents were released normally.
    Adapter,
    /// A dependency failed, directly or transitively.
    DependencyFailed {
        /// Display name of the failed item at the root of the cascade.
        origin: String,
        /// Reason that item failed.
        reason: String,
    },
    /// The item, or an ancestor of it, was blocked by a validation finding.
    Blocked {
        /// Display name of the blocked item at the root of the cascade.
        origin: String,
        /// Message of the blocking finding.
        message: String,
    },
    /// Execution was cancelled before the item was dispatched.
    Cancelled,
}

impl fmt::Display for SkipCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adapter => write!(f, "skipped by adapter"),
            Self::DependencyFailed { origin, reason } => {
                write!(f, "dependency {origin} failed: {reason}")
            }
            Self::Blocked { origin, message } => write!(f, "blocked by {origin}: {message}"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Final outcome of one plan item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    /// The adapter applied the item.
    Success,
    /// The adapter failed the item.
    Failed {
        /// Reason for the failure.
        reason: String,
    },
    /// The item settled without being applied.
    Skipped {
        /// Why the item was skipped.
        cause: SkipCause,
    },
}

impl ItemOutcome {
    /// Returns true if dependents of the item may run.
    ///
    /// Adapter skips release dependents; every other skip withholds them.
    #[must_use]
    pub const fn releases_dependents(&self) -> bool {
        matches!(
            self,
            Self::Success
                | Self::Skipped {
                    cause: SkipCause::Adapter
                }
        )
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "succeeded"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
            Self::Skipped { cause } => write!(f, "skipped: {cause}"),
        }
    }
}

/// Result of executing a single plan item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemResult {
    /// Identities of the elements in the item.
    pub ids: Vec<ElementId>,
    /// Summarizing action of the item.
    pub action: ChangeAction,
    /// Final outcome of the item.
    pub outcome: ItemOutcome,
}

/// Result of executing an entire plan.
///
/// The report is total: every item of the plan appears exactly once, in
/// dependency order.
#[derive(Debug, Serialize)]
pub struct ExecutionReport {
    plan_id: Uuid,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    results: Vec<ItemResult>,
}

impl ExecutionReport {
    /// Returns the identity of the executed plan.
    #[must_use]
    pub const fn plan_id(&self) -> Uuid {
        self.plan_id
    }

    /// Returns when execution started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns when execution finished.
    #[must_use]
    pub const fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// Returns the per-item results in dependency order.
    #[must_use]
    pub fn results(&self) -> &[ItemResult] {
        &self.results
    }

    /// Returns the number of items that succeeded.
    #[must_use]
    pub fn successful(&self) -> usize {
        self.count(|outcome| matches!(outcome, ItemOutcome::Success))
    }

    /// Returns the number of items that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, ItemOutcome::Failed { .. }))
    }

    /// Returns the number of items that were skipped.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, ItemOutcome::Skipped { .. }))
    }

    /// Returns true if every item succeeded or was skipped by the adapter.
    #[must_use]
    pub fn all_successful(&self) -> bool {
        self.results
            .iter()
            .all(|result| result.outcome.releases_dependents())
    }

    /// Returns the outcome of the item containing the given element.
    #[must_use]
    pub fn outcome_for(&self, id: &ElementId) -> Option<&ItemOutcome> {
        self.results
            .iter()
            .find(|result| result.ids.contains(id))
            .map(|result| &result.outcome)
    }

    fn count(&self, matches: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.results
            .iter()
            .filter(|result| matches(&result.outcome))
            .count()
    }
}

impl fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Executed {} items: {} successful, {} failed, {} skipped",
            self.results.len(),
            self.successful(),
            self.failed(),
            self.skipped()
        )
    }
}

/// Cancellation handle for an in-flight execution.
///
/// Cancelling stops new items from being dispatched; items already handed to
/// the adapter run to completion and their outcomes are still recorded.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a new, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true if cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Executor for finalized plans.
pub struct PlanExecutor {
    concurrency: Option<usize>,
    observer: Arc<dyn PlanObserver>,
    cancel: CancelToken,
}

impl PlanExecutor {
    /// Creates an executor with unbounded concurrency.
    #[must_use]
    pub fn new() -> Self {
        Self {
            concurrency: None,
            observer: Arc::new(NoopObserver),
            cancel: CancelToken::new(),
        }
    }

    /// Bounds the number of items handed to the adapter at once.
    #[must_use]
    pub const fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = Some(limit);
        self
    }

    /// Registers an observer for execution milestones.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn PlanObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Attaches a cancellation token the caller can trigger.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Executes a plan against the given adapter.
    ///
    /// Items are dispatched as soon as all their dependencies have settled;
    /// there is no ordering among items with no dependency relationship.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::CycleDetected`] if the plan fails its acyclicity
    /// re-check. Adapter failures are not errors; they are recorded in the
    /// returned report.
    pub async fn execute<A>(&self, plan: &Plan, applier: A) -> Result<ExecutionReport, PlanError>
    where
        A: ChangeApplier + 'static,
    {
        plan.verify()?;
        let started_at = Utc::now();
        info!(plan = %plan.id(), items = plan.len(), "executing plan");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut run = Run::new(
            plan,
            Arc::new(applier),
            Arc::clone(&self.observer),
            self.concurrency.map(|limit| Arc::new(Semaphore::new(limit))),
            self.cancel.clone(),
            tx,
        );

        let sources: Vec<PlanItemId> = run
            .states
            .iter()
            .filter(|(_, state)| matches!(state, NodeState::Waiting { remaining: 0 }))
            .map(|(&id, _)| id)
            .collect();
        for id in sources {
            run.try_dispatch(id);
        }

        while run.pending > 0 {
            let Some((id, outcome)) = rx.recv().await else {
                break;
            };
            run.record(id, outcome);
        }

        let report = ExecutionReport {
            plan_id: plan.id(),
            started_at,
            finished_at: Utc::now(),
            results: run.into_results(plan),
        };
        info!(plan = %plan.id(), %report, "execution finished");
        Ok(report)
    }
}

impl Default for PlanExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
enum NodeState {
    Waiting { remaining: usize },
    Running,
    Done,
}

/// State of one execution run.
///
/// Owned by the settle loop; spawned tasks only report back over the
/// channel, so every state transition happens in one place.
struct Run {
    applier: Arc<dyn ChangeApplier>,
    observer: Arc<dyn PlanObserver>,
    semaphore: Option<Arc<Semaphore>>,
    cancel: CancelToken,
    tx: mpsc::UnboundedSender<(PlanItemId, Outcome)>,
    states: HashMap<PlanItemId, NodeState>,
    dependents: HashMap<PlanItemId, Vec<PlanItemId>>,
    items: HashMap<PlanItemId, Arc<PlanItem>>,
    outcomes: HashMap<PlanItemId, ItemOutcome>,
    pending: usize,
}

impl Run {
    fn new(
        plan: &Plan,
        applier: Arc<dyn ChangeApplier>,
        observer: Arc<dyn PlanObserver>,
        semaphore: Option<Arc<Semaphore>>,
        cancel: CancelToken,
        tx: mpsc::UnboundedSender<(PlanItemId, Outcome)>,
    ) -> Self {
        let mut states = HashMap::new();
        let mut dependents = HashMap::new();
        let mut items = HashMap::new();
        for (id, item) in plan.items() {
            states.insert(
                id,
                NodeState::Waiting {
                    remaining: plan.dependencies(id).len(),
                },
            );
            dependents.insert(id, plan.dependents(id));
            items.insert(id, Arc::new(item.clone()));
        }
        let pending = items.len();
        Self {
            applier,
            observer,
            semaphore,
            cancel,
            tx,
            states,
            dependents,
            items,
            outcomes: HashMap::new(),
            pending,
        }
    }

    fn try_dispatch(&mut self, id: PlanItemId) {
        let Some(item) = self.items.get(&id).map(Arc::clone) else {
            return;
        };

        if self.cancel.is_cancelled() {
            debug!(item = %item.display_name(), "cancelled before dispatch");
            self.settle(id, ItemOutcome::Skipped {
                cause: SkipCause::Cancelled,
            });
            self.cascade(id, SkipCause::Cancelled);
            return;
        }

        if let Some(finding) = item.blocking_finding() {
            warn!(item = %item.display_name(), %finding, "item blocked by validation finding");
            let cause = SkipCause::Blocked {
                origin: item.display_name(),
                message: finding.message.clone(),
            };
            self.settle(id, ItemOutcome::Skipped {
                cause: cause.clone(),
            });
            self.cascade(id, cause);
            return;
        }

        self.states.insert(id, NodeState::Running);
        let applier = Arc::clone(&self.applier);
        let observer = Arc::clone(&self.observer);
        let semaphore = self.semaphore.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _permit = match semaphore {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            observer.on_item_started(&item);
            debug!(item = %item.display_name(), "dispatching item");
            let outcome = applier.apply(&item).await;
            if tx.send((id, outcome)).is_err() {
                warn!(item = %item.display_name(), "executor gone before outcome was recorded");
            }
        });
    }

    fn record(&mut self, id: PlanItemId, outcome: Outcome) {
        let name = self
            .items
            .get(&id)
            .map(|item| item.display_name())
            .unwrap_or_default();
        match outcome {
            Outcome::Success => {
                debug!(item = %name, "item succeeded");
                self.settle(id, ItemOutcome::Success);
                self.release_dependents(id);
            }
            Outcome::Skip => {
                info!(item = %name, "adapter skipped item");
                self.settle(id, ItemOutcome::Skipped {
                    cause: SkipCause::Adapter,
                });
                self.release_dependents(id);
            }
            Outcome::Failure { reason } => {
                error!(item = %name, %reason, "item failed");
                self.settle(id, ItemOutcome::Failed {
                    reason: reason.clone(),
                });
                self.cascade(id, SkipCause::DependencyFailed {
                    origin: name,
                    reason,
                });
            }
        }
    }

    fn settle(&mut self, id: PlanItemId, outcome: ItemOutcome) {
        self.states.insert(id, NodeState::Done);
        self.pending -= 1;
        if let Some(item) = self.items.get(&id) {
            self.observer.on_item_settled(item, &outcome);
        }
        self.outcomes.insert(id, outcome);
    }

    fn release_dependents(&mut self, id: PlanItemId) {
        let dependents = self.dependents.get(&id).cloned().unwrap_or_default();
        for dependent in dependents {
            let ready = match self.states.get_mut(&dependent) {
                Some(NodeState::Waiting { remaining }) => {
                    *remaining -= 1;
                    *remaining == 0
                }
                _ => false,
            };
            if ready {
                self.try_dispatch(dependent);
            }
        }
    }

    /// Skips every unsettled item reachable from `from`, all traced to the
    /// same originating cause.
    fn cascade(&mut self, from: PlanItemId, cause: SkipCause) {
        let mut queue: VecDeque<PlanItemId> =
            self.dependents.get(&from).cloned().unwrap_or_default().into();
        while let Some(id) = queue.pop_front() {
            if !matches!(self.states.get(&id), Some(NodeState::Waiting { .. })) {
                continue;
            }
            self.settle(id, ItemOutcome::Skipped {
                cause: cause.clone(),
            });
            queue.extend(self.dependents.get(&id).cloned().unwrap_or_default());
        }
    }

    fn into_results(mut self, plan: &Plan) -> Vec<ItemResult> {
        plan.items()
            .filter_map(|(id, item)| {
                let outcome = self.outcomes.remove(&id)?;
                Some(ItemResult {
                    ids: item.ids().to_vec(),
                    action: item.action(),
                    outcome,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::sync::Barrier;

    use crate::change::Finding;
    use crate::element::ElementId;
    use petgraph::graph::DiGraph;

    use super::*;

    fn instance_id(name: &str) -> ElementId {
        ElementId::instance("crm", "Lead", name)
    }

    fn item(name: &str, action: ChangeAction) -> PlanItem {
        PlanItem::new(vec![instance_id(name)], action, Vec::new())
    }

    /// Plan with `first` and `second` independent, and `dependent`
    /// depending on `first`.
    fn fork_plan() -> Plan {
        let mut graph = DiGraph::new();
        let first = graph.add_node(item("first", ChangeAction::Add));
        graph.add_node(item("second", ChangeAction::Add));
        let dependent = graph.add_node(item("dependent", ChangeAction::Add));
        graph.add_edge(dependent, first, ());
        Plan::new(graph).expect("acyclic plan")
    }

    struct Recording {
        log: Arc<Mutex<Vec<String>>>,
        fail: Vec<String>,
        skip: Vec<String>,
    }

    impl Recording {
        fn new(log: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                log,
                fail: Vec::new(),
                skip: Vec::new(),
            }
        }

        fn failing(log: Arc<Mutex<Vec<String>>>, names: &[&str]) -> Self {
            Self {
                log,
                fail: names.iter().map(ToString::to_string).collect(),
                skip: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl ChangeApplier for Recording {
        async fn apply(&self, plan_item: &PlanItem) -> Outcome {
            let name = plan_item.display_name();
            self.log.lock().expect("log lock").push(name.clone());
            if self.fail.iter().any(|failing| name.contains(failing)) {
                Outcome::Failure {
                    reason: String::from("adapter rejected"),
                }
            } else if self.skip.iter().any(|skipping| name.contains(skipping)) {
                Outcome::Skip
            } else {
                Outcome::Success
            }
        }
    }

    #[tokio::test]
    async fn test_independent_items_all_dispatch_concurrently() {
        let mut graph = DiGraph::new();
        graph.add_node(item("one", ChangeAction::Add));
        graph.add_node(item("two", ChangeAction::Add));
        graph.add_node(item("three", ChangeAction::Add));
        let plan = Plan::new(graph).expect("acyclic plan");

        // Every item waits for all three to be in flight; the run only
        // finishes if they really were dispatched together.
        struct Rendezvous {
            barrier: Arc<Barrier>,
        }

        #[async_trait]
        impl ChangeApplier for Rendezvous {
            async fn apply(&self, _item: &PlanItem) -> Outcome {
                self.barrier.wait().await;
                Outcome::Success
            }
        }

        let report = PlanExecutor::new()
            .execute(&plan, Rendezvous {
                barrier: Arc::new(Barrier::new(3)),
            })
            .await
            .expect("execution should complete");

        assert_eq!(report.results().len(), 3);
        assert_eq!(report.successful(), 3);
        assert!(report.all_successful());
    }

    #[tokio::test]
    async fn test_dependencies_settle_before_dependents_dispatch() {
        let mut graph = DiGraph::new();
        let type_node = graph.add_node(item("type", ChangeAction::Add));
        let field_node = graph.add_node(item("field", ChangeAction::Add));
        let instance_node = graph.add_node(item("instance", ChangeAction::Add));
        graph.add_edge(field_node, type_node, ());
        graph.add_edge(instance_node, field_node, ());
        let plan = Plan::new(graph).expect("acyclic plan");

        let log = Arc::new(Mutex::new(Vec::new()));
        let report = PlanExecutor::new()
            .execute(&plan, Recording::new(Arc::clone(&log)))
            .await
            .expect("execution should complete");

        assert_eq!(report.successful(), 3);
        let order = log.lock().expect("log lock").clone();
        let position = |name: &str| {
            order
                .iter()
                .position(|entry| entry.contains(name))
                .expect("item was applied")
        };
        assert!(position("type") < position("field"));
        assert!(position("field") < position("instance"));
    }

    #[tokio::test]
    async fn test_failure_cascades_to_dependents_only() {
        let plan = fork_plan();

        let log = Arc::new(Mutex::new(Vec::new()));
        let report = PlanExecutor::new()
            .execute(&plan, Recording::failing(Arc::clone(&log), &["first"]))
            .await
            .expect("execution should complete");

        assert_eq!(report.successful(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 1);
        assert!(!report.all_successful());

        // The skip names the failing item, not a bare dependency failure.
        match report.outcome_for(&instance_id("dependent")) {
            Some(ItemOutcome::Skipped {
                cause: SkipCause::DependencyFailed { origin, reason },
            }) => {
                assert!(origin.contains("first"));
                assert_eq!(reason, "adapter rejected");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        // The unrelated item ran and was never applied to again.
        assert_eq!(
            report.outcome_for(&instance_id("second")),
            Some(&ItemOutcome::Success)
        );
        let applied = log.lock().expect("log lock").clone();
        assert_eq!(applied.len(), 2);
    }

    #[tokio::test]
    async fn test_adapter_skip_releases_dependents() {
        let plan = fork_plan();

        let log = Arc::new(Mutex::new(Vec::new()));
        let mut applier = Recording::new(Arc::clone(&log));
        applier.skip.push(String::from("first"));

        let report = PlanExecutor::new()
            .execute(&plan, applier)
            .await
            .expect("execution should complete");

        assert_eq!(report.successful(), 2);
        assert_eq!(report.skipped(), 1);
        assert!(report.all_successful());
        assert_eq!(
            report.outcome_for(&instance_id("dependent")),
            Some(&ItemOutcome::Success)
        );
    }

    #[tokio::test]
    async fn test_blocked_item_never_reaches_adapter() {
        let mut plan = fork_plan();
        plan.block(
            &instance_id("first"),
            Finding::error(instance_id("first"), "removal forbidden"),
        );

        let log = Arc::new(Mutex::new(Vec::new()));
        let report = PlanExecutor::new()
            .execute(&plan, Recording::new(Arc::clone(&log)))
            .await
            .expect("execution should complete");

        assert_eq!(report.successful(), 1);
        assert_eq!(report.skipped(), 2);
        match report.outcome_for(&instance_id("dependent")) {
            Some(ItemOutcome::Skipped {
                cause: SkipCause::Blocked { origin, message },
            }) => {
                assert!(origin.contains("first"));
                assert_eq!(message, "removal forbidden");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        // Only the unblocked, independent item was applied.
        let applied = log.lock().expect("log lock").clone();
        assert_eq!(applied.len(), 1);
        assert!(applied[0].contains("second"));
    }

    #[tokio::test]
    async fn test_cancellation_skips_undispatched_items() {
        let mut graph = DiGraph::new();
        let first = graph.add_node(item("first", ChangeAction::Add));
        let dependent = graph.add_node(item("dependent", ChangeAction::Add));
        graph.add_edge(dependent, first, ());
        let plan = Plan::new(graph).expect("acyclic plan");

        struct CancelAfterFirst {
            token: CancelToken,
        }

        #[async_trait]
        impl ChangeApplier for CancelAfterFirst {
            async fn apply(&self, _item: &PlanItem) -> Outcome {
                self.token.cancel();
                Outcome::Success
            }
        }

        let token = CancelToken::new();
        let report = PlanExecutor::new()
            .with_cancel_token(token.clone())
            .execute(&plan, CancelAfterFirst {
                token: token.clone(),
            })
            .await
            .expect("execution should complete");

        // The in-flight item finished and was recorded; the rest never ran.
        assert_eq!(
            report.outcome_for(&instance_id("first")),
            Some(&ItemOutcome::Success)
        );
        assert_eq!(
            report.outcome_for(&instance_id("dependent")),
            Some(&ItemOutcome::Skipped {
                cause: SkipCause::Cancelled
            })
        );
    }

    #[tokio::test]
    async fn test_bounded_concurrency_still_completes() {
        let plan = fork_plan();

        let log = Arc::new(Mutex::new(Vec::new()));
        let report = PlanExecutor::new()
            .with_concurrency(1)
            .execute(&plan, Recording::new(Arc::clone(&log)))
            .await
            .expect("execution should complete");

        assert_eq!(report.successful(), 3);
        assert_eq!(log.lock().expect("log lock").len(), 3);
    }

    #[tokio::test]
    async fn test_report_is_total_and_displays_summary() {
        let plan = fork_plan();

        let log = Arc::new(Mutex::new(Vec::new()));
        let report = PlanExecutor::new()
            .execute(&plan, Recording::failing(Arc::clone(&log), &["first"]))
            .await
            .expect("execution should complete");

        assert_eq!(report.results().len(), plan.len());
        assert_eq!(report.plan_id(), plan.id());
        assert!(report.finished_at() >= report.started_at());
        assert_eq!(
            report.to_string(),
            "Executed 3 items: 1 successful, 1 failed, 1 skipped"
        );
    }

    #[tokio::test]
    async fn test_empty_plan_produces_empty_report() {
        let plan = Plan::new(DiGraph::new()).expect("empty plan");

        let report = PlanExecutor::new()
            .execute(&plan, |_item: &PlanItem| Outcome::Success)
            .await
            .expect("execution should complete");

        assert!(report.results().is_empty());
        assert!(report.all_successful());
    }
}
