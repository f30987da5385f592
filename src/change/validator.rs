//! Change validation.
//!
//! Validators inspect a computed change set before planning and report
//! findings. Error findings block the affected plan item and everything
//! that depends on it; warnings are logged and carried through untouched.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::element::{ElementId, ElementSource};

use super::model::Change;

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Advisory only; the affected item still executes.
    Warning,
    /// Blocks the affected item and its dependents.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Warning => "warning",
            Self::Error => "error",
        };
        write!(f, "{label}")
    }
}

/// One validation finding against a specific element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    /// Identity the finding applies to.
    pub id: ElementId,
    /// Severity of the finding.
    pub severity: Severity,
    /// Human-readable description of the problem.
    pub message: String,
}

impl Finding {
    /// Creates a warning finding.
    #[must_use]
    pub fn warning(id: ElementId, message: impl Into<String>) -> Self {
        Self {
            id,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    /// Creates an error finding.
    #[must_use]
    pub fn error(id: ElementId, message: impl Into<String>) -> Self {
        Self {
            id,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// Returns true if the finding blocks execution of the affected item.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.severity, self.id, self.message)
    }
}

/// Inspects a change set and reports findings.
pub trait ChangeValidator: Send + Sync {
    /// Returns the name of the validator, used in logs.
    fn name(&self) -> &str;

    /// Validates the given changes against the surrounding configuration.
    fn validate(&self, changes: &[Change], elements: &dyn ElementSource) -> Vec<Finding>;
}

/// Runs the given validators in order and collects their findings.
#[must_use]
pub fn run_validators(
    validators: &[Box<dyn ChangeValidator>],
    changes: &[Change],
    elements: &dyn ElementSource,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for validator in validators {
        let reported = validator.validate(changes, elements);
        debug!(
            validator = validator.name(),
            findings = reported.len(),
            "validator finished"
        );
        findings.extend(reported);
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::model::{ChangeData, ChangeSet};
    use crate::change::ChangeAction;
    use crate::element::InMemoryElements;
    use serde_json::json;

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

    struct WarnOnEverything;

    impl ChangeValidator for WarnOnEverything {
        fn name(&self) -> &str {
            "warn-on-everything"
        }

        fn validate(&self, changes: &[Change], _elements: &dyn ElementSource) -> Vec<Finding> {
            changes
                .iter()
                .map(|change| Finding::warning(change.id().clone(), "noted"))
                .collect()
        }
    }

    #[test]
    fn test_validators_run_in_order() {
        let mut set = ChangeSet::new();
        set.push(Change::remove(
            ElementId::field("crm", "Lead", "email"),
            ChangeData::Value(json!("string")),
        ));

        let validators: Vec<Box<dyn ChangeValidator>> =
            vec![Box::new(RejectRemovals), Box::new(WarnOnEverything)];
        let elements = InMemoryElements::new();

        let findings = run_validators(&validators, set.changes(), &elements);

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(findings[0].is_blocking());
        assert_eq!(findings[1].severity, Severity::Warning);
        assert!(!findings[1].is_blocking());
    }
}
