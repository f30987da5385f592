//! Error types for the configuration planning engine.
//!
//! Planning errors are synchronous and surface before any execution begins.
//! Per-item execution failures are not errors; they are recorded as outcomes
//! in the execution report so callers see the full picture in one pass.

use thiserror::Error;

use crate::element::{ElementId, ElementKind};

/// The main error type for the configuration planning engine.
#[derive(Debug, Error)]
pub enum ConfplanError {
    /// Diff computation errors.
    #[error("Diff error: {0}")]
    Diff(#[from] DiffError),

    /// Planning errors.
    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Diff computation errors.
#[derive(Debug, Error)]
pub enum DiffError {
    /// The two snapshots carry elements of different kinds under one identity.
    #[error("Incomparable elements at {id}: before is a {before_kind}, after is a {after_kind}")]
    IncomparableElements {
        /// Identity both elements claim.
        id: ElementId,
        /// Kind of the element in the before snapshot.
        before_kind: ElementKind,
        /// Kind of the element in the after snapshot.
        after_kind: ElementKind,
    },
}

/// Planning errors.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A dependency cycle spans elements that cannot be deployed together.
    #[error("Unresolvable dependency cycle between: {}", join_ids(ids))]
    UnresolvableCycle {
        /// Identities of the elements participating in the cycle.
        ids: Vec<ElementId>,
    },

    /// A finalized plan failed its acyclicity check.
    #[error("Dependency cycle detected in plan through: {}", join_ids(ids))]
    CycleDetected {
        /// Identities of the elements on the detected cycle.
        ids: Vec<ElementId>,
    },
}

/// Result type alias for planning operations.
pub type Result<T> = std::result::Result<T, ConfplanError>;

impl ConfplanError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

fn join_ids(ids: &[ElementId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolvable_cycle_names_members() {
        let error = PlanError::UnresolvableCycle {
            ids: vec![
                ElementId::instance("crm", "Lead", "default"),
                ElementId::instance("crm", "Ticket", "default"),
            ],
        };

        let message = error.to_string();
        assert!(message.contains("crm.Lead.instance.default"));
        assert!(message.contains("crm.Ticket.instance.default"));
    }

    #[test]
    fn test_errors_nest_into_crate_error() {
        let error: ConfplanError = DiffError::IncomparableElements {
            id: ElementId::field("crm", "Lead", "email"),
            before_kind: ElementKind::Field,
            after_kind: ElementKind::Instance,
        }
        .into();

        assert!(error.to_string().starts_with("Diff error:"));
    }
}
