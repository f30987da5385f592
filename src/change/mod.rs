//! Change model, diff engine, and validation.
//!
//! The diff engine turns a before and an after snapshot into a flat
//! [`ChangeSet`]; validators inspect the set before it is planned.

mod diff;
mod model;
mod validator;

pub use diff::DiffEngine;
pub use model::{Change, ChangeAction, ChangeData, ChangeSet};
pub use validator::{run_validators, ChangeValidator, Finding, Severity};
