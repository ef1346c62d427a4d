//! Status lifecycle shared by every request-like record.
//!
//! Records start in a pending state and are moved once by an admin into a
//! terminal state. Re-issuing the current status is accepted and changes
//! nothing; leaving a terminal status is a conflict.

use crate::error::{DomainError, DomainResult};

/// A request status enum (withdrawal, loan, bonus, ...).
pub trait RequestStatus: Copy + Eq + core::fmt::Debug + core::fmt::Display {
    fn is_terminal(self) -> bool;
}

/// Outcome of validating a requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange<S> {
    /// Requested status equals the current one.
    Unchanged(S),
    /// Status moves `from` -> `to`.
    Changed { from: S, to: S },
}

impl<S: RequestStatus> StatusChange<S> {
    pub fn target(&self) -> S {
        match *self {
            StatusChange::Unchanged(s) => s,
            StatusChange::Changed { to, .. } => to,
        }
    }

    /// True when this change moves into `status` from somewhere else.
    pub fn enters(&self, status: S) -> bool {
        matches!(*self, StatusChange::Changed { to, .. } if to == status)
    }
}

pub fn check_transition<S: RequestStatus>(from: S, to: S) -> DomainResult<StatusChange<S>> {
    if from == to {
        return Ok(StatusChange::Unchanged(from));
    }
    if from.is_terminal() {
        return Err(DomainError::conflict(format!(
            "cannot change status from '{from}' to '{to}'"
        )));
    }
    Ok(StatusChange::Changed { from, to })
}
