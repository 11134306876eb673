//! Errors raised by domain rules

use thiserror::Error;

use crate::lifecycle::VisitStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The caller is authenticated but the policy denies the action
    #[error("{0}")]
    Forbidden(String),

    /// A status change that the visit state machine does not allow
    #[error("Cannot change visit status from {from} to {to}")]
    InvalidTransition { from: VisitStatus, to: VisitStatus },

    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),
}
