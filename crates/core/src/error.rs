// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy for the job controller.
//!
//! Every downstream crate (`jobctl-store`, `jobctl-locks`, `jobctl-logs`,
//! `jobctl-engine`) defines its own `thiserror` error enum for its own
//! failure modes and converts into [`ErrorKind`] at its public boundary.

use thiserror::Error;

/// The error taxonomy the controller surfaces to callers.
///
/// Kinds map directly onto the caller-visible retry policy: `Conflict` and
/// `Timeout` are generally retryable by the caller, `Storage` and
/// `External` are transient, `Invalid` and `NotFound` are not.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Arguments fail a contract (e.g. incompatible platform/compile versions).
    #[error("invalid argument: {0}")]
    Invalid(String),

    /// The action would violate an invariant (e.g. single-active-run).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Lock contention or a bounded wait elapsed.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The referenced run or application does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The underlying store failed; treat as retryable.
    #[error("storage error: {0}")]
    Storage(String),

    /// A collaborator call failed.
    #[error("external error: {0}")]
    External(String),

    /// The calling thread was interrupted while waiting.
    #[error("interrupted: {0}")]
    Interrupted(String),
}

impl ErrorKind {
    /// Whether a caller can reasonably retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout(_) | ErrorKind::Storage(_) | ErrorKind::External(_)
        )
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
