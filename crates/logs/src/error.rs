// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use jobctl_core::ErrorKind;
use jobctl_store::StoreError;
use thiserror::Error;

/// Errors raised by [`crate::LogStore`].
///
/// Every variant maps onto [`ErrorKind::Storage`] at the controller
/// boundary: a rejected store call raises an `ErrorKind::Storage` error,
/// which callers treat as retryable.
#[derive(Debug, Error)]
pub enum LogError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("could not (de)compress sealed log for run {run}: {source}")]
    Compression {
        run: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<LogError> for ErrorKind {
    fn from(err: LogError) -> Self {
        ErrorKind::Storage(err.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
