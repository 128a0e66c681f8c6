// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised by a [`crate::Store`] implementation.

use jobctl_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error at '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not (de)serialize value at '{key}': {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn key(&self) -> &str {
        match self {
            StoreError::Io { key, .. } | StoreError::Serde { key, .. } => key,
        }
    }
}

impl From<StoreError> for ErrorKind {
    fn from(err: StoreError) -> Self {
        ErrorKind::Storage(err.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
