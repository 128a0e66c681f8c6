// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test report and log entry data.
//!
//! Both are opaque payloads as far as the controller is concerned: it
//! stores and retrieves them but never interprets their contents beyond
//! the fields listed here.

use serde::{Deserialize, Serialize};

/// One line of a run's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Strictly increasing within a run.
    pub id: u64,
    pub timestamp: u64,
    pub step: crate::run::StepName,
    pub level: LogLevel,
    pub message: String,
}

/// Severity of a [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// A not-yet-assigned log line, as submitted to `LogStore::append`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLogEntry {
    pub step: crate::run::StepName,
    pub timestamp: u64,
    pub level: LogLevel,
    pub message: String,
}

impl NewLogEntry {
    pub fn new(
        step: crate::run::StepName,
        timestamp: u64,
        level: LogLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            step,
            timestamp,
            level,
            message: message.into(),
        }
    }
}

/// An opaque test report blob, produced by the tester-cloud collaborator
/// and persisted verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport(pub serde_json::Value);

impl TestReport {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
