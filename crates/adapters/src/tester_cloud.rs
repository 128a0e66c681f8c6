// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The tester-cloud collaborator: the test log tail and test report for
//! a tester deployment.

use crate::deployment::{DeploymentId, TesterLogLine};
use jobctl_core::{ErrorKind, TestReport};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TesterCloudError {
    #[error("tester-cloud call for {deployment} failed: {message}")]
    Failed {
        deployment: DeploymentId,
        message: String,
    },
}

impl From<TesterCloudError> for ErrorKind {
    fn from(err: TesterCloudError) -> Self {
        ErrorKind::External(err.to_string())
    }
}

/// Thin interface to the tester-cloud. As with [`crate::ConfigServer`],
/// callers treat failures as transient and retry on the next sweep.
pub trait TesterCloud: Send + Sync + 'static {
    /// Log lines with `id > after_entry_id`.
    fn get_log(
        &self,
        deployment: &DeploymentId,
        after_entry_id: i64,
    ) -> Result<Vec<TesterLogLine>, TesterCloudError>;

    /// The test report, once the tester has produced one.
    fn get_test_report(
        &self,
        deployment: &DeploymentId,
    ) -> Result<Option<TestReport>, TesterCloudError>;
}

/// No test activity ever observed; the production-safe default when no
/// real tester-cloud is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTesterCloud;

impl TesterCloud for NoopTesterCloud {
    fn get_log(
        &self,
        _deployment: &DeploymentId,
        _after_entry_id: i64,
    ) -> Result<Vec<TesterLogLine>, TesterCloudError> {
        Ok(Vec::new())
    }

    fn get_test_report(
        &self,
        _deployment: &DeploymentId,
    ) -> Result<Option<TestReport>, TesterCloudError> {
        Ok(None)
    }
}

#[derive(Default)]
struct FakeState {
    logs: std::collections::HashMap<DeploymentId, Vec<TesterLogLine>>,
    reports: std::collections::HashMap<DeploymentId, TestReport>,
}

/// Test double programmed via [`FakeTesterCloud::push_log`] /
/// [`FakeTesterCloud::set_report`].
#[derive(Clone, Default)]
pub struct FakeTesterCloud {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTesterCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_log(&self, deployment: &DeploymentId, lines: Vec<TesterLogLine>) {
        self.state
            .lock()
            .logs
            .entry(deployment.clone())
            .or_default()
            .extend(lines);
    }

    pub fn set_report(&self, deployment: &DeploymentId, report: TestReport) {
        self.state.lock().reports.insert(deployment.clone(), report);
    }
}

impl TesterCloud for FakeTesterCloud {
    fn get_log(
        &self,
        deployment: &DeploymentId,
        after_entry_id: i64,
    ) -> Result<Vec<TesterLogLine>, TesterCloudError> {
        let state = self.state.lock();
        Ok(state
            .logs
            .get(deployment)
            .map(|lines| {
                lines
                    .iter()
                    .filter(|l| l.id > after_entry_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_test_report(
        &self,
        deployment: &DeploymentId,
    ) -> Result<Option<TestReport>, TesterCloudError> {
        Ok(self.state.lock().reports.get(deployment).cloned())
    }
}

#[cfg(test)]
#[path = "tester_cloud_tests.rs"]
mod tests;
