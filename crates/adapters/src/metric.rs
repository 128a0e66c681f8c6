// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The metric collaborator: `jobStarted`/`jobFinished` counters.

use jobctl_core::{RunId, RunStatus};
use parking_lot::Mutex;
use std::sync::Arc;

/// Emits the controller's named counters.
pub trait Metric: Send + Sync + 'static {
    fn job_started(&self, id: &RunId);
    fn job_finished(&self, id: &RunId, status: RunStatus);
}

/// Logs every metric via `tracing` instead of talking to a real metrics
/// backend — the production-safe default when none is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMetric;

impl Metric for LoggingMetric {
    fn job_started(&self, id: &RunId) {
        tracing::info!(run = %id, "jobStarted");
    }

    fn job_finished(&self, id: &RunId, status: RunStatus) {
        tracing::info!(run = %id, %status, "jobFinished");
    }
}

#[derive(Default)]
struct FakeState {
    started: Vec<RunId>,
    finished: Vec<(RunId, RunStatus)>,
}

/// Records every metric call for assertions in tests.
#[derive(Clone, Default)]
pub struct FakeMetric {
    state: Arc<Mutex<FakeState>>,
}

impl FakeMetric {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started(&self) -> Vec<RunId> {
        self.state.lock().started.clone()
    }

    pub fn finished(&self) -> Vec<(RunId, RunStatus)> {
        self.state.lock().finished.clone()
    }
}

impl Metric for FakeMetric {
    fn job_started(&self, id: &RunId) {
        self.state.lock().started.push(id.clone());
    }

    fn job_finished(&self, id: &RunId, status: RunStatus) {
        self.state.lock().finished.push((id.clone(), status));
    }
}

#[cfg(test)]
#[path = "metric_tests.rs"]
mod tests;
