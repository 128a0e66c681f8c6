// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The config-server collaborator: log tailing for a live deployment,
//! and tearing one down.

use crate::deployment::{DeploymentId, VespaLogLine};
use jobctl_core::ErrorKind;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigServerError {
    #[error("config-server call for {deployment} failed: {message}")]
    Failed {
        deployment: DeploymentId,
        message: String,
    },
}

impl From<ConfigServerError> for ErrorKind {
    fn from(err: ConfigServerError) -> Self {
        ErrorKind::External(err.to_string())
    }
}

/// Thin interface to the config-server. Calls carry their own deadlines
/// and failures are treated as transient: callers that poll this
/// (`updateVespaLog`) swallow errors and retry next sweep.
pub trait ConfigServer: Send + Sync + 'static {
    /// Log lines emitted after `from`, in timestamp order.
    fn get_logs(
        &self,
        deployment: &DeploymentId,
        from: u64,
    ) -> Result<Vec<VespaLogLine>, ConfigServerError>;

    /// Tear down a deployment. Best-effort from the caller's perspective:
    /// `collectGarbage` tolerates failures here.
    fn deactivate(&self, deployment: &DeploymentId) -> Result<(), ConfigServerError>;
}

/// Discards every deactivate call and reports no new log lines; the
/// production-safe default when no real config-server is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopConfigServer;

impl ConfigServer for NoopConfigServer {
    fn get_logs(
        &self,
        _deployment: &DeploymentId,
        _from: u64,
    ) -> Result<Vec<VespaLogLine>, ConfigServerError> {
        Ok(Vec::new())
    }

    fn deactivate(&self, _deployment: &DeploymentId) -> Result<(), ConfigServerError> {
        Ok(())
    }
}

#[derive(Default)]
struct FakeState {
    logs: std::collections::HashMap<DeploymentId, Vec<VespaLogLine>>,
    deactivated: Vec<DeploymentId>,
    fail_deactivate: std::collections::HashSet<DeploymentId>,
}

/// Test double that serves log lines programmed via [`FakeConfigServer::push_logs`]
/// and records `deactivate` calls.
#[derive(Clone, Default)]
pub struct FakeConfigServer {
    state: Arc<Mutex<FakeState>>,
}

impl FakeConfigServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_logs(&self, deployment: &DeploymentId, lines: Vec<VespaLogLine>) {
        self.state
            .lock()
            .logs
            .entry(deployment.clone())
            .or_default()
            .extend(lines);
    }

    pub fn fail_deactivate_for(&self, deployment: &DeploymentId) {
        self.state.lock().fail_deactivate.insert(deployment.clone());
    }

    pub fn deactivated(&self) -> Vec<DeploymentId> {
        self.state.lock().deactivated.clone()
    }
}

impl ConfigServer for FakeConfigServer {
    fn get_logs(
        &self,
        deployment: &DeploymentId,
        from: u64,
    ) -> Result<Vec<VespaLogLine>, ConfigServerError> {
        let state = self.state.lock();
        Ok(state
            .logs
            .get(deployment)
            .map(|lines| {
                lines
                    .iter()
                    .filter(|l| l.timestamp >= from)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn deactivate(&self, deployment: &DeploymentId) -> Result<(), ConfigServerError> {
        let mut state = self.state.lock();
        if state.fail_deactivate.contains(deployment) {
            return Err(ConfigServerError::Failed {
                deployment: deployment.clone(),
                message: "simulated failure".to_string(),
            });
        }
        state.deactivated.push(deployment.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_server_tests.rs"]
mod tests;
