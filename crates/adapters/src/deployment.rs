// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifies a live deployment a collaborator acts on.

use jobctl_core::{ApplicationId, JobType};
use std::fmt;

/// One deployed instance of an (application, job type) pair — the real
/// deployment a run installs to, or the tester deployment that exercises
/// it, depending on which collaborator is asked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeploymentId {
    pub application: ApplicationId,
    pub job_type: JobType,
}

impl DeploymentId {
    pub fn new(application: ApplicationId, job_type: JobType) -> Self {
        Self {
            application,
            job_type,
        }
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.application, self.job_type)
    }
}

/// One line pulled from the config-server's log tail via
/// `ConfigServer::get_logs`, cursored by timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VespaLogLine {
    pub timestamp: u64,
    pub message: String,
}

/// One line pulled from the tester-cloud's log tail via
/// `TesterCloud::get_log`, cursored by entry id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TesterLogLine {
    pub id: i64,
    pub message: String,
}
