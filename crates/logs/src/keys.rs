// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logical key layout for logs and test reports:
//! `/logs/<runId>/active`, `/logs/<runId>/finished`, `/reports/<runId>`.

use jobctl_core::{ApplicationId, JobType, RunId};

pub(crate) fn logs_app_prefix(app: &ApplicationId) -> String {
    format!("logs/{app}")
}

pub(crate) fn logs_type_prefix(app: &ApplicationId, job_type: &JobType) -> String {
    format!("logs/{app}/{job_type}")
}

pub(crate) fn logs_run_prefix(id: &RunId) -> String {
    format!("logs/{}/{}/{}", id.application, id.job_type, id.number)
}

pub(crate) fn active_key(id: &RunId) -> String {
    format!("{}/active", logs_run_prefix(id))
}

pub(crate) fn finished_key(id: &RunId) -> String {
    format!("{}/finished", logs_run_prefix(id))
}

pub(crate) fn reports_app_prefix(app: &ApplicationId) -> String {
    format!("reports/{app}")
}

pub(crate) fn reports_type_prefix(app: &ApplicationId, job_type: &JobType) -> String {
    format!("reports/{app}/{job_type}")
}

pub(crate) fn report_key(id: &RunId) -> String {
    format!("reports/{}/{}/{}", id.application, id.job_type, id.number)
}
