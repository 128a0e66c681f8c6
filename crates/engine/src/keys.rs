// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logical key layout for runs: `/runs/<app>/<type>/last`,
//! `/runs/<app>/<type>/history`. Applications and job types with data are
//! discovered from the key hierarchy itself via [`jobctl_store::Store::list`]
//! rather than a separate index, matching that `list` already returns
//! immediate children for both storage backends.

use jobctl_core::{ApplicationId, JobType};

pub(crate) const RUNS_PREFIX: &str = "runs";

pub(crate) fn app_prefix(app: &ApplicationId) -> String {
    format!("{RUNS_PREFIX}/{app}")
}

pub(crate) fn last_key(app: &ApplicationId, job_type: &JobType) -> String {
    format!("runs/{app}/{job_type}/last")
}

pub(crate) fn history_key(app: &ApplicationId, job_type: &JobType) -> String {
    format!("runs/{app}/{job_type}/history")
}
