// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::profile::{JobProfile, StepDef};
use crate::run::{
    ApplicationId, ApplicationVersion, JobType, PlatformVersion, Run, RunId, RunStatus, Versions,
};

/// A three-step `deploy -> installTests -> tests` profile, with `tests`
/// configured to map a failure onto [`RunStatus::TestFailure`].
pub fn test_profile() -> JobProfile {
    JobProfile::new(vec![
        StepDef::new("deploy"),
        StepDef::new("installTests").requires("deploy"),
        StepDef::new("tests")
            .requires("installTests")
            .fails_as(RunStatus::TestFailure),
    ])
    .expect("test_profile is acyclic by construction")
}

/// A single `report` step that always runs, even across an abort.
pub fn report_only_profile() -> JobProfile {
    JobProfile::new(vec![StepDef::new("report").run_always()])
        .expect("report_only_profile is acyclic by construction")
}

pub fn test_run_id(app: &str, job_type: &str, number: u64) -> RunId {
    RunId::new(ApplicationId::new(app), JobType::new(job_type), number)
}

pub fn test_versions() -> Versions {
    Versions::new(PlatformVersion::new("8.400.10"), ApplicationVersion::new(1))
}

/// A freshly-started run over [`test_profile`], for tests that only need a
/// run in its initial state.
pub fn test_run(app: &str, job_type: &str, number: u64) -> Run {
    Run::start(
        test_run_id(app, job_type, number),
        test_versions(),
        false,
        test_profile(),
        None,
        0,
    )
}
