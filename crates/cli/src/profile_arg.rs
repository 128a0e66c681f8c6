// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parses the CLI's flat `--steps`/`--run-always`/`--fails-as` flags into a
//! [`JobProfile`]. The controller itself never guesses a profile shape —
//! it is supplied by whatever started the run — so this is the one place
//! in the workspace that turns free text into a step DAG, standing in for
//! the (out-of-scope) deployment trigger.

use jobctl_core::{JobProfile, ProfileError, RunStatus, StepDef};
use std::collections::HashSet;

/// Build a linear-chain profile from a comma-separated step list, e.g.
/// `"build,deploy,test,report"` becomes `build -> deploy -> test -> report`,
/// each requiring the one before it.
pub fn linear_profile(
    steps: &str,
    run_always: &[String],
    fails_as: &[String],
) -> anyhow::Result<JobProfile> {
    let run_always: HashSet<&str> = run_always.iter().map(String::as_str).collect();
    let fails_as = parse_fails_as(fails_as)?;

    let names: Vec<&str> = steps.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    if names.is_empty() {
        anyhow::bail!("--steps must name at least one step");
    }

    let mut defs = Vec::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        let mut def = StepDef::new(*name);
        if i > 0 {
            def = def.requires(names[i - 1]);
        }
        if run_always.contains(name) {
            def = def.run_always();
        }
        if let Some(status) = fails_as.get(*name) {
            def = def.fails_as(*status);
        }
        defs.push(def);
    }

    JobProfile::new(defs).map_err(|err: ProfileError| anyhow::anyhow!(err))
}

fn parse_fails_as(entries: &[String]) -> anyhow::Result<std::collections::HashMap<String, RunStatus>> {
    let mut map = std::collections::HashMap::new();
    for entry in entries {
        let (step, status) = entry
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("--fails-as entries must be `step=status`, got {entry:?}"))?;
        map.insert(step.to_string(), parse_run_status(status)?);
    }
    Ok(map)
}

/// Parses a `RunStatus` from its CLI spelling.
pub fn parse_run_status(s: &str) -> anyhow::Result<RunStatus> {
    Ok(match s {
        "running" => RunStatus::Running,
        "success" => RunStatus::Success,
        "aborted" => RunStatus::Aborted,
        "error" => RunStatus::Error,
        "outOfCapacity" | "out-of-capacity" => RunStatus::OutOfCapacity,
        "deploymentFailed" | "deployment-failed" => RunStatus::DeploymentFailed,
        "installationFailed" | "installation-failed" => RunStatus::InstallationFailed,
        "testFailure" | "test-failure" => RunStatus::TestFailure,
        "noTests" | "no-tests" => RunStatus::NoTests,
        "reset" => RunStatus::Reset,
        other => anyhow::bail!("unrecognized run status {other:?}"),
    })
}

#[cfg(test)]
#[path = "profile_arg_tests.rs"]
mod tests;
