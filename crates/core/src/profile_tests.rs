// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::run::StepStatus;

fn linear_profile() -> JobProfile {
    JobProfile::new(vec![
        StepDef::new("deploy"),
        StepDef::new("installTests").requires("deploy"),
        StepDef::new("tests")
            .requires("installTests")
            .fails_as(RunStatus::TestFailure),
        StepDef::new("report").run_always(),
    ])
    .unwrap()
}

#[test]
fn rejects_duplicate_step() {
    let err = JobProfile::new(vec![StepDef::new("deploy"), StepDef::new("deploy")]).unwrap_err();
    assert_eq!(err, ProfileError::DuplicateStep("deploy".to_string()));
}

#[test]
fn rejects_unknown_prerequisite() {
    let err = JobProfile::new(vec![StepDef::new("tests").requires("deploy")]).unwrap_err();
    assert_eq!(
        err,
        ProfileError::UnknownPrerequisite("tests".to_string(), "deploy".to_string())
    );
}

#[test]
fn rejects_cycle() {
    let err = JobProfile::new(vec![
        StepDef::new("a").requires("b"),
        StepDef::new("b").requires("a"),
    ])
    .unwrap_err();
    assert!(matches!(err, ProfileError::Cycle(_)));
}

#[test]
fn initial_statuses_are_all_unfinished_in_order() {
    let profile = linear_profile();
    let statuses = profile.initial_step_statuses();
    let names: Vec<&str> = statuses.keys().map(|n| n.as_str()).collect();
    assert_eq!(names, vec!["deploy", "installTests", "tests", "report"]);
    assert!(statuses.values().all(|s| s.status == StepStatus::Unfinished));
}

#[test]
fn all_prerequisites_is_transitive() {
    let profile = linear_profile();
    let all = profile.all_prerequisites(&StepName::new("tests"));
    assert!(all.contains(&StepName::new("deploy")));
    assert!(all.contains(&StepName::new("installTests")));
    assert_eq!(all.len(), 2);
}

#[test]
fn prerequisites_satisfied_requires_all_predecessors_succeeded() {
    let profile = linear_profile();
    let mut steps = profile.initial_step_statuses();
    assert!(!profile.prerequisites_satisfied(&StepName::new("installTests"), &steps));
    steps.get_mut(&StepName::new("deploy")).unwrap().status = StepStatus::Succeeded;
    assert!(profile.prerequisites_satisfied(&StepName::new("installTests"), &steps));
}
