// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use jobctl_adapters::deployment::{DeploymentId, TesterLogLine, VespaLogLine};
use jobctl_adapters::{
    FakeArtifactStore, FakeConfigServer, FakeMetric, FakeTesterCloud, FakeVersionCompatibility,
    FakeVersionStatus,
};
use jobctl_core::test_support::{test_profile, test_versions};
use jobctl_core::{FakeClock, PlatformVersion, TestReport};
use jobctl_store::MemStore;
use std::sync::atomic::{AtomicUsize, Ordering};

fn harness() -> (
    JobController<FakeClock>,
    FakeConfigServer,
    FakeTesterCloud,
    FakeMetric,
) {
    let store: Arc<dyn Store> = Arc::new(MemStore::new());
    let locks = LockService::new();
    let logs = LogStore::new(store.clone());
    let config_server = FakeConfigServer::new();
    let tester_cloud = FakeTesterCloud::new();
    let metric = FakeMetric::new();
    let deps = ControllerDeps {
        config_server: Arc::new(config_server.clone()),
        tester_cloud: Arc::new(tester_cloud.clone()),
        artifact_store: Arc::new(FakeArtifactStore::new()),
        version_status: Arc::new(
            FakeVersionStatus::new().with_version(PlatformVersion::new("8.400.10"), true),
        ),
        version_compatibility: Arc::new(FakeVersionCompatibility::new()),
        metric: Arc::new(metric.clone()),
    };
    let controller = JobController::new(
        store,
        locks,
        logs,
        deps,
        FakeClock::new(0),
        ControllerConfig::default(),
        HashSet::new(),
    );
    (controller, config_server, tester_cloud, metric)
}

fn succeed_all_steps(controller: &JobController<FakeClock>, run_id: &RunId) {
    let run = controller.run(run_id).unwrap().unwrap();
    for (name, _) in run.profile.steps.clone() {
        let lock = controller
            .locks
            .lock_step(&run_id.application, &run_id.job_type, &name);
        controller
            .update_step(run_id, StepStatus::Succeeded, &lock)
            .unwrap();
    }
}

// ---- simple success ----------------------------------------------------

#[test]
fn start_then_succeed_all_steps_then_finish_moves_run_to_history() {
    let (controller, _, _, metric) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");

    let run = controller
        .start(
            &app,
            &job_type,
            test_versions(),
            false,
            test_profile(),
            None,
        )
        .unwrap();
    assert_eq!(run.id.number, 1);
    assert_eq!(metric.started(), vec![run.id.clone()]);

    succeed_all_steps(&controller, &run.id);
    controller.finish(&run.id).unwrap();

    let finished = controller.run(&run.id).unwrap().unwrap();
    assert_eq!(finished.status, RunStatus::Success);
    assert!(finished.end.is_some());

    let history = controller.runs(&app, &job_type).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id.number, 1);
    assert!(controller.last(&app, &job_type).unwrap().is_none());
    assert_eq!(
        metric.finished(),
        vec![(run.id.clone(), RunStatus::Success)]
    );
}

// ---- conflict on double start ------------------------------------------

#[test]
fn start_while_a_run_is_active_is_a_conflict() {
    let (controller, ..) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");

    controller
        .start(
            &app,
            &job_type,
            test_versions(),
            false,
            test_profile(),
            None,
        )
        .unwrap();

    let err = controller
        .start(
            &app,
            &job_type,
            test_versions(),
            false,
            test_profile(),
            None,
        )
        .unwrap_err();
    assert!(matches!(err, ErrorKind::Conflict(_)));
}

// ---- abort-and-wait replacement ----------------------------------------

#[test]
fn deploy_aborts_the_active_run_and_starts_a_replacement() {
    let (controller, ..) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");

    let first = controller
        .start(
            &app,
            &job_type,
            test_versions(),
            false,
            test_profile(),
            None,
        )
        .unwrap();

    controller
        .deploy(&app, &job_type, None, b"package-v2", false)
        .unwrap();

    let replaced = controller.run(&first.id).unwrap().unwrap();
    assert_eq!(replaced.status, RunStatus::Aborted);
    assert!(replaced.end.is_some());

    let current = controller.last(&app, &job_type).unwrap().unwrap();
    assert_eq!(current.id.number, first.id.number + 1);
    assert!(current.is_active());
}

// ---- start: version-compatibility gate ---------------------------------

#[test]
fn start_rejects_incompatible_platform_and_compile_version() {
    let (controller, ..) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");

    let mut versions = test_versions();
    versions.source_platform = Some(PlatformVersion::new("8.399.1"));

    let err = controller
        .start(&app, &job_type, versions, false, test_profile(), None)
        .unwrap_err();
    assert!(matches!(err, ErrorKind::Invalid(_)));
}

// ---- finish: reset collapses back to initial step state ----------------

#[test]
fn finish_on_reset_status_restarts_the_run_in_place() {
    let (controller, ..) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");

    let run = controller
        .start(
            &app,
            &job_type,
            test_versions(),
            false,
            test_profile(),
            None,
        )
        .unwrap();

    let lock = controller
        .locks
        .lock_step(&app, &job_type, &StepName::new("deploy"));
    controller
        .update_step(&run.id, StepStatus::Succeeded, &lock)
        .unwrap();
    drop(lock);

    {
        let last_key = keys::last_key(&app, &job_type);
        let mut stored: Run = controller.store.get_json(&last_key).unwrap().unwrap();
        stored.status = RunStatus::Reset;
        controller.store.put_json(&last_key, &stored).unwrap();
    }

    controller.finish(&run.id).unwrap();

    let after = controller.run(&run.id).unwrap().unwrap();
    assert_eq!(after.status, RunStatus::Running);
    assert!(after.end.is_none());
    assert_eq!(after.id, run.id);
    assert!(after
        .steps
        .values()
        .all(|info| info.status == StepStatus::Unfinished));
    assert!(controller.runs(&app, &job_type).unwrap().is_empty());
}

// ---- finish: not yet finishable while a step is unfinished --------------

#[test]
fn finish_is_a_no_op_while_a_step_remains_unfinished() {
    let (controller, ..) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");
    let run = controller
        .start(
            &app,
            &job_type,
            test_versions(),
            false,
            test_profile(),
            None,
        )
        .unwrap();

    controller.finish(&run.id).unwrap();

    let still_active = controller.run(&run.id).unwrap().unwrap();
    assert_eq!(still_active.status, RunStatus::Running);
    assert!(still_active.end.is_none());
}

// ---- finish: idempotent on an already-historic run ----------------------

#[test]
fn finish_twice_on_a_terminal_run_is_a_no_op_after_the_first() {
    let (controller, ..) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");
    let run = controller
        .start(
            &app,
            &job_type,
            test_versions(),
            false,
            test_profile(),
            None,
        )
        .unwrap();
    succeed_all_steps(&controller, &run.id);
    controller.finish(&run.id).unwrap();
    let once = controller.run(&run.id).unwrap().unwrap();

    controller.finish(&run.id).unwrap();
    let twice = controller.run(&run.id).unwrap().unwrap();
    assert_eq!(once.status, twice.status);
    assert_eq!(once.end, twice.end);
    assert_eq!(controller.runs(&app, &job_type).unwrap().len(), 1);
}

// ---- abort: force-fails unfinished steps, leaves run-always eligible ----

#[test]
fn abort_marks_run_aborted_and_logs_every_unfinished_step() {
    let (controller, ..) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");
    let run = controller
        .start(
            &app,
            &job_type,
            test_versions(),
            false,
            test_profile(),
            None,
        )
        .unwrap();

    controller.abort(&run.id, "replaced".to_string()).unwrap();

    let aborted = controller.run(&run.id).unwrap().unwrap();
    assert_eq!(aborted.status, RunStatus::Aborted);
    assert!(!aborted.is_active());
}

// ---- update_step / set_start_timestamp rejection of a foreign lock ------

#[test]
fn update_step_rejects_a_locked_step_from_a_different_job_type() {
    let (controller, ..) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");
    let run = controller
        .start(
            &app,
            &job_type,
            test_versions(),
            false,
            test_profile(),
            None,
        )
        .unwrap();

    let foreign_type = JobType::new("zone-eu");
    let foreign_lock = controller
        .locks
        .lock_step(&app, &foreign_type, &StepName::new("deploy"));

    let err = controller
        .update_step(&run.id, StepStatus::Succeeded, &foreign_lock)
        .unwrap_err();
    assert!(matches!(err, ErrorKind::Invalid(_)));
}

#[test]
fn set_start_timestamp_records_a_step_start_time() {
    let (controller, ..) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");
    let run = controller
        .start(
            &app,
            &job_type,
            test_versions(),
            false,
            test_profile(),
            None,
        )
        .unwrap();

    let lock = controller
        .locks
        .lock_step(&app, &job_type, &StepName::new("deploy"));
    controller
        .set_start_timestamp(&run.id, 42, &lock)
        .unwrap();

    let updated = controller.run(&run.id).unwrap().unwrap();
    assert_eq!(
        updated.steps.get(&StepName::new("deploy")).unwrap().start,
        Some(42)
    );
}

// ---- log continuation with no duplicates --------------------------------

#[test]
fn update_vespa_log_does_not_duplicate_the_boundary_line() {
    let (controller, config_server, _, _) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");
    let run = controller
        .start(
            &app,
            &job_type,
            test_versions(),
            false,
            test_profile(),
            None,
        )
        .unwrap();
    let deployment = DeploymentId::new(app.clone(), job_type.clone());

    config_server.push_logs(
        &deployment,
        vec![
            VespaLogLine {
                timestamp: 0,
                message: "t0".to_string(),
            },
            VespaLogLine {
                timestamp: 1,
                message: "t1".to_string(),
            },
        ],
    );
    controller.update_vespa_log(&run.id).unwrap();

    config_server.push_logs(
        &deployment,
        vec![
            VespaLogLine {
                timestamp: 1,
                message: "t1".to_string(),
            },
            VespaLogLine {
                timestamp: 2,
                message: "t2".to_string(),
            },
        ],
    );
    controller.update_vespa_log(&run.id).unwrap();

    let active = controller.logs.read_active(&run.id, 0).unwrap();
    let timestamps: Vec<u64> = active.entries.iter().map(|e| e.timestamp).collect();
    assert_eq!(timestamps, vec![0, 1, 2]);

    let after = controller.run(&run.id).unwrap().unwrap();
    assert_eq!(after.last_vespa_log_timestamp, 2);
}

#[test]
fn update_test_log_advances_cursor_and_appends_entries() {
    let (controller, _, tester_cloud, _) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");
    let run = controller
        .start(
            &app,
            &job_type,
            test_versions(),
            false,
            test_profile(),
            None,
        )
        .unwrap();
    // advance deploy/installTests so "tests" is the live step.
    for step in ["deploy", "installTests"] {
        let lock = controller
            .locks
            .lock_step(&app, &job_type, &StepName::new(step));
        controller
            .update_step(&run.id, StepStatus::Succeeded, &lock)
            .unwrap();
    }
    let deployment = DeploymentId::new(app.clone(), job_type.clone());
    tester_cloud.push_log(
        &deployment,
        vec![TesterLogLine {
            id: 1,
            message: "running".to_string(),
        }],
    );

    controller.update_test_log(&run.id).unwrap();

    let after = controller.run(&run.id).unwrap().unwrap();
    assert_eq!(after.last_test_log_entry, 1);
}

#[test]
fn update_test_report_persists_once_available() {
    let (controller, _, tester_cloud, _) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");
    let run = controller
        .start(
            &app,
            &job_type,
            test_versions(),
            false,
            test_profile(),
            None,
        )
        .unwrap();
    let deployment = DeploymentId::new(app.clone(), job_type.clone());
    tester_cloud.set_report(&deployment, TestReport::new(serde_json::json!({"passed": 3})));

    controller.update_test_report(&run.id).unwrap();

    let report = controller.logs.read_test_report(&run.id).unwrap().unwrap();
    assert_eq!(report.0["passed"], 3);
}

// ---- deploy: resolves a deployable major, redeployment detection --------

#[test]
fn deploy_resolves_requested_major_and_detects_redeployment() {
    let (controller, ..) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");

    let first = controller
        .deploy(&app, &job_type, Some(PlatformVersion::new("8")), b"pkg", false)
        .unwrap();
    assert_eq!(first.versions.target_platform, PlatformVersion::new("8.400.10"));
    assert!(!first.is_redeployment);
    succeed_all_steps(&controller, &first.id);
    controller.finish(&first.id).unwrap();

    let second = controller
        .deploy(&app, &job_type, None, b"pkg", false)
        .unwrap();
    assert_eq!(second.versions.target_application.build, 2);
}

#[test]
fn deploy_dry_run_skips_install_and_test_steps() {
    let (controller, ..) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");

    let run = controller
        .deploy(&app, &job_type, None, b"pkg", true)
        .unwrap();
    assert_eq!(run.profile.steps.len(), 1);
    assert!(run.profile.steps.contains_key(&StepName::new("deploy")));
}

// ---- submit: monotonic build numbers ------------------------------------

#[test]
fn submit_assigns_monotonically_increasing_build_numbers() {
    let (controller, ..) = harness();
    let app = ApplicationId::new("app1");

    let first = controller.submit(&app, b"v1", None, None).unwrap();
    let second = controller.submit(&app, b"v2", None, None).unwrap();
    assert_eq!(first, 1);
    assert_eq!(second, 2);
}

#[test]
fn submit_persists_the_diff_and_the_paired_test_package() {
    let store: Arc<dyn Store> = Arc::new(MemStore::new());
    let locks = LockService::new();
    let logs = LogStore::new(store.clone());
    let artifact_store = Arc::new(FakeArtifactStore::new());
    let deps = ControllerDeps {
        config_server: Arc::new(FakeConfigServer::new()),
        tester_cloud: Arc::new(FakeTesterCloud::new()),
        artifact_store: artifact_store.clone(),
        version_status: Arc::new(FakeVersionStatus::new()),
        version_compatibility: Arc::new(FakeVersionCompatibility::new()),
        metric: Arc::new(FakeMetric::new()),
    };
    let controller = JobController::new(
        store,
        locks,
        logs,
        deps,
        FakeClock::new(0),
        ControllerConfig::default(),
        HashSet::new(),
    );
    let app = ApplicationId::new("app1");

    controller.submit(&app, b"v1", Some(b"tests-v1"), None).unwrap();
    let second = controller
        .submit(&app, b"v1v2", Some(b"tests-v2"), None)
        .unwrap();

    assert_eq!(
        artifact_store.stored_diff(&app, second),
        Some(b"v2".to_vec())
    );
    assert_eq!(
        artifact_store.tester_builds(&app),
        vec![1, second]
    );
}

// ---- garbage collection tolerates a partial failure ---------------------

#[test]
fn collect_garbage_leaves_data_in_place_when_deactivation_fails() {
    let (controller, config_server, ..) = harness();
    let app = ApplicationId::new("stale-app");
    let t1 = JobType::new("zone-us");
    let t2 = JobType::new("zone-eu");

    for job_type in [&t1, &t2] {
        let run = controller
            .start(
                &app,
                job_type,
                test_versions(),
                false,
                test_profile(),
                None,
            )
            .unwrap();
        succeed_all_steps(&controller, &run.id);
        controller.finish(&run.id).unwrap();
    }

    let deployment_t2 = DeploymentId::new(app.clone(), t2.clone());
    config_server.fail_deactivate_for(&deployment_t2);

    // Application is absent from the live set entirely.
    controller.collect_garbage(&HashSet::new()).unwrap();

    assert!(controller.runs(&app, &t1).unwrap().is_empty());
    // t2's deactivate failed, so its data (and the app root key) survive
    // for the next sweep to retry.
    assert!(!controller.runs(&app, &t2).unwrap().is_empty());

    let deactivated = config_server.deactivated();
    assert_eq!(deactivated, vec![DeploymentId::new(app.clone(), t1.clone())]);
}

#[test]
fn collect_garbage_is_a_no_op_for_live_applications() {
    let (controller, ..) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");
    let run = controller
        .start(
            &app,
            &job_type,
            test_versions(),
            false,
            test_profile(),
            None,
        )
        .unwrap();
    succeed_all_steps(&controller, &run.id);
    controller.finish(&run.id).unwrap();

    let mut live = HashSet::new();
    live.insert(app.clone());
    controller.collect_garbage(&live).unwrap();

    assert!(!controller.runs(&app, &job_type).unwrap().is_empty());
}

// ---- queries -------------------------------------------------------------

#[test]
fn queries_track_last_success_and_first_failing() {
    let (controller, ..) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");

    // run 1: success
    let r1 = controller
        .start(
            &app,
            &job_type,
            test_versions(),
            false,
            test_profile(),
            None,
        )
        .unwrap();
    succeed_all_steps(&controller, &r1.id);
    controller.finish(&r1.id).unwrap();

    // run 2: fails at "deploy"
    let r2 = controller
        .start(
            &app,
            &job_type,
            test_versions(),
            false,
            test_profile(),
            None,
        )
        .unwrap();
    let lock = controller
        .locks
        .lock_step(&app, &job_type, &StepName::new("deploy"));
    controller
        .update_step(&r2.id, StepStatus::Failed, &lock)
        .unwrap();
    drop(lock);
    controller.finish(&r2.id).unwrap();

    assert_eq!(
        controller.last_success(&app, &job_type).unwrap().unwrap().id,
        r1.id
    );
    assert_eq!(
        controller.first_failing(&app, &job_type).unwrap().unwrap().id,
        r2.id
    );
    assert_eq!(
        controller.deployment_status(&app, &job_type).unwrap(),
        Some(RunStatus::DeploymentFailed)
    );
}

#[test]
fn active_and_active_for_application_only_report_in_flight_runs() {
    let (controller, ..) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");
    let run = controller
        .start(
            &app,
            &job_type,
            test_versions(),
            false,
            test_profile(),
            None,
        )
        .unwrap();

    assert_eq!(controller.active().unwrap().len(), 1);
    assert_eq!(controller.active_for_application(&app).unwrap().len(), 1);

    succeed_all_steps(&controller, &run.id);
    controller.finish(&run.id).unwrap();

    assert!(controller.active().unwrap().is_empty());
}

// ---- the runStep callback is single-assignment --------------------------

#[test]
fn run_step_callback_can_only_be_set_once() {
    let (controller, ..) = harness();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    controller
        .set_run_step(Arc::new(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();

    let err = controller.set_run_step(Arc::new(|_| {})).unwrap_err();
    assert!(matches!(err, ErrorKind::Invalid(_)));

    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");
    controller
        .start(
            &app,
            &job_type,
            test_versions(),
            false,
            test_profile(),
            None,
        )
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn run_ids_are_monotone_across_repeated_starts() {
    let (controller, ..) = harness();
    let app = ApplicationId::new("app1");
    let job_type = JobType::new("zone-us");

    let mut numbers = Vec::new();
    for _ in 0..3 {
        let run = controller
            .start(
                &app,
                &job_type,
                test_versions(),
                false,
                test_profile(),
                None,
            )
            .unwrap();
        numbers.push(run.id.number);
        succeed_all_steps(&controller, &run.id);
        controller.finish(&run.id).unwrap();
    }
    assert_eq!(numbers, vec![1, 2, 3]);
}
