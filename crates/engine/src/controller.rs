// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `JobController`: the public contract over a `Store`, a
//! `LockService`, a `LogStore`, and six collaborator adapters.
//!
//! Generic only over [`Clock`]; the six collaborators are held as
//! `Arc<dyn Trait>` trait objects rather than further type parameters.
//! Threading all six through the controller's own type parameters would
//! make every call site spell out a six-parameter type merely to hold a
//! value, so they are bundled into [`ControllerDeps`] and held behind
//! trait objects instead.

use jobctl_adapters::{
    ArtifactStore, ConfigServer, DeploymentId, Metric, TesterCloud, VersionCompatibility,
    VersionStatus,
};
use jobctl_core::run::{ApplicationVersion, HistoryMap, PlatformVersion};
use jobctl_core::{
    ApplicationId, Clock, ControllerConfig, ErrorKind, JobProfile, JobType, LogLevel, NewLogEntry,
    Run, RunId, RunStatus, StepDef, StepName, StepStatus, Versions,
};
use jobctl_locks::{LockService, StepLock};
use jobctl_logs::{DeleteTarget, LogStore};
use jobctl_store::{Store, StoreExt};
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use crate::{history, keys};

/// The callback invoked to drive a run forward after a state-changing call.
/// Assignable once; see [`JobController::set_run_step`].
pub type RunStepCallback = Arc<dyn Fn(Run) + Send + Sync>;

/// The six external collaborators a controller depends on.
pub struct ControllerDeps {
    pub config_server: Arc<dyn ConfigServer>,
    pub tester_cloud: Arc<dyn TesterCloud>,
    pub artifact_store: Arc<dyn ArtifactStore>,
    pub version_status: Arc<dyn VersionStatus>,
    pub version_compatibility: Arc<dyn VersionCompatibility>,
    pub metric: Arc<dyn Metric>,
}

/// The process-wide controller. Cloning the store/locks/logs handles this
/// holds is cheap; the controller itself is meant to be constructed once
/// and shared behind an `Arc` by the caller.
pub struct JobController<C: Clock> {
    store: Arc<dyn Store>,
    locks: LockService,
    logs: LogStore,
    deps: ControllerDeps,
    clock: C,
    config: ControllerConfig,
    /// Job types whose history retains the continuous-deployment bound
    /// (256 entries) rather than the standard bound (64). Not modeled as
    /// run/profile data since it is a deployment-topology property of the
    /// job type, not of any one run.
    continuous_deployment_types: HashSet<JobType>,
    run_step: OnceLock<RunStepCallback>,
}

impl<C: Clock> JobController<C> {
    pub fn new(
        store: Arc<dyn Store>,
        locks: LockService,
        logs: LogStore,
        deps: ControllerDeps,
        clock: C,
        config: ControllerConfig,
        continuous_deployment_types: HashSet<JobType>,
    ) -> Self {
        Self {
            store,
            locks,
            logs,
            deps,
            clock,
            config,
            continuous_deployment_types,
            run_step: OnceLock::new(),
        }
    }

    /// Assign the `runStep` callback. May only be called once; a second
    /// call is rejected rather than silently replacing the first.
    pub fn set_run_step(&self, callback: RunStepCallback) -> Result<(), ErrorKind> {
        self.run_step
            .set(callback)
            .map_err(|_| ErrorKind::Invalid("runStep callback already set".to_string()))
    }

    fn invoke_run_step(&self, run: Run) {
        match self.run_step.get() {
            Some(callback) => callback(run),
            None => tracing::warn!(run = %run.id, "runStep callback not set, dropping invocation"),
        }
    }

    fn is_continuous_deployment(&self, job_type: &JobType) -> bool {
        self.continuous_deployment_types.contains(job_type)
    }

    // ---- start -------------------------------------------------------

    /// Start a new run for (app, type). Invokes `runStep` on success: since
    /// this controller owns the single-slot callback, it is the natural
    /// place to trigger the caller's subsequent obligation to drive the
    /// run forward.
    pub fn start(
        &self,
        app: &ApplicationId,
        job_type: &JobType,
        versions: Versions,
        is_redeployment: bool,
        profile: JobProfile,
        reason: Option<String>,
    ) -> Result<Run, ErrorKind> {
        let _type_lock = self.locks.lock_type(app, job_type);

        let last_key = keys::last_key(app, job_type);
        let last: Option<Run> = self.store.get_json(&last_key)?;
        if let Some(last) = &last {
            if last.is_active() {
                return Err(ErrorKind::Conflict(format!(
                    "run {} for {app}/{job_type} is still active",
                    last.id
                )));
            }
        }

        if let Some(compile_version) = &versions.source_platform {
            let refused = self
                .deps
                .version_compatibility
                .refuse(&versions.target_platform, compile_version);
            let accepted = self
                .deps
                .version_compatibility
                .accept(&versions.target_platform, compile_version);
            if refused || !accepted {
                return Err(ErrorKind::Invalid(format!(
                    "platform {} is not compatible with compile version {compile_version}",
                    versions.target_platform
                )));
            }
        }

        let new_number = last.as_ref().map(|r| r.id.number + 1).unwrap_or(1);
        let id = RunId::new(app.clone(), job_type.clone(), new_number);
        let run = Run::start(
            id,
            versions,
            is_redeployment,
            profile,
            reason,
            self.clock.epoch_ms(),
        );

        self.store.put_json(&last_key, &run)?;
        self.deps.metric.job_started(&run.id);
        self.invoke_run_step(run.clone());

        Ok(run)
    }

    // ---- finish ------------------------------------------------------

    /// Finalize an active run into history. A no-op if `run_id` is already
    /// historic (finish is idempotent); fails
    /// `NotFound` if `run_id` is unknown entirely.
    pub fn finish(&self, run_id: &RunId) -> Result<(), ErrorKind> {
        let app = &run_id.application;
        let job_type = &run_id.job_type;
        let last_key = keys::last_key(app, job_type);

        let Some(current) = self.store.get_json::<Run>(&last_key)? else {
            return self.finish_already_historic(run_id);
        };
        if current.id != *run_id {
            return self.finish_already_historic(run_id);
        }

        // Step 1-2: lock every step the report step (transitively)
        // depends on, in profile order, bounded by `finish_lock_timeout`.
        let report_step = StepName::new("report");
        let prerequisites = current.profile.all_prerequisites(&report_step);
        let ordered: Vec<StepName> = current
            .profile
            .steps
            .keys()
            .filter(|name| prerequisites.contains(*name))
            .cloned()
            .collect();

        let mut step_locks: Vec<StepLock> = Vec::with_capacity(ordered.len());
        for step in &ordered {
            match self.locks.try_lock_step_for(
                app,
                job_type,
                step,
                self.config.finish_lock_timeout,
            ) {
                Some(lock) => step_locks.push(lock),
                None => {
                    return Err(ErrorKind::Timeout(format!(
                        "could not acquire lock({app}, {job_type}, {step}) within the bound"
                    )));
                }
            }
        }

        // Step 3: the type lock, held for the remainder.
        let _type_lock = self.locks.lock_type(app, job_type);

        // Re-read: state may have moved since the unlocked read above.
        let Some(mut run) = self.store.get_json::<Run>(&last_key)? else {
            return self.finish_already_historic(run_id);
        };
        if run.id != *run_id {
            return self.finish_already_historic(run_id);
        }

        if run.status == RunStatus::Reset {
            let now = self.clock.epoch_ms();
            for step in run.steps.keys().cloned().collect::<Vec<_>>() {
                self.logs.append(
                    run_id,
                    vec![NewLogEntry::new(
                        step,
                        now,
                        LogLevel::Info,
                        "### Run will reset",
                    )],
                )?;
            }
            run.reset_steps();
            self.store.put_json(&last_key, &run)?;
            return Ok(());
        }
        if run.status == RunStatus::Running && run.has_unfinished_step() {
            return Ok(());
        }

        run.finalize(self.clock.epoch_ms());
        let status = run.status;

        let history_key = keys::history_key(app, job_type);
        let mut entries: HistoryMap = self.store.get_json(&history_key)?.unwrap_or_default();
        entries.insert(run.id.number, run);

        let continuous = self.is_continuous_deployment(job_type);
        let history_length = self.config.history_length(continuous);
        let evicted = history::evict(
            &mut entries,
            history_length,
            self.config.max_history_age(),
            self.clock.epoch_ms(),
        );

        self.store.put_json(&history_key, &entries)?;
        self.store.delete(&last_key)?;
        for evicted_id in evicted {
            self.logs.delete(DeleteTarget::Run(evicted_id))?;
        }

        self.logs.flush(run_id)?;
        self.deps.metric.job_finished(run_id, status);

        let min_build = history::min_retained_build(&entries, None);
        if let Err(err) = self.deps.artifact_store.prune(app, min_build) {
            tracing::warn!(application = %app, error = %err, "finish: artifact store prune failed");
        }

        Ok(())
    }

    fn finish_already_historic(&self, run_id: &RunId) -> Result<(), ErrorKind> {
        let history: HistoryMap = self
            .store
            .get_json(&keys::history_key(&run_id.application, &run_id.job_type))?
            .unwrap_or_default();
        if history.contains_key(&run_id.number) {
            Ok(())
        } else {
            Err(ErrorKind::NotFound(format!("run {run_id} not found")))
        }
    }

    // ---- abort, abortAndWait ----------------------------------------

    /// Abort an active run. A no-op if `run_id` is not the
    /// active run (including "already finished"); `NotFound` if unknown.
    pub fn abort(&self, run_id: &RunId, reason: String) -> Result<(), ErrorKind> {
        let app = &run_id.application;
        let job_type = &run_id.job_type;
        let last_key = keys::last_key(app, job_type);
        let _type_lock = self.locks.lock_type(app, job_type);

        let Some(mut run) = self.store.get_json::<Run>(&last_key)? else {
            return Err(ErrorKind::NotFound(format!("run {run_id} not found")));
        };
        if run.id != *run_id || !run.is_active() {
            return Ok(());
        }

        let now = self.clock.epoch_ms();
        let unfinished: Vec<StepName> = run
            .steps
            .iter()
            .filter(|(_, info)| info.status == StepStatus::Unfinished)
            .map(|(name, _)| name.clone())
            .collect();
        for step in unfinished {
            self.logs.append(
                run_id,
                vec![NewLogEntry::new(
                    step,
                    now,
                    LogLevel::Info,
                    format!("Aborting run: {reason}"),
                )],
            )?;
        }
        run.abort(reason, now);
        self.store.put_json(&last_key, &run)?;
        Ok(())
    }

    /// Abort and block until the run settles. Polling relies
    /// on `finish` eventually being driven by `runStep`/the executor; this
    /// does not call `finish` itself.
    pub fn abort_and_wait(&self, run_id: &RunId) -> Result<(), ErrorKind> {
        self.abort(run_id, "aborted: replaced by a new run".to_string())?;

        let app = &run_id.application;
        let job_type = &run_id.job_type;
        let last_key = keys::last_key(app, job_type);

        if let Some(run) = self.store.get_json::<Run>(&last_key)? {
            if run.id == *run_id {
                self.invoke_run_step(run);
            }
        }

        loop {
            let last: Option<Run> = self.store.get_json(&last_key)?;
            match last {
                Some(run) if run.id == *run_id && run.is_active() => {
                    std::thread::sleep(self.config.abort_wait_poll_interval);
                }
                _ => return Ok(()),
            }
        }
    }

    // ---- update / setStartTimestamp ------------------------------------

    /// Apply a step status transition reported by the holder of a
    /// [`StepLock`] for that step. A no-op if the run is no
    /// longer active or is not the one `locked_step` was acquired for.
    pub fn update_step(
        &self,
        run_id: &RunId,
        status: StepStatus,
        locked_step: &StepLock,
    ) -> Result<(), ErrorKind> {
        self.check_locked_step_matches(run_id, locked_step)?;
        let last_key = keys::last_key(&run_id.application, &run_id.job_type);
        let _type_lock = self
            .locks
            .lock_type(&run_id.application, &run_id.job_type);

        let Some(mut run) = self.store.get_json::<Run>(&last_key)? else {
            return Ok(());
        };
        if run.id != *run_id || !run.is_active() {
            return Ok(());
        }

        let now = self.clock.epoch_ms();
        match status {
            StepStatus::Succeeded => {
                run.mark_step_succeeded(locked_step.step(), now);
            }
            StepStatus::Failed => {
                run.mark_step_failed(locked_step.step(), now);
            }
            StepStatus::Unfinished => {}
        }
        self.store.put_json(&last_key, &run)?;
        Ok(())
    }

    /// Record a step's start time.
    pub fn set_start_timestamp(
        &self,
        run_id: &RunId,
        timestamp: u64,
        locked_step: &StepLock,
    ) -> Result<(), ErrorKind> {
        self.check_locked_step_matches(run_id, locked_step)?;
        let last_key = keys::last_key(&run_id.application, &run_id.job_type);
        let _type_lock = self
            .locks
            .lock_type(&run_id.application, &run_id.job_type);

        let Some(mut run) = self.store.get_json::<Run>(&last_key)? else {
            return Ok(());
        };
        if run.id != *run_id || !run.is_active() {
            return Ok(());
        }
        run.set_step_started(locked_step.step(), timestamp);
        self.store.put_json(&last_key, &run)?;
        Ok(())
    }

    fn check_locked_step_matches(
        &self,
        run_id: &RunId,
        locked_step: &StepLock,
    ) -> Result<(), ErrorKind> {
        if locked_step.application() != &run_id.application
            || locked_step.job_type() != &run_id.job_type
        {
            return Err(ErrorKind::Invalid(
                "lockedStep does not belong to the (application, job type) of this run"
                    .to_string(),
            ));
        }
        Ok(())
    }

    // ---- updateVespaLog / updateTestLog / updateTestReport --------------

    /// Pull new config-server log lines and append them.
    /// Swallows collaborator failures: transient, retried next
    /// sweep). No-op if the run has no `deploy` step or it is finished.
    pub fn update_vespa_log(&self, run_id: &RunId) -> Result<(), ErrorKind> {
        let app = &run_id.application;
        let job_type = &run_id.job_type;
        let last_key = keys::last_key(app, job_type);
        let _type_lock = self.locks.lock_type(app, job_type);

        let Some(mut run) = self.store.get_json::<Run>(&last_key)? else {
            return Ok(());
        };
        if run.id != *run_id {
            return Ok(());
        }
        let step = StepName::new("deploy");
        let Some(info) = run.steps.get(&step) else {
            return Ok(());
        };
        if info.status.is_terminal() {
            return Ok(());
        }

        let deployment = DeploymentId::new(app.clone(), job_type.clone());
        let from = run.last_vespa_log_timestamp;
        let lines = match self.deps.config_server.get_logs(&deployment, from) {
            Ok(lines) => lines,
            Err(err) => {
                tracing::warn!(run = %run_id, error = %err, "updateVespaLog: collaborator call failed");
                return Ok(());
            }
        };
        // `from` is an inclusive cursor; a collaborator may legitimately
        // re-return the boundary line on the next poll. Skip anything not
        // strictly newer, except on the very first poll (`from == 0`),
        // when nothing has been recorded yet to duplicate.
        let new_lines: Vec<_> = if from == 0 {
            lines
        } else {
            lines.into_iter().filter(|l| l.timestamp > from).collect()
        };
        if new_lines.is_empty() {
            return Ok(());
        }
        let max_timestamp = new_lines.iter().map(|l| l.timestamp).max().unwrap_or(from);
        let entries = new_lines
            .into_iter()
            .map(|l| NewLogEntry::new(step.clone(), l.timestamp, LogLevel::Info, l.message))
            .collect();
        self.logs.append(run_id, entries)?;
        run.last_vespa_log_timestamp = max_timestamp;
        self.store.put_json(&last_key, &run)?;
        Ok(())
    }

    /// Pull new tester-cloud log lines and append them.
    pub fn update_test_log(&self, run_id: &RunId) -> Result<(), ErrorKind> {
        let app = &run_id.application;
        let job_type = &run_id.job_type;
        let last_key = keys::last_key(app, job_type);
        let _type_lock = self.locks.lock_type(app, job_type);

        let Some(mut run) = self.store.get_json::<Run>(&last_key)? else {
            return Ok(());
        };
        if run.id != *run_id {
            return Ok(());
        }
        let step = StepName::new("tests");
        let Some(info) = run.steps.get(&step) else {
            return Ok(());
        };
        if info.status.is_terminal() {
            return Ok(());
        }

        let deployment = DeploymentId::new(app.clone(), job_type.clone());
        let after = run.last_test_log_entry;
        let lines = match self.deps.tester_cloud.get_log(&deployment, after) {
            Ok(lines) => lines,
            Err(err) => {
                tracing::warn!(run = %run_id, error = %err, "updateTestLog: collaborator call failed");
                return Ok(());
            }
        };
        if lines.is_empty() {
            return Ok(());
        }
        let max_id = lines.iter().map(|l| l.id).max().unwrap_or(after);
        let now = self.clock.epoch_ms();
        let entries = lines
            .into_iter()
            .map(|l| NewLogEntry::new(step.clone(), now, LogLevel::Info, l.message))
            .collect();
        self.logs.append(run_id, entries)?;
        run.last_test_log_entry = max_id;
        self.store.put_json(&last_key, &run)?;
        Ok(())
    }

    /// Pull the test report, once available, and persist it.
    pub fn update_test_report(&self, run_id: &RunId) -> Result<(), ErrorKind> {
        let app = &run_id.application;
        let job_type = &run_id.job_type;
        let last_key = keys::last_key(app, job_type);
        let _type_lock = self.locks.lock_type(app, job_type);

        let Some(run) = self.store.get_json::<Run>(&last_key)? else {
            return Ok(());
        };
        if run.id != *run_id {
            return Ok(());
        }
        let step = StepName::new("tests");
        match run.steps.get(&step) {
            Some(info) if !info.status.is_terminal() => {}
            _ => return Ok(()),
        }

        let deployment = DeploymentId::new(app.clone(), job_type.clone());
        match self.deps.tester_cloud.get_test_report(&deployment) {
            Ok(Some(report)) => self.logs.write_test_report(run_id, &report)?,
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(run = %run_id, error = %err, "updateTestReport: collaborator call failed");
            }
        }
        Ok(())
    }

    // ---- deploy ------------------------------------------------------

    /// The developer-deploy path.
    pub fn deploy(
        &self,
        app: &ApplicationId,
        job_type: &JobType,
        platform: Option<PlatformVersion>,
        package: &[u8],
        dry_run: bool,
    ) -> Result<Run, ErrorKind> {
        let last: Option<Run> = self.store.get_json(&keys::last_key(app, job_type))?;
        if let Some(last) = &last {
            if last.is_active() {
                self.abort_and_wait(&last.id)?;
            }
        }

        let builds = self.deps.artifact_store.find(app)?;
        let last_build = builds.last().copied().unwrap_or(0);
        let previous_package = if last_build > 0 {
            self.deps.artifact_store.get(app, last_build)?
        } else {
            None
        };
        let diff = self
            .deps
            .artifact_store
            .diff(previous_package.as_deref(), package);
        // A dev deploy keeps no build history of its own; the
        // diff against the last production build is what is stored.
        self.deps.artifact_store.put_dev(app, job_type, &diff)?;

        let target_platform = self.resolve_deploy_platform(platform, last.as_ref())?;
        let is_redeployment = previous_package.as_deref() == Some(package);
        let build_number = last_build + 1;
        let versions = Versions::new(target_platform, ApplicationVersion::new(build_number));
        let profile = dev_profile(dry_run);

        self.start(app, job_type, versions, is_redeployment, profile, None)
    }

    fn resolve_deploy_platform(
        &self,
        platform: Option<PlatformVersion>,
        last: Option<&Run>,
    ) -> Result<PlatformVersion, ErrorKind> {
        if let Some(major) = platform.as_ref().and_then(|p| p.major()) {
            return self
                .deps
                .version_status
                .latest_on_major(major)
                .ok_or_else(|| {
                    ErrorKind::Invalid(format!("no deployable version on major {major}"))
                });
        }
        if let Some(last) = last {
            if self
                .deps
                .version_status
                .is_active(&last.versions.target_platform)
            {
                return Ok(last.versions.target_platform.clone());
            }
        }
        self.deps.version_status.latest().ok_or_else(|| {
            ErrorKind::Invalid("no deployable platform version available".to_string())
        })
    }

    // ---- submit -----------------------------------------------------------

    /// Accept a new application+test package pair under the application
    /// lock. Returns the assigned build number.
    pub fn submit(
        &self,
        app: &ApplicationId,
        package: &[u8],
        test_package: Option<&[u8]>,
        meta: Option<serde_json::Value>,
    ) -> Result<u64, ErrorKind> {
        let _app_lock = self.locks.lock_app(app);

        let builds = self.deps.artifact_store.find(app)?;
        let last_build = builds.last().copied().unwrap_or(0);
        let previous = if last_build > 0 {
            self.deps.artifact_store.get(app, last_build)?
        } else {
            None
        };
        let diff = self.deps.artifact_store.diff(previous.as_deref(), package);

        let build_number = last_build + 1;
        self.deps.artifact_store.put(app, build_number, package)?;
        self.deps.artifact_store.put_diff(app, build_number, &diff)?;
        if let Some(test_package) = test_package {
            self.deps
                .artifact_store
                .put_tester(app, build_number, test_package)?;
        }
        if let Some(meta) = meta {
            self.deps.artifact_store.put_meta(app, build_number, &meta)?;
        }

        // The artifact store's own build index already is the
        // application's revision list (`find`), so no separate index
        // needs to be maintained here.
        if let Some(floor) = self.oldest_deployed_build(app)? {
            if let Err(err) = self.deps.artifact_store.prune(app, floor) {
                tracing::warn!(application = %app, error = %err, "submit: prune failed");
            }
            if let Err(err) = self.deps.artifact_store.prune_diffs(app, floor) {
                tracing::warn!(application = %app, error = %err, "submit: prune_diffs failed");
            }
            if let Err(err) = self.deps.artifact_store.prune_testers(app, floor) {
                tracing::warn!(application = %app, error = %err, "submit: prune_testers failed");
            }
        }

        Ok(build_number)
    }

    fn oldest_deployed_build(&self, app: &ApplicationId) -> Result<Option<u64>, ErrorKind> {
        let mut floor: Option<u64> = None;
        for job_type in self.store.list(&keys::app_prefix(app))? {
            let job_type = JobType::new(job_type);
            if let Some(run) = self.store.get_json::<Run>(&keys::last_key(app, &job_type))? {
                let build = run.versions.target_application.build;
                floor = Some(floor.map_or(build, |f| f.min(build)));
            }
            let history: HistoryMap = self
                .store
                .get_json(&keys::history_key(app, &job_type))?
                .unwrap_or_default();
            for run in history.values() {
                let build = run.versions.target_application.build;
                floor = Some(floor.map_or(build, |f| f.min(build)));
            }
        }
        Ok(floor)
    }

    // ---- collectGarbage --------------------------------------------------

    /// Remove data for every application no longer in `live_applications`.
    pub fn collect_garbage(&self, live_applications: &HashSet<ApplicationId>) -> Result<(), ErrorKind> {
        for app_name in self.store.list(keys::RUNS_PREFIX)? {
            let app = ApplicationId::new(app_name);
            if live_applications.contains(&app) {
                continue;
            }
            self.collect_garbage_for_application(&app)?;
        }
        Ok(())
    }

    fn collect_garbage_for_application(&self, app: &ApplicationId) -> Result<(), ErrorKind> {
        let job_types = self.store.list(&keys::app_prefix(app))?;
        let mut all_ok = true;

        for job_type_name in job_types {
            let job_type = JobType::new(job_type_name);
            let deactivate_step = StepName::new("deactivateTester");
            let _tester_lock = self.locks.lock_step(app, &job_type, &deactivate_step);
            let _type_lock = self.locks.lock_type(app, &job_type);

            let deployment = DeploymentId::new(app.clone(), job_type.clone());
            if let Err(err) = self.deps.config_server.deactivate(&deployment) {
                // Tolerated: deactivation failure leaves this type's data
                // in place rather than erasing run history. Leaving the
                // key present is what makes the next sweep retry this
                // (app, type) at all.
                tracing::warn!(
                    application = %app, job_type = %job_type, error = %err,
                    "collectGarbage: tester deactivation failed, leaving data for retry"
                );
                all_ok = false;
                continue;
            }

            let cleanup: Result<(), ErrorKind> = (|| {
                self.store.delete(&keys::last_key(app, &job_type))?;
                self.store.delete(&keys::history_key(app, &job_type))?;
                self.logs
                    .delete(DeleteTarget::Type(app.clone(), job_type.clone()))?;
                Ok(())
            })();
            if let Err(err) = cleanup {
                tracing::warn!(
                    application = %app, job_type = %job_type, error = %err,
                    "collectGarbage: per-type cleanup failed, will retry next sweep"
                );
                all_ok = false;
            }
        }

        if all_ok {
            self.logs.delete(DeleteTarget::Application(app.clone()))?;
        }
        Ok(())
    }

    // ---- queries -----------------------------------------------------

    /// Every run for (app, type), historic and active, ascending by number.
    pub fn runs(&self, app: &ApplicationId, job_type: &JobType) -> Result<Vec<Run>, ErrorKind> {
        let mut out: Vec<Run> = self
            .store
            .get_json::<HistoryMap>(&keys::history_key(app, job_type))?
            .unwrap_or_default()
            .into_values()
            .collect();
        if let Some(active) = self.store.get_json::<Run>(&keys::last_key(app, job_type))? {
            out.push(active);
        }
        out.sort_by_key(|r| r.id.number);
        Ok(out)
    }

    /// A specific run by id, active or historic.
    pub fn run(&self, run_id: &RunId) -> Result<Option<Run>, ErrorKind> {
        let app = &run_id.application;
        let job_type = &run_id.job_type;
        if let Some(active) = self.store.get_json::<Run>(&keys::last_key(app, job_type))? {
            if active.id == *run_id {
                return Ok(Some(active));
            }
        }
        let history: HistoryMap = self
            .store
            .get_json(&keys::history_key(app, job_type))?
            .unwrap_or_default();
        Ok(history.get(&run_id.number).cloned())
    }

    /// The active run for (app, type), if any.
    pub fn last(&self, app: &ApplicationId, job_type: &JobType) -> Result<Option<Run>, ErrorKind> {
        Ok(self.store.get_json(&keys::last_key(app, job_type))?)
    }

    /// The most recently finished run for (app, type), regardless of
    /// status.
    pub fn last_completed(
        &self,
        app: &ApplicationId,
        job_type: &JobType,
    ) -> Result<Option<Run>, ErrorKind> {
        let history: HistoryMap = self
            .store
            .get_json(&keys::history_key(app, job_type))?
            .unwrap_or_default();
        Ok(history.values().max_by_key(|r| r.id.number).cloned())
    }

    /// The most recent successful run for (app, type).
    pub fn last_success(
        &self,
        app: &ApplicationId,
        job_type: &JobType,
    ) -> Result<Option<Run>, ErrorKind> {
        let history: HistoryMap = self
            .store
            .get_json(&keys::history_key(app, job_type))?
            .unwrap_or_default();
        Ok(history
            .values()
            .filter(|r| r.status == RunStatus::Success)
            .max_by_key(|r| r.id.number)
            .cloned())
    }

    /// The oldest non-success run that comes after the latest success (or
    /// the oldest non-success run at all, if there is no success yet).
    pub fn first_failing(
        &self,
        app: &ApplicationId,
        job_type: &JobType,
    ) -> Result<Option<Run>, ErrorKind> {
        let history: HistoryMap = self
            .store
            .get_json(&keys::history_key(app, job_type))?
            .unwrap_or_default();
        let latest_success = history
            .values()
            .filter(|r| r.status == RunStatus::Success)
            .map(|r| r.id.number)
            .max();
        Ok(history
            .values()
            .filter(|r| {
                r.status != RunStatus::Success
                    && latest_success.map(|n| r.id.number > n).unwrap_or(true)
            })
            .min_by_key(|r| r.id.number)
            .cloned())
    }

    /// Every active run, across every application and job type.
    pub fn active(&self) -> Result<Vec<Run>, ErrorKind> {
        let mut out = Vec::new();
        for app_name in self.store.list(keys::RUNS_PREFIX)? {
            out.extend(self.active_for_application(&ApplicationId::new(app_name))?);
        }
        Ok(out)
    }

    /// Every active run for a single application, across its job types.
    pub fn active_for_application(&self, app: &ApplicationId) -> Result<Vec<Run>, ErrorKind> {
        let mut out = Vec::new();
        for job_type_name in self.store.list(&keys::app_prefix(app))? {
            let job_type = JobType::new(job_type_name);
            if let Some(run) = self.store.get_json::<Run>(&keys::last_key(app, &job_type))? {
                if run.is_active() {
                    out.push(run);
                }
            }
        }
        Ok(out)
    }

    pub fn job_status(&self, run_id: &RunId) -> Result<Option<RunStatus>, ErrorKind> {
        Ok(self.run(run_id)?.map(|r| r.status))
    }

    pub fn deployment_status(
        &self,
        app: &ApplicationId,
        job_type: &JobType,
    ) -> Result<Option<RunStatus>, ErrorKind> {
        Ok(self.last(app, job_type)?.map(|r| r.status))
    }

    pub fn deployment_statuses(
        &self,
        list: &[(ApplicationId, JobType)],
    ) -> Result<Vec<Option<RunStatus>>, ErrorKind> {
        list.iter()
            .map(|(app, job_type)| self.deployment_status(app, job_type))
            .collect()
    }
}

/// The profile a developer deploy runs: `deploy` alone for a
/// dry run, `deploy -> installTests -> tests` otherwise.
///
/// Built directly from a fixed, known-acyclic set of steps rather than
/// through `JobProfile::new`'s validating constructor: there is no
/// fallible input here, so there is nothing for that validation to
/// reject.
fn dev_profile(dry_run: bool) -> JobProfile {
    let mut defs = vec![StepDef::new("deploy")];
    if !dry_run {
        defs.push(StepDef::new("installTests").requires("deploy"));
        defs.push(
            StepDef::new("tests")
                .requires("installTests")
                .fails_as(RunStatus::TestFailure),
        );
    }
    let steps = defs.into_iter().map(|def| (def.name.clone(), def)).collect();
    JobProfile { steps }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
