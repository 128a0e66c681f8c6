// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The run/step state machine.
//!
//! `Run` is pure data: constructing, querying and transitioning one is
//! synchronous and infallible (aside from the explicit transition guards
//! below). All locking, persistence and collaborator I/O live in
//! `jobctl-store`, `jobctl-locks` and `jobctl-engine`.

use crate::profile::JobProfile;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

crate::define_id! {
    /// Identifies a tenant application.
    pub struct ApplicationId;
}

crate::define_id! {
    /// Names a category of run: a deployment zone, a test kind, etc.
    pub struct JobType;
}

crate::define_id! {
    /// Names a step within a [`crate::profile::JobProfile`].
    pub struct StepName;
}

/// A deployable platform version, e.g. `"8.401.21"`.
///
/// Ordered by dotted numeric components; a malformed component sorts as 0
/// rather than panicking, since version strings originate from an external
/// collaborator (`VersionStatus`) the controller does not validate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformVersion(pub String);

impl PlatformVersion {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    fn components(&self) -> Vec<u64> {
        self.0.split('.').map(|p| p.parse().unwrap_or(0)).collect()
    }

    /// The major version component, if present.
    pub fn major(&self) -> Option<u64> {
        self.components().first().copied()
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for PlatformVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PlatformVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components().cmp(&other.components())
    }
}

/// An application package version: a monotonic build number plus the
/// optional source revision it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationVersion {
    pub build: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl ApplicationVersion {
    pub fn new(build: u64) -> Self {
        Self {
            build,
            revision: None,
        }
    }
}

/// The platform/application version pairing a run deploys, plus the
/// versions it redeploys over (if this is a redeployment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versions {
    pub target_platform: PlatformVersion,
    pub target_application: ApplicationVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_platform: Option<PlatformVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_application: Option<ApplicationVersion>,
}

impl Versions {
    pub fn new(target_platform: PlatformVersion, target_application: ApplicationVersion) -> Self {
        Self {
            target_platform,
            target_application,
            source_platform: None,
            source_application: None,
        }
    }
}

/// Identifies one run of an (application, job type) pair.
///
/// `number` is strictly increasing per (app, type); equality and ordering
/// are defined by `number` within a fixed (app, type).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId {
    pub application: ApplicationId,
    pub job_type: JobType,
    pub number: u64,
}

impl RunId {
    pub fn new(application: ApplicationId, job_type: JobType, number: u64) -> Self {
        Self {
            application,
            job_type,
            number,
        }
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.application, self.job_type, self.number)
    }
}

impl PartialOrd for RunId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RunId {
    /// Compares by (application, job_type, number). Meaningful ordering is
    /// only guaranteed within a fixed (application, job_type) pair; the
    /// lexicographic tiebreak on the other fields exists only so `RunId`
    /// can live in a `BTreeMap`/`BTreeSet`.
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.application, &self.job_type, self.number).cmp(&(
            &other.application,
            &other.job_type,
            other.number,
        ))
    }
}

/// Status of a single step within a run.
///
/// A step transitions only `Unfinished -> Succeeded | Failed`; once
/// non-`Unfinished` it is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Unfinished,
    Succeeded,
    Failed,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StepStatus::Unfinished)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Unfinished => write!(f, "unfinished"),
            StepStatus::Succeeded => write!(f, "succeeded"),
            StepStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Per-step bookkeeping within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInfo {
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,
}

impl StepInfo {
    pub fn unfinished() -> Self {
        Self {
            status: StepStatus::Unfinished,
            start: None,
        }
    }
}

impl Default for StepInfo {
    fn default() -> Self {
        Self::unfinished()
    }
}

/// Terminal (or in-progress) status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    Running,
    Success,
    Aborted,
    Error,
    OutOfCapacity,
    DeploymentFailed,
    InstallationFailed,
    TestFailure,
    NoTests,
    Reset,
}

impl RunStatus {
    /// Whether this status means the run is still active: `running` or
    /// `reset` with no `end` set.
    pub fn is_active(&self) -> bool {
        matches!(self, RunStatus::Running | RunStatus::Reset)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Aborted => "aborted",
            RunStatus::Error => "error",
            RunStatus::OutOfCapacity => "outOfCapacity",
            RunStatus::DeploymentFailed => "deploymentFailed",
            RunStatus::InstallationFailed => "installationFailed",
            RunStatus::TestFailure => "testFailure",
            RunStatus::NoTests => "noTests",
            RunStatus::Reset => "reset",
        };
        write!(f, "{}", s)
    }
}

/// One attempt of a job for an (application, job type) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub versions: Versions,
    pub is_redeployment: bool,
    pub start: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u64>,
    pub status: RunStatus,
    pub steps: indexmap::IndexMap<StepName, StepInfo>,
    pub profile: JobProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_until: Option<u64>,
    #[serde(default)]
    pub last_vespa_log_timestamp: u64,
    #[serde(default)]
    pub last_test_log_entry: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tester_certificate: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Field from a legacy wire format: retained for byte-for-byte
    /// compatibility, never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_ordering_spec: Option<serde_json::Value>,
}

impl Run {
    /// Construct a freshly-started run: all steps unfinished, status running.
    pub fn start(
        id: RunId,
        versions: Versions,
        is_redeployment: bool,
        profile: JobProfile,
        reason: Option<String>,
        now_epoch_ms: u64,
    ) -> Self {
        let steps = profile.initial_step_statuses();
        Self {
            id,
            versions,
            is_redeployment,
            start: now_epoch_ms,
            end: None,
            status: RunStatus::Running,
            steps,
            profile,
            sleep_until: None,
            last_vespa_log_timestamp: 0,
            last_test_log_entry: -1,
            tester_certificate: None,
            reason,
            legacy_ordering_spec: None,
        }
    }

    /// Active = stored in the active slot with no `end`.
    pub fn is_active(&self) -> bool {
        self.end.is_none()
    }

    /// Reset a run's step statuses back to their initial state while
    /// preserving `number`, `start`, and `sleepUntil`.
    pub fn reset_steps(&mut self) {
        self.steps = self.profile.initial_step_statuses();
        self.status = RunStatus::Running;
    }

    /// Mark a step succeeded. No-op if the step is already terminal or its
    /// prerequisites have not all succeeded.
    ///
    /// Returns `true` if the transition took effect.
    pub fn mark_step_succeeded(&mut self, step: &StepName, now_epoch_ms: u64) -> bool {
        if !self.profile.prerequisites_satisfied(step, &self.steps) {
            return false;
        }
        self.transition_step(step, StepStatus::Succeeded, now_epoch_ms)
    }

    /// Mark a step failed. A step may fail at any time while unfinished.
    ///
    /// Returns `true` if the transition took effect.
    pub fn mark_step_failed(&mut self, step: &StepName, now_epoch_ms: u64) -> bool {
        self.transition_step(step, StepStatus::Failed, now_epoch_ms)
    }

    fn transition_step(&mut self, step: &StepName, status: StepStatus, now_epoch_ms: u64) -> bool {
        let Some(info) = self.steps.get_mut(step) else {
            return false;
        };
        if info.status.is_terminal() {
            return false;
        }
        info.status = status;
        if info.start.is_none() {
            info.start = Some(now_epoch_ms);
        }
        true
    }

    /// Record that a step has started, if it hasn't already.
    pub fn set_step_started(&mut self, step: &StepName, now_epoch_ms: u64) {
        if let Some(info) = self.steps.get_mut(step) {
            if info.start.is_none() {
                info.start = Some(now_epoch_ms);
            }
        }
    }

    /// True once every step in the profile has succeeded.
    pub fn all_steps_succeeded(&self) -> bool {
        self.steps
            .values()
            .all(|info| info.status == StepStatus::Succeeded)
    }

    /// True if any step is still unfinished.
    pub fn has_unfinished_step(&self) -> bool {
        self.steps
            .values()
            .any(|info| info.status == StepStatus::Unfinished)
    }

    /// The first step (in profile order) with status `Failed`, if any.
    pub fn first_failing_step(&self) -> Option<&StepName> {
        self.profile
            .steps
            .keys()
            .find(|name| self.steps.get(*name).map(|i| i.status) == Some(StepStatus::Failed))
    }

    /// Derive the terminal status once every step is either succeeded or
    /// has reached a final non-unfinished state.
    ///
    /// All-succeeded maps to `Success`. Otherwise the first failing step
    /// (in profile order) determines the terminal kind via its configured
    /// `failure_status`; a step with no configured failure status surfaces
    /// as `Error` rather than guessing.
    pub fn derive_terminal_status(&self) -> RunStatus {
        if self.all_steps_succeeded() {
            return RunStatus::Success;
        }
        self.first_failing_step()
            .and_then(|name| self.profile.steps.get(name))
            .and_then(|def| def.failure_status)
            .unwrap_or(RunStatus::Error)
    }

    /// Abort: append-log-and-transition is the caller's job (it needs the
    /// LogStore); this only flips unfinished, non-run-always steps to
    /// failed and sets the terminal status.
    pub fn abort(&mut self, reason: String, now_epoch_ms: u64) {
        let run_always: Vec<StepName> = self
            .profile
            .steps
            .iter()
            .filter(|(_, def)| def.run_always)
            .map(|(name, _)| name.clone())
            .collect();
        let to_fail: Vec<StepName> = self
            .steps
            .iter()
            .filter(|(name, info)| {
                info.status == StepStatus::Unfinished && !run_always.contains(name)
            })
            .map(|(name, _)| name.clone())
            .collect();
        for name in to_fail {
            self.transition_step(&name, StepStatus::Failed, now_epoch_ms);
        }
        self.status = RunStatus::Aborted;
        self.reason = Some(reason);
    }

    /// Finalize: set `end` and the derived terminal status (unless already
    /// aborted, which `abort` already set).
    pub fn finalize(&mut self, now_epoch_ms: u64) {
        if self.status == RunStatus::Running {
            self.status = self.derive_terminal_status();
        }
        self.end = Some(now_epoch_ms);
    }
}

/// Snapshot of historic runs for an (application, job type) pair, keyed by
/// run number for deterministic ordering.
pub type HistoryMap = HashMap<u64, Run>;

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
