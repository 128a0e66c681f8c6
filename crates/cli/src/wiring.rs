// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires a [`JobController`] against a [`FileStore`] rooted at `--root`.
//!
//! The REST/RPC layer, the step executor, and the config-server/tester-
//! cloud/artifact-store collaborators are all out of scope for the
//! controller itself; this binary exists only for operator visibility, so
//! every collaborator here is either a no-op (config-server, tester-cloud
//! — their real counterparts are genuinely external services) or an
//! in-process fake (artifact store, version status/compatibility) good
//! enough to exercise `start`/`deploy`/`submit` end to end within a single
//! invocation.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use jobctl_adapters::{
    FakeArtifactStore, FakeVersionCompatibility, FakeVersionStatus, LoggingMetric,
    NoopConfigServer, NoopTesterCloud,
};
use jobctl_core::{ControllerConfig, JobType, PlatformVersion, SystemClock};
use jobctl_engine::{ControllerDeps, JobController};
use jobctl_locks::LockService;
use jobctl_logs::LogStore;
use jobctl_store::FileStore;

/// Bundles the controller with the root it was built against, so commands
/// that need to know where data lives (e.g. for a friendly error message)
/// don't have to thread the path separately.
pub struct Engine {
    pub controller: JobController<SystemClock>,
    pub root: PathBuf,
}

/// Build an [`Engine`] rooted at `root`, with `known_platforms` registered
/// with the fake [`jobctl_adapters::VersionStatus`] (all marked active) and
/// `continuous_deployment_types` granted the larger history bound.
pub fn build(
    root: PathBuf,
    known_platforms: Vec<PlatformVersion>,
    continuous_deployment_types: HashSet<JobType>,
) -> Engine {
    let store = Arc::new(FileStore::new(root.clone()));
    let locks = LockService::new();
    let logs = LogStore::new(store.clone());

    let mut version_status = FakeVersionStatus::new();
    for platform in known_platforms {
        version_status = version_status.with_version(platform, true);
    }

    let deps = ControllerDeps {
        config_server: Arc::new(NoopConfigServer),
        tester_cloud: Arc::new(NoopTesterCloud),
        artifact_store: Arc::new(FakeArtifactStore::new()),
        version_status: Arc::new(version_status),
        version_compatibility: Arc::new(FakeVersionCompatibility::new()),
        metric: Arc::new(LoggingMetric),
    };

    let controller = JobController::new(
        store,
        locks,
        logs,
        deps,
        SystemClock,
        ControllerConfig::default(),
        continuous_deployment_types,
    );

    Engine { controller, root }
}

#[cfg(test)]
#[path = "wiring_tests.rs"]
mod tests;
