// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The artifact-store collaborator: application packages, tester
//! packages, metadata, dev packages, and their diffs.

use jobctl_core::{ApplicationId, ErrorKind, JobType};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactStoreError {
    #[error("artifact store failed for {application}: {message}")]
    Failed {
        application: ApplicationId,
        message: String,
    },
}

impl From<ArtifactStoreError> for ErrorKind {
    fn from(err: ArtifactStoreError) -> Self {
        ErrorKind::External(err.to_string())
    }
}

/// Thin interface to the artifact store.
///
/// Builds are identified by their monotonic number; diffs are computed by
/// this collaborator rather than the controller, which never interprets
/// application package contents itself.
pub trait ArtifactStore: Send + Sync + 'static {
    /// Store a production application package for `build`.
    fn put(&self, app: &ApplicationId, build: u64, package: &[u8]) -> Result<(), ArtifactStoreError>;

    /// Store the tester package paired with `build`.
    fn put_tester(
        &self,
        app: &ApplicationId,
        build: u64,
        package: &[u8],
    ) -> Result<(), ArtifactStoreError>;

    /// Store opaque metadata for `build` (e.g. submit timestamp, author).
    fn put_meta(
        &self,
        app: &ApplicationId,
        build: u64,
        meta: &serde_json::Value,
    ) -> Result<(), ArtifactStoreError>;

    /// Store a developer-deploy package for (app, type), which has no
    /// build number of its own.
    fn put_dev(
        &self,
        app: &ApplicationId,
        job_type: &JobType,
        package: &[u8],
    ) -> Result<(), ArtifactStoreError>;

    /// Retrieve a previously-stored production package.
    fn get(&self, app: &ApplicationId, build: u64) -> Result<Option<Vec<u8>>, ArtifactStoreError>;

    /// Every build number known for `app`, ascending.
    fn find(&self, app: &ApplicationId) -> Result<Vec<u64>, ArtifactStoreError>;

    /// Compute the diff of `next` against `previous` (`None` diffs
    /// against empty).
    fn diff(&self, previous: Option<&[u8]>, next: &[u8]) -> Vec<u8>;

    /// Persist a previously-computed diff for `build`.
    fn put_diff(&self, app: &ApplicationId, build: u64, diff: &[u8]) -> Result<(), ArtifactStoreError>;

    /// Remove every stored build older than `keep_min_build`, invoked as
    /// `finish`'s prune callback.
    fn prune(&self, app: &ApplicationId, keep_min_build: u64) -> Result<(), ArtifactStoreError>;

    /// Remove tester packages older than `keep_min_build`.
    fn prune_testers(&self, app: &ApplicationId, keep_min_build: u64) -> Result<(), ArtifactStoreError>;

    /// Remove diffs older than `keep_min_build`.
    fn prune_diffs(&self, app: &ApplicationId, keep_min_build: u64) -> Result<(), ArtifactStoreError>;

    /// Remove dev-deploy diffs for (app, type): they have no retained
    /// history, so only the latest is ever needed.
    fn prune_dev_diffs(&self, app: &ApplicationId, job_type: &JobType) -> Result<(), ArtifactStoreError>;
}

/// An in-memory artifact store, for tests and single-process use.
///
/// Diffs are computed as a byte-level prefix/suffix trim — good enough to
/// exercise callers without depending on an external diff algorithm, and
/// exact content is never interpreted by the controller.
#[derive(Default)]
pub struct FakeArtifactStore {
    packages: Mutex<HashMap<ApplicationId, HashMap<u64, Vec<u8>>>>,
    testers: Mutex<HashMap<ApplicationId, HashMap<u64, Vec<u8>>>>,
    meta: Mutex<HashMap<ApplicationId, HashMap<u64, serde_json::Value>>>,
    diffs: Mutex<HashMap<ApplicationId, HashMap<u64, Vec<u8>>>>,
    dev: Mutex<HashMap<(ApplicationId, JobType), Vec<u8>>>,
}

impl FakeArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tester_builds(&self, app: &ApplicationId) -> Vec<u64> {
        let mut builds: Vec<u64> = self
            .testers
            .lock()
            .get(app)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default();
        builds.sort_unstable();
        builds
    }

    pub fn meta(&self, app: &ApplicationId, build: u64) -> Option<serde_json::Value> {
        self.meta.lock().get(app).and_then(|m| m.get(&build)).cloned()
    }

    pub fn stored_diff(&self, app: &ApplicationId, build: u64) -> Option<Vec<u8>> {
        self.diffs.lock().get(app).and_then(|m| m.get(&build)).cloned()
    }
}

impl ArtifactStore for FakeArtifactStore {
    fn put(&self, app: &ApplicationId, build: u64, package: &[u8]) -> Result<(), ArtifactStoreError> {
        self.packages
            .lock()
            .entry(app.clone())
            .or_default()
            .insert(build, package.to_vec());
        Ok(())
    }

    fn put_tester(
        &self,
        app: &ApplicationId,
        build: u64,
        package: &[u8],
    ) -> Result<(), ArtifactStoreError> {
        self.testers
            .lock()
            .entry(app.clone())
            .or_default()
            .insert(build, package.to_vec());
        Ok(())
    }

    fn put_meta(
        &self,
        app: &ApplicationId,
        build: u64,
        meta: &serde_json::Value,
    ) -> Result<(), ArtifactStoreError> {
        self.meta
            .lock()
            .entry(app.clone())
            .or_default()
            .insert(build, meta.clone());
        Ok(())
    }

    fn put_dev(
        &self,
        app: &ApplicationId,
        job_type: &JobType,
        package: &[u8],
    ) -> Result<(), ArtifactStoreError> {
        self.dev
            .lock()
            .insert((app.clone(), job_type.clone()), package.to_vec());
        Ok(())
    }

    fn get(&self, app: &ApplicationId, build: u64) -> Result<Option<Vec<u8>>, ArtifactStoreError> {
        Ok(self
            .packages
            .lock()
            .get(app)
            .and_then(|m| m.get(&build))
            .cloned())
    }

    fn find(&self, app: &ApplicationId) -> Result<Vec<u64>, ArtifactStoreError> {
        let mut builds: Vec<u64> = self
            .packages
            .lock()
            .get(app)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default();
        builds.sort_unstable();
        Ok(builds)
    }

    fn diff(&self, previous: Option<&[u8]>, next: &[u8]) -> Vec<u8> {
        match previous {
            None => next.to_vec(),
            Some(previous) => {
                let common = previous
                    .iter()
                    .zip(next.iter())
                    .take_while(|(a, b)| a == b)
                    .count();
                next[common..].to_vec()
            }
        }
    }

    fn put_diff(&self, app: &ApplicationId, build: u64, diff: &[u8]) -> Result<(), ArtifactStoreError> {
        self.diffs
            .lock()
            .entry(app.clone())
            .or_default()
            .insert(build, diff.to_vec());
        Ok(())
    }

    fn prune(&self, app: &ApplicationId, keep_min_build: u64) -> Result<(), ArtifactStoreError> {
        if let Some(builds) = self.packages.lock().get_mut(app) {
            builds.retain(|build, _| *build >= keep_min_build);
        }
        Ok(())
    }

    fn prune_testers(&self, app: &ApplicationId, keep_min_build: u64) -> Result<(), ArtifactStoreError> {
        if let Some(builds) = self.testers.lock().get_mut(app) {
            builds.retain(|build, _| *build >= keep_min_build);
        }
        Ok(())
    }

    fn prune_diffs(&self, app: &ApplicationId, keep_min_build: u64) -> Result<(), ArtifactStoreError> {
        if let Some(builds) = self.diffs.lock().get_mut(app) {
            builds.retain(|build, _| *build >= keep_min_build);
        }
        Ok(())
    }

    fn prune_dev_diffs(&self, app: &ApplicationId, job_type: &JobType) -> Result<(), ArtifactStoreError> {
        self.dev.lock().remove(&(app.clone(), job_type.clone()));
        Ok(())
    }
}

#[cfg(test)]
#[path = "artifact_store_tests.rs"]
mod tests;
