// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform version collaborators: which versions are deployable, which
//! are currently active, and whether a given platform/compile version
//! pairing is compatible.

use jobctl_core::PlatformVersion;

/// The ordered list of deployable platform versions, and which are
/// currently serving traffic.
pub trait VersionStatus: Send + Sync + 'static {
    /// Deployable versions, ascending.
    fn versions(&self) -> Vec<PlatformVersion>;

    /// Whether `version` is currently active (serving traffic somewhere).
    fn is_active(&self, version: &PlatformVersion) -> bool;

    /// The newest deployable version on the given major, if any.
    fn latest_on_major(&self, major: u64) -> Option<PlatformVersion> {
        self.versions()
            .into_iter()
            .filter(|v| v.major() == Some(major))
            .max()
    }

    /// The newest deployable version overall, if any.
    fn latest(&self) -> Option<PlatformVersion> {
        self.versions().into_iter().max()
    }
}

/// Whether a platform/compile version pairing is deployable together.
pub trait VersionCompatibility: Send + Sync + 'static {
    /// True if the pairing is known-good.
    fn accept(&self, platform: &PlatformVersion, compile: &PlatformVersion) -> bool;

    /// True if the pairing is known-bad (distinct from "unknown", which
    /// is neither accepted nor refused).
    fn refuse(&self, platform: &PlatformVersion, compile: &PlatformVersion) -> bool;
}

/// A fixed, in-memory [`VersionStatus`] for tests and simple deployments.
#[derive(Debug, Clone, Default)]
pub struct FakeVersionStatus {
    versions: Vec<PlatformVersion>,
    active: std::collections::HashSet<PlatformVersion>,
}

impl FakeVersionStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: PlatformVersion, active: bool) -> Self {
        if active {
            self.active.insert(version.clone());
        }
        self.versions.push(version);
        self
    }
}

impl VersionStatus for FakeVersionStatus {
    fn versions(&self) -> Vec<PlatformVersion> {
        self.versions.clone()
    }

    fn is_active(&self, version: &PlatformVersion) -> bool {
        self.active.contains(version)
    }
}

/// Compatibility backed by an explicit allow/deny table. `accept` and
/// `refuse` are independent predicates — a pair tabled in neither is
/// "unknown", which the caller treats as invalid.
#[derive(Debug, Clone, Default)]
pub struct FakeVersionCompatibility {
    accepted: std::collections::HashSet<(PlatformVersion, PlatformVersion)>,
    refused: std::collections::HashSet<(PlatformVersion, PlatformVersion)>,
}

impl FakeVersionCompatibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept_pair(mut self, platform: PlatformVersion, compile: PlatformVersion) -> Self {
        self.accepted.insert((platform, compile));
        self
    }

    pub fn refuse_pair(mut self, platform: PlatformVersion, compile: PlatformVersion) -> Self {
        self.refused.insert((platform, compile));
        self
    }
}

impl VersionCompatibility for FakeVersionCompatibility {
    fn accept(&self, platform: &PlatformVersion, compile: &PlatformVersion) -> bool {
        self.accepted
            .contains(&(platform.clone(), compile.clone()))
    }

    fn refuse(&self, platform: &PlatformVersion, compile: &PlatformVersion) -> bool {
        self.refused
            .contains(&(platform.clone(), compile.clone()))
    }
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
