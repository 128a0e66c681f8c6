// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! jobctl-adapters: thin interfaces to the controller's external
//! collaborators — config-server, tester-cloud, artifact store, platform
//! version status/compatibility, and metrics — plus a fake double for
//! each, and a no-op double where tolerant/best-effort behavior is
//! called for.
//!
//! These traits are deliberately synchronous: the controller itself is
//! blocking, with no coroutine or async runtime in the loop, so
//! collaborator calls are ordinary blocking calls made while not holding
//! the wrong lock, rather than `async fn`s awaited under one.

mod artifact_store;
mod config_server;
mod deployment;
mod metric;
mod tester_cloud;
mod version;

pub use artifact_store::{ArtifactStore, ArtifactStoreError, FakeArtifactStore};
pub use config_server::{ConfigServer, ConfigServerError, NoopConfigServer};
pub use deployment::{DeploymentId, TesterLogLine, VespaLogLine};
pub use metric::{LoggingMetric, Metric};
pub use tester_cloud::{NoopTesterCloud, TesterCloud, TesterCloudError};
pub use version::{
    FakeVersionCompatibility, FakeVersionStatus, VersionCompatibility, VersionStatus,
};

#[cfg(any(test, feature = "test-support"))]
pub use config_server::FakeConfigServer;
#[cfg(any(test, feature = "test-support"))]
pub use metric::FakeMetric;
#[cfg(any(test, feature = "test-support"))]
pub use tester_cloud::FakeTesterCloud;
