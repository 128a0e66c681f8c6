// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jobctl-engine: the [`JobController`] public contract and its embedded
//! [`history`] retention manager.
//!
//! Everything else in the workspace is a collaborator this crate
//! arbitrates between: [`jobctl_store`] for durable state, [`jobctl_locks`]
//! for the (app, type)/(app, type, step) locking discipline, [`jobctl_logs`]
//! for per-run logs and test reports, and [`jobctl_adapters`] for the
//! config-server/tester-cloud/artifact-store/version collaborators.

mod controller;
pub mod history;
mod keys;

pub use controller::{ControllerDeps, JobController, RunStepCallback};
