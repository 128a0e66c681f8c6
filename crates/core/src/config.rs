// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller-wide tunables, loadable from a TOML file.
//!
//! Defaults: 256 retained runs for continuous-deployment job types, 64
//! otherwise, with a 60 day retention ceiling.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// History length retained for a continuous-deployment job type.
pub const CONTINUOUS_DEPLOYMENT_HISTORY_LENGTH: usize = 256;
/// History length retained for all other job types.
pub const DEFAULT_HISTORY_LENGTH: usize = 64;
/// Maximum age of a retained historic run, absent the success/failure exception.
pub const DEFAULT_MAX_HISTORY_AGE_DAYS: u64 = 60;

/// Tunable knobs for the controller, as distinct from the data the
/// controller manages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// History entries retained per (app, type) for continuous-deployment systems.
    pub continuous_deployment_history_length: usize,
    /// History entries retained per (app, type) otherwise.
    pub default_history_length: usize,
    /// Maximum age of a retained historic run.
    pub max_history_age_days: u64,
    /// Bound on how long `finish` waits to acquire prerequisite step locks.
    pub finish_lock_timeout: Duration,
    /// Poll interval used by `abortAndWait`.
    pub abort_wait_poll_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            continuous_deployment_history_length: CONTINUOUS_DEPLOYMENT_HISTORY_LENGTH,
            default_history_length: DEFAULT_HISTORY_LENGTH,
            max_history_age_days: DEFAULT_MAX_HISTORY_AGE_DAYS,
            finish_lock_timeout: Duration::from_secs(10),
            abort_wait_poll_interval: Duration::from_millis(100),
        }
    }
}

impl ControllerConfig {
    /// The history length for a given job type, given whether it is a
    /// continuous-deployment system.
    pub fn history_length(&self, continuous_deployment: bool) -> usize {
        if continuous_deployment {
            self.continuous_deployment_history_length
        } else {
            self.default_history_length
        }
    }

    /// Load configuration from a TOML file, falling back to defaults for
    /// any field the file omits and for a missing file entirely.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn max_history_age(&self) -> Duration {
        Duration::from_secs(self.max_history_age_days * 24 * 60 * 60)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
