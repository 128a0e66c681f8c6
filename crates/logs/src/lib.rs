// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jobctl-logs: append-only per-run log buffer over [`jobctl_store::Store`].
//!
//! Log entry ids are a single monotonic counter per run, which is strictly
//! stronger than — and therefore implies — per-(run, step) monotonicity:
//! any subsequence of a strictly increasing sequence is itself strictly
//! increasing.

mod error;
mod keys;

pub use error::LogError;

use jobctl_core::{ApplicationId, JobType, LogEntry, NewLogEntry, RunId, TestReport};
use jobctl_store::{Store, StoreExt};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;

/// A window of a run's log, as returned by `read_active`/`read_finished`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    pub entries: Vec<LogEntry>,
}

impl RunLog {
    fn after(mut self, after: u64) -> Self {
        self.entries.retain(|e| e.id > after);
        self
    }
}

/// The active, not-yet-sealed log for one run: every entry plus the next
/// id to assign.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ActiveLog {
    next_id: u64,
    entries: Vec<LogEntry>,
}

/// What to bulk-delete via [`LogStore::delete`].
pub enum DeleteTarget {
    Run(RunId),
    /// Every run of one (application, job type) pair: `collectGarbage`'s
    /// per-type cleanup, which must not disturb a sibling type's logs
    /// under the same application.
    Type(ApplicationId, JobType),
    Application(ApplicationId),
}

/// Append-only per-run log store, backed by any [`Store`] implementation.
pub struct LogStore {
    store: Arc<dyn Store>,
    zstd_level: i32,
}

impl LogStore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            zstd_level: 3,
        }
    }

    /// Append `entries` to the active log of `run`, assigning each a
    /// monotonically increasing id.
    pub fn append(&self, run: &RunId, entries: Vec<NewLogEntry>) -> Result<(), LogError> {
        if entries.is_empty() {
            return Ok(());
        }
        let key = keys::active_key(run);
        let mut active: ActiveLog = self.store.get_json(&key)?.unwrap_or_default();
        for new_entry in entries {
            let id = active.next_id;
            active.next_id += 1;
            active.entries.push(LogEntry {
                id,
                timestamp: new_entry.timestamp,
                step: new_entry.step,
                level: new_entry.level,
                message: new_entry.message,
            });
        }
        self.store.put_json(&key, &active)?;
        tracing::debug!(run = %run, "appended log entries");
        Ok(())
    }

    /// Read the live buffer, entries with `id > after`.
    pub fn read_active(&self, run: &RunId, after: u64) -> Result<RunLog, LogError> {
        let key = keys::active_key(run);
        let active: ActiveLog = self.store.get_json(&key)?.unwrap_or_default();
        Ok(RunLog {
            entries: active.entries,
        }
        .after(after))
    }

    /// Read the sealed log, entries with `id > after`, or `None` if the
    /// run was never flushed.
    pub fn read_finished(&self, run: &RunId, after: u64) -> Result<Option<RunLog>, LogError> {
        let key = keys::finished_key(run);
        match self.store.get(&key)? {
            None => Ok(None),
            Some(bytes) => {
                let log = decompress_run_log(run, &bytes)?;
                Ok(Some(log.after(after)))
            }
        }
    }

    /// Seal the active log into its finished form. Idempotent: calling
    /// this twice (or on a run with no active log left) is a no-op.
    pub fn flush(&self, run: &RunId) -> Result<(), LogError> {
        let active_key = keys::active_key(run);
        let Some(bytes) = self.store.get(&active_key)? else {
            return Ok(());
        };
        let active: ActiveLog = serde_json::from_slice(&bytes).map_err(|source| {
            jobctl_store::StoreError::Serde {
                key: active_key.clone(),
                source,
            }
        })?;
        let log = RunLog {
            entries: active.entries,
        };
        let json = serde_json::to_vec(&log).map_err(|source| jobctl_store::StoreError::Serde {
            key: active_key.clone(),
            source,
        })?;
        let compressed =
            zstd::encode_all(json.as_slice(), self.zstd_level).map_err(|source| {
                LogError::Compression {
                    run: run.to_string(),
                    source,
                }
            })?;
        self.store.put(&keys::finished_key(run), &compressed)?;
        self.store.delete(&active_key)?;
        tracing::debug!(run = %run, "flushed log");
        Ok(())
    }

    /// Persist a test report for `run`.
    pub fn write_test_report(&self, run: &RunId, report: &TestReport) -> Result<(), LogError> {
        self.store.put_json(&keys::report_key(run), report)?;
        Ok(())
    }

    /// Read the test report for `run`, if one has been written.
    pub fn read_test_report(&self, run: &RunId) -> Result<Option<TestReport>, LogError> {
        Ok(self.store.get_json(&keys::report_key(run))?)
    }

    /// Bulk-delete logs and reports for a run or an entire application.
    pub fn delete(&self, target: DeleteTarget) -> Result<(), LogError> {
        match target {
            DeleteTarget::Run(run) => {
                self.store.delete(&keys::active_key(&run))?;
                self.store.delete(&keys::finished_key(&run))?;
                self.store.delete(&keys::report_key(&run))?;
            }
            DeleteTarget::Type(app, job_type) => {
                let prefix = keys::logs_type_prefix(&app, &job_type);
                for number in self.store.list(&prefix)? {
                    self.store.delete(&format!("{prefix}/{number}/active"))?;
                    self.store.delete(&format!("{prefix}/{number}/finished"))?;
                }
                let reports_prefix = keys::reports_type_prefix(&app, &job_type);
                for number in self.store.list(&reports_prefix)? {
                    self.store.delete(&format!("{reports_prefix}/{number}"))?;
                }
            }
            DeleteTarget::Application(app) => {
                for job_type in self.store.list(&keys::logs_app_prefix(&app))? {
                    let job_type = job_type.into();
                    let prefix = keys::logs_type_prefix(&app, &job_type);
                    for number in self.store.list(&prefix)? {
                        self.store.delete(&format!("{prefix}/{number}/active"))?;
                        self.store.delete(&format!("{prefix}/{number}/finished"))?;
                    }
                }
                for job_type in self.store.list(&keys::reports_app_prefix(&app))? {
                    let job_type = job_type.into();
                    let prefix = keys::reports_type_prefix(&app, &job_type);
                    for number in self.store.list(&prefix)? {
                        self.store.delete(&format!("{prefix}/{number}"))?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn decompress_run_log(run: &RunId, bytes: &[u8]) -> Result<RunLog, LogError> {
    let mut decoder = zstd::stream::read::Decoder::new(bytes).map_err(|source| {
        LogError::Compression {
            run: run.to_string(),
            source,
        }
    })?;
    let mut json = Vec::new();
    decoder
        .read_to_end(&mut json)
        .map_err(|source| LogError::Compression {
            run: run.to_string(),
            source,
        })?;
    serde_json::from_slice(&json)
        .map_err(|source| jobctl_store::StoreError::Serde {
            key: keys::finished_key(run),
            source,
        })
        .map_err(LogError::from)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
