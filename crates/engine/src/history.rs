// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retention policy and eviction for historic runs: free functions over
//! a [`HistoryMap`] so the policy is independently unit-testable without
//! a [`crate::JobController`] in the loop.

use jobctl_core::run::HistoryMap;
use jobctl_core::{Run, RunId, RunStatus};
use std::collections::HashSet;
use std::time::Duration;

/// Evict every entry from `history` that is neither (a) one of the two
/// protected entries nor (b) within the `history_length` most recent
/// entries with an age under `max_age`. The protected entries are exempt
/// from both the length and the age bound, which is why a retained set
/// can exceed `history_length` by one.
///
/// Returns the ids of every run removed, so the caller can also delete
/// their logs.
pub fn evict(
    history: &mut HistoryMap,
    history_length: usize,
    max_age: Duration,
    now_epoch_ms: u64,
) -> Vec<RunId> {
    let protected = protected_numbers(history);

    let mut numbers: Vec<u64> = history.keys().copied().collect();
    numbers.sort_unstable();
    let recent: HashSet<u64> = numbers.iter().rev().take(history_length).copied().collect();

    let to_remove: Vec<u64> = numbers
        .into_iter()
        .filter(|number| {
            if protected.contains(number) {
                return false;
            }
            let run = &history[number];
            !(recent.contains(number) && !is_older_than(run, max_age, now_epoch_ms))
        })
        .collect();

    to_remove
        .into_iter()
        .filter_map(|number| history.remove(&number))
        .map(|run| run.id)
        .collect()
}

/// The run numbers exempt from eviction: the single latest success, and
/// the first failing run after it, even past `maxHistoryAge`.
fn protected_numbers(history: &HistoryMap) -> HashSet<u64> {
    let mut protected = HashSet::new();
    let Some(latest_success) = history
        .values()
        .filter(|run| run.status == RunStatus::Success)
        .map(|run| run.id.number)
        .max()
    else {
        return protected;
    };
    protected.insert(latest_success);

    let first_failure_after = history
        .values()
        .filter(|run| run.status != RunStatus::Success && run.id.number > latest_success)
        .map(|run| run.id.number)
        .min();
    if let Some(number) = first_failure_after {
        protected.insert(number);
    }
    protected
}

fn is_older_than(run: &Run, max_age: Duration, now_epoch_ms: u64) -> bool {
    match run.end {
        Some(end) => now_epoch_ms.saturating_sub(end) > max_age.as_millis() as u64,
        None => false,
    }
}

/// The minimum application build number still referenced by any retained
/// run, historic or active: the artifact-store prune callback's floor.
pub fn min_retained_build(history: &HistoryMap, active: Option<&Run>) -> u64 {
    history
        .values()
        .map(|run| run.versions.target_application.build)
        .chain(active.map(|run| run.versions.target_application.build))
        .min()
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
