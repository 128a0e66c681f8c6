// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single source of truth for timestamps.
//!
//! Every `Instant`/epoch-millisecond value in the controller flows through
//! a [`Clock`] so tests can control time deterministically instead of
//! racing the wall clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Abstracts the passage of time.
///
/// Implementations must be cheap to clone and safe to share across
/// threads; the controller holds one per-process.
pub trait Clock: Clone + Send + Sync {
    /// The current instant, for interval arithmetic (sleeps, deadlines).
    fn instant(&self) -> Instant;

    /// The current wall-clock time as milliseconds since the Unix epoch,
    /// for durable timestamps that must survive a process restart.
    fn epoch_ms(&self) -> u64;
}

/// Production clock backed by the OS.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn instant(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Deterministic clock for tests.
///
/// Starts at a fixed instant and a fixed epoch; advance it explicitly with
/// [`FakeClock::advance`] rather than relying on real elapsed time.
#[derive(Clone)]
pub struct FakeClock {
    origin: Instant,
    offset_ms: Arc<AtomicU64>,
    epoch_origin_ms: u64,
}

impl FakeClock {
    /// Create a fake clock starting at the given epoch milliseconds.
    pub fn new(epoch_origin_ms: u64) -> Self {
        Self {
            origin: Instant::now(),
            offset_ms: Arc::new(AtomicU64::new(0)),
            epoch_origin_ms,
        }
    }

    /// Advance the clock by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        self.offset_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for FakeClock {
    fn instant(&self) -> Instant {
        self.origin + std::time::Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }

    fn epoch_ms(&self) -> u64 {
        self.epoch_origin_ms + self.offset_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
