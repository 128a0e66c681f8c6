// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jobctl-locks: hierarchical advisory locks keyed by (app, type) and
//! (app, type, step).
//!
//! Locks are registered lazily in a map from [`LockKey`] to a shared
//! reentrant mutex, a registry-of-mutexes keyed by entity identity rather
//! than a single global lock.
//!
//! A lock's guard is released when dropped, and the registry entry is
//! pruned once nothing else references it, so the map does not grow
//! unboundedly with the lifetime of the process.
//!
//! Re-entrancy per holder is permitted: the same thread may acquire a lock
//! it already holds without deadlocking, via [`parking_lot::ReentrantMutex`].

use jobctl_core::{ApplicationId, JobType, StepName};
use lock_api::ArcReentrantMutexGuard;
use parking_lot::{RawMutex, RawThreadId, ReentrantMutex};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Identifies one lockable key in the hierarchy.
///
/// `App` is coarser than `Type`: it serializes application-wide operations
/// (`submit`, the instance-creation step of `deploy`) that precede any
/// (app, type) pair existing yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LockKey {
    App(ApplicationId),
    Type(ApplicationId, JobType),
    Step(ApplicationId, JobType, StepName),
}

type RawGuard = ArcReentrantMutexGuard<RawMutex, RawThreadId, ()>;

struct Inner {
    registry: parking_lot::Mutex<HashMap<LockKey, Arc<ReentrantMutex<()>>>>,
}

/// The lock registry. Cheap to clone; all clones share the same
/// underlying map, as the controller expects for a process-wide
/// singleton.
#[derive(Clone)]
pub struct LockService(Arc<Inner>);

impl Default for LockService {
    fn default() -> Self {
        Self::new()
    }
}

impl LockService {
    pub fn new() -> Self {
        Self(Arc::new(Inner {
            registry: parking_lot::Mutex::new(HashMap::new()),
        }))
    }

    fn entry(&self, key: &LockKey) -> Arc<ReentrantMutex<()>> {
        self.0
            .registry
            .lock()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(ReentrantMutex::new(())))
            .clone()
    }

    /// Drop the registry entry for `key` if nothing else references it.
    fn prune(&self, key: &LockKey) {
        let mut registry = self.0.registry.lock();
        if let Some(mutex) = registry.get(key) {
            if Arc::strong_count(mutex) == 1 {
                registry.remove(key);
            }
        }
    }

    /// Acquire `lock(app)`, blocking until available.
    pub fn lock_app(&self, app: &ApplicationId) -> AppLock {
        let key = LockKey::App(app.clone());
        let mutex = self.entry(&key);
        let guard = mutex.lock_arc();
        AppLock {
            service: self.clone(),
            key,
            guard: Some(guard),
        }
    }

    /// Acquire `lock(app, type)`, blocking until available.
    pub fn lock_type(&self, app: &ApplicationId, job_type: &JobType) -> TypeLock {
        let key = LockKey::Type(app.clone(), job_type.clone());
        let mutex = self.entry(&key);
        let guard = mutex.lock_arc();
        TypeLock {
            service: self.clone(),
            key,
            guard: Some(guard),
        }
    }

    /// Acquire `lock(app, type, step)`, blocking until available.
    pub fn lock_step(&self, app: &ApplicationId, job_type: &JobType, step: &StepName) -> StepLock {
        let key = LockKey::Step(app.clone(), job_type.clone(), step.clone());
        let mutex = self.entry(&key);
        let guard = mutex.lock_arc();
        StepLock {
            service: self.clone(),
            app: app.clone(),
            job_type: job_type.clone(),
            step: step.clone(),
            key,
            guard: Some(guard),
        }
    }

    /// Acquire `lock(app, type, step)`, returning `None` if it cannot be
    /// obtained within `timeout`. Used by `finish`, whose prerequisite-step
    /// lock acquisition is bounded rather than indefinite.
    pub fn try_lock_step_for(
        &self,
        app: &ApplicationId,
        job_type: &JobType,
        step: &StepName,
        timeout: Duration,
    ) -> Option<StepLock> {
        let key = LockKey::Step(app.clone(), job_type.clone(), step.clone());
        let mutex = self.entry(&key);
        let guard = mutex.try_lock_arc_for(timeout);
        match guard {
            Some(guard) => Some(StepLock {
                service: self.clone(),
                app: app.clone(),
                job_type: job_type.clone(),
                step: step.clone(),
                key,
                guard: Some(guard),
            }),
            None => {
                self.prune(&key);
                None
            }
        }
    }
}

/// Proof of holding `lock(app)`.
pub struct AppLock {
    service: LockService,
    key: LockKey,
    guard: Option<RawGuard>,
}

impl Drop for AppLock {
    fn drop(&mut self) {
        self.guard.take();
        self.service.prune(&self.key);
    }
}

/// Proof of holding `lock(app, type)`.
pub struct TypeLock {
    service: LockService,
    key: LockKey,
    guard: Option<RawGuard>,
}

impl Drop for TypeLock {
    fn drop(&mut self) {
        self.guard.take();
        self.service.prune(&self.key);
    }
}

/// Proof of holding `lock(app, type, step)` for one specific step.
///
/// A caller that holds one may pass it to `update`- or
/// `setStartTimestamp`-style entry points as evidence it is allowed to
/// mutate that step.
pub struct StepLock {
    service: LockService,
    app: ApplicationId,
    job_type: JobType,
    step: StepName,
    key: LockKey,
    guard: Option<RawGuard>,
}

impl StepLock {
    pub fn application(&self) -> &ApplicationId {
        &self.app
    }

    pub fn job_type(&self) -> &JobType {
        &self.job_type
    }

    pub fn step(&self) -> &StepName {
        &self.step
    }
}

impl Drop for StepLock {
    fn drop(&mut self) {
        self.guard.take();
        self.service.prune(&self.key);
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
