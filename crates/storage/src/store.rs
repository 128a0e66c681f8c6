// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The [`Store`] trait: a flat byte-oriented key/value surface every other
//! controller component builds its persisted layout on top of. Keys are
//! `/`-separated paths, e.g. `runs/<tenant>/<app>/<type>/active` or
//! `runs/<tenant>/<app>/<type>/history/<number>`.

use crate::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A durable, flat key/value store.
///
/// Implementations need not provide transactions across keys; callers that
/// need atomicity across multiple keys hold the relevant lock from
/// `jobctl-locks` for the duration of the read-modify-write.
pub trait Store: Send + Sync {
    /// Read the raw bytes at `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write `value` at `key`, replacing any existing value.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Remove the value at `key`. A no-op if absent.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// List the immediate keys under `prefix` (not recursive), without the
    /// prefix itself.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Typed JSON convenience methods layered over any [`Store`].
pub trait StoreExt: Store {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes).map_err(|source| StoreError::Serde {
                    key: key.to_string(),
                    source,
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value).map_err(|source| StoreError::Serde {
            key: key.to_string(),
            source,
        })?;
        self.put(key, &bytes)
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
