// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jobctl-store: the durable key/value layer the rest of the controller
//! builds its logical layout on top of. No business logic lives here —
//! callers serialize cross-key atomicity via `jobctl-locks`.

mod error;
mod file_store;
mod mem_store;
mod store;

pub use error::StoreError;
pub use file_store::FileStore;
pub use mem_store::MemStore;
pub use store::{Store, StoreExt};
