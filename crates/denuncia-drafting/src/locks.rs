// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session mutual exclusion.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// One async mutex per session key.
///
/// Events for the same key are serialized in acquisition order (tokio's
/// mutex is fair); different keys never contend. Entries live only while
/// some task holds or awaits them.
#[derive(Default)]
pub struct SessionLocks {
    locks: LockMap,
}

/// Exclusive access to one session key.
///
/// Dropping it unlocks the key and forgets the entry when nobody else is
/// waiting, including when the owning future is cancelled.
pub struct SessionGuard<'a> {
    held: Option<OwnedMutexGuard<()>>,
    locks: &'a LockMap,
    key: String,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        // Unlock first so our own Arc no longer counts.
        self.held.take();
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    pub async fn acquire(&self, key: &str) -> SessionGuard<'_> {
        let lock = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let mut guard = SessionGuard {
            held: None,
            locks: &self.locks,
            key: key.to_string(),
        };
        guard.held = Some(lock.lock_owned().await);
        guard
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
