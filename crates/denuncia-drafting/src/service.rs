// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session-level orchestration: lock, load, apply, save.
//!
//! Every transport goes through [`DraftingService::handle`], which holds
//! the per-key lock across the whole read-modify-write so that events for
//! one session are applied strictly in arrival order.

use std::sync::Arc;

use denuncia_core::DenunciaError;
use denuncia_core::traits::StorageAdapter;
use denuncia_core::types::{DraftingEvent, DraftingSession};
use tracing::{debug, info, warn};

use crate::engine::DraftingEngine;
use crate::locks::SessionLocks;

/// Result of handling one inbound event.
#[derive(Debug, Clone)]
pub struct Handled {
    /// Session state after the event (persisted when it changed).
    pub session: DraftingSession,
    pub reply: String,
    /// The provider failed and the fallback reply was used.
    pub degraded: bool,
}

/// Serializes events per session and persists each transition.
pub struct DraftingService {
    engine: DraftingEngine,
    storage: Arc<dyn StorageAdapter>,
    locks: SessionLocks,
}

impl DraftingService {
    pub fn new(engine: DraftingEngine, storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            engine,
            storage,
            locks: SessionLocks::new(),
        }
    }

    pub fn engine(&self) -> &DraftingEngine {
        &self.engine
    }

    /// Returns true when the extractor runs without a provider.
    pub fn is_simulated(&self) -> bool {
        self.engine.extractor().is_simulated()
    }

    /// Applies `event` to the session stored under `session_key`.
    ///
    /// A session is created on first contact. The new state is written with
    /// a single save, and only when the transition changed it.
    pub async fn handle(
        &self,
        session_key: &str,
        channel: &str,
        event: DraftingEvent,
    ) -> Result<Handled, DenunciaError> {
        let _guard = self.locks.acquire(session_key).await;
        self.handle_locked(session_key, channel, event, true).await
    }

    /// Like [`handle`](Self::handle), but refuses to create the session.
    ///
    /// The existence check happens under the session lock, so a concurrent
    /// [`reset`](Self::reset) cannot be undone by this event.
    pub async fn handle_existing(
        &self,
        session_key: &str,
        channel: &str,
        event: DraftingEvent,
    ) -> Result<Handled, DenunciaError> {
        let _guard = self.locks.acquire(session_key).await;
        self.handle_locked(session_key, channel, event, false).await
    }

    async fn handle_locked(
        &self,
        session_key: &str,
        channel: &str,
        event: DraftingEvent,
        create: bool,
    ) -> Result<Handled, DenunciaError> {
        let current = match self.storage.get_session(session_key).await? {
            Some(session) => session,
            None if create => {
                debug!(session_id = %session_key, channel, "starting new drafting session");
                DraftingSession::new(session_key, channel)
            }
            None => return Err(DenunciaError::SessionNotFound(session_key.to_string())),
        };

        let transition = self.engine.apply(&current, event).await?;

        if let Some(err) = &transition.recoverable {
            warn!(session_id = %session_key, error = %err, "replying with fallback after extractor failure");
        }

        if transition.session != current {
            self.storage.save_session(&transition.session).await?;
        }

        Ok(Handled {
            degraded: transition.recoverable.is_some(),
            session: transition.session,
            reply: transition.reply,
        })
    }

    /// Creates and stores an empty session, replacing nothing if it exists.
    pub async fn open(
        &self,
        session_key: &str,
        channel: &str,
    ) -> Result<DraftingSession, DenunciaError> {
        let _guard = self.locks.acquire(session_key).await;
        if let Some(existing) = self.storage.get_session(session_key).await? {
            return Ok(existing);
        }
        let session = DraftingSession::new(session_key, channel);
        self.storage.save_session(&session).await?;
        info!(session_id = %session_key, channel, "drafting session opened");
        Ok(session)
    }

    /// Current state of a session, if it exists.
    pub async fn snapshot(
        &self,
        session_key: &str,
    ) -> Result<Option<DraftingSession>, DenunciaError> {
        self.storage.get_session(session_key).await
    }

    /// Discards a session. Returns false when there was nothing to discard.
    pub async fn reset(&self, session_key: &str) -> Result<bool, DenunciaError> {
        let _guard = self.locks.acquire(session_key).await;
        let removed = self.storage.delete_session(session_key).await?;
        if removed {
            info!(session_id = %session_key, "drafting session reset");
        }
        Ok(removed)
    }
}
