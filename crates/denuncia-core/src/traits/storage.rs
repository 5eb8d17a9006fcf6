// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::DenunciaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{DraftingSession, QueueEntry};

/// Adapter for storage and persistence backends.
///
/// Stores drafting sessions and the durable inbound work queue.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), DenunciaError>;

    /// Closes the storage backend, flushing pending writes and releasing connections.
    async fn close(&self) -> Result<(), DenunciaError>;

    // --- Sessions ---

    /// Loads a session by key.
    async fn get_session(&self, id: &str) -> Result<Option<DraftingSession>, DenunciaError>;

    /// Inserts or replaces a session as a single write.
    async fn save_session(&self, session: &DraftingSession) -> Result<(), DenunciaError>;

    /// Lists sessions, most recently updated first.
    async fn list_sessions(&self, limit: usize) -> Result<Vec<DraftingSession>, DenunciaError>;

    /// Removes a session. Returns false when it did not exist.
    async fn delete_session(&self, id: &str) -> Result<bool, DenunciaError>;

    // --- Queue ---

    /// Appends a payload to a named queue and returns the entry id.
    async fn enqueue(&self, queue_name: &str, payload: &str) -> Result<i64, DenunciaError>;

    /// Claims the oldest pending entry, locking it for processing.
    async fn dequeue(&self, queue_name: &str) -> Result<Option<QueueEntry>, DenunciaError>;

    /// Marks an entry as completed.
    async fn ack(&self, id: i64) -> Result<(), DenunciaError>;

    /// Records a failed attempt; the entry is retried until its attempts run out.
    async fn fail(&self, id: i64) -> Result<(), DenunciaError>;
}
