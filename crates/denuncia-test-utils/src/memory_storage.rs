// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage adapter.
//!
//! Mirrors the SQLite queue semantics closely enough for service and worker
//! tests: dequeue claims the oldest pending entry, `fail` re-queues until
//! `max_attempts` is reached.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use denuncia_core::DenunciaError;
use denuncia_core::traits::{PluginAdapter, StorageAdapter};
use denuncia_core::types::{AdapterType, DraftingSession, HealthStatus, QueueEntry};

const MAX_ATTEMPTS: i32 = 3;

#[derive(Default)]
struct State {
    sessions: HashMap<String, DraftingSession>,
    queue: Vec<QueueEntry>,
    next_id: i64,
    saves: usize,
    fail_saves: bool,
}

/// Storage backed by a mutex-protected map.
#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save_session` calls.
    pub async fn save_count(&self) -> usize {
        self.state.lock().await.saves
    }

    /// Make every subsequent `save_session` fail.
    pub async fn fail_saves(&self, fail: bool) {
        self.state.lock().await.fail_saves = fail;
    }

    /// Snapshot of every queue entry regardless of status.
    pub async fn queue_entries(&self) -> Vec<QueueEntry> {
        self.state.lock().await.queue.clone()
    }
}

#[async_trait]
impl PluginAdapter for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, DenunciaError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DenunciaError> {
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn initialize(&self) -> Result<(), DenunciaError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), DenunciaError> {
        Ok(())
    }

    async fn get_session(&self, id: &str) -> Result<Option<DraftingSession>, DenunciaError> {
        Ok(self.state.lock().await.sessions.get(id).cloned())
    }

    async fn save_session(&self, session: &DraftingSession) -> Result<(), DenunciaError> {
        let mut state = self.state.lock().await;
        if state.fail_saves {
            return Err(DenunciaError::Storage {
                source: "simulated write failure".into(),
            });
        }
        state.sessions.insert(session.id.clone(), session.clone());
        state.saves += 1;
        Ok(())
    }

    async fn list_sessions(&self, limit: usize) -> Result<Vec<DraftingSession>, DenunciaError> {
        let state = self.state.lock().await;
        let mut sessions: Vec<DraftingSession> = state.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions.truncate(limit);
        Ok(sessions)
    }

    async fn delete_session(&self, id: &str) -> Result<bool, DenunciaError> {
        Ok(self.state.lock().await.sessions.remove(id).is_some())
    }

    async fn enqueue(&self, queue_name: &str, payload: &str) -> Result<i64, DenunciaError> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let id = state.next_id;
        let now = chrono::Utc::now().to_rfc3339();
        state.queue.push(QueueEntry {
            id,
            queue_name: queue_name.to_string(),
            payload: payload.to_string(),
            status: "pending".to_string(),
            attempts: 0,
            max_attempts: MAX_ATTEMPTS,
            created_at: now.clone(),
            updated_at: now,
            locked_until: None,
        });
        Ok(id)
    }

    async fn dequeue(&self, queue_name: &str) -> Result<Option<QueueEntry>, DenunciaError> {
        let mut state = self.state.lock().await;
        let entry = state
            .queue
            .iter_mut()
            .find(|e| e.queue_name == queue_name && e.status == "pending");
        Ok(entry.map(|e| {
            e.status = "processing".to_string();
            e.clone()
        }))
    }

    async fn ack(&self, id: i64) -> Result<(), DenunciaError> {
        let mut state = self.state.lock().await;
        if let Some(e) = state.queue.iter_mut().find(|e| e.id == id) {
            e.status = "completed".to_string();
        }
        Ok(())
    }

    async fn fail(&self, id: i64) -> Result<(), DenunciaError> {
        let mut state = self.state.lock().await;
        if let Some(e) = state.queue.iter_mut().find(|e| e.id == id) {
            e.attempts += 1;
            e.status = if e.attempts >= e.max_attempts {
                "failed".to_string()
            } else {
                "pending".to_string()
            };
        }
        Ok(())
    }
}
