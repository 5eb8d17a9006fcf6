// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use denuncia_config::model::StorageConfig;
use denuncia_core::types::{DraftingSession, QueueEntry};
use denuncia_core::{AdapterType, DenunciaError, HealthStatus, PluginAdapter, StorageAdapter};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened on [`StorageAdapter::initialize`]; every other
/// operation fails with a storage error until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, DenunciaError> {
        self.db.get().ok_or_else(|| DenunciaError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(&self) -> Result<(), DenunciaError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(map_tr_err)?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, DenunciaError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DenunciaError> {
        self.checkpoint().await
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), DenunciaError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| DenunciaError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), DenunciaError> {
        self.db()?;
        self.checkpoint().await
    }

    async fn get_session(&self, id: &str) -> Result<Option<DraftingSession>, DenunciaError> {
        queries::sessions::get_session(self.db()?, id).await
    }

    async fn save_session(&self, session: &DraftingSession) -> Result<(), DenunciaError> {
        queries::sessions::upsert_session(self.db()?, session).await
    }

    async fn list_sessions(&self, limit: usize) -> Result<Vec<DraftingSession>, DenunciaError> {
        queries::sessions::list_sessions(self.db()?, limit).await
    }

    async fn delete_session(&self, id: &str) -> Result<bool, DenunciaError> {
        queries::sessions::delete_session(self.db()?, id).await
    }

    async fn enqueue(&self, queue_name: &str, payload: &str) -> Result<i64, DenunciaError> {
        queries::queue::enqueue(self.db()?, queue_name, payload).await
    }

    async fn dequeue(&self, queue_name: &str) -> Result<Option<QueueEntry>, DenunciaError> {
        queries::queue::dequeue(self.db()?, queue_name).await
    }

    async fn ack(&self, id: i64) -> Result<(), DenunciaError> {
        queries::queue::ack(self.db()?, id).await
    }

    async fn fail(&self, id: i64) -> Result<(), DenunciaError> {
        queries::queue::fail(self.db()?, id).await
    }
}
