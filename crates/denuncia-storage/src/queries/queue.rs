// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable inbound queue backing the WhatsApp worker.
//!
//! Lifecycle: `pending` → `processing` → `completed` or `failed`. A claim holds
//! a lease; once the lease lapses the entry becomes claimable again, so a
//! worker dying mid-turn does not lose the citizen's message.

use denuncia_core::DenunciaError;
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};
use crate::models::QueueEntry;

/// Lease granted to a claimed entry, as an SQLite date modifier.
const LEASE: &str = "+5 minutes";

const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<QueueEntry> {
    Ok(QueueEntry {
        id: row.get("id")?,
        queue_name: row.get("queue_name")?,
        payload: row.get("payload")?,
        status: row.get("status")?,
        attempts: row.get("attempts")?,
        max_attempts: row.get("max_attempts")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        locked_until: row.get("locked_until")?,
    })
}

/// Appends `payload` to `queue_name` and returns the new entry id.
pub async fn enqueue(db: &Database, queue_name: &str, payload: &str) -> Result<i64, DenunciaError> {
    let (queue_name, payload) = (queue_name.to_owned(), payload.to_owned());
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.execute(
                "INSERT INTO queue (queue_name, payload) VALUES (?1, ?2)",
                params![queue_name, payload],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Claims the oldest claimable entry in `queue_name`, if any.
///
/// The selection and the lease are a single statement, so two workers never
/// receive the same entry.
pub async fn dequeue(db: &Database, queue_name: &str) -> Result<Option<QueueEntry>, DenunciaError> {
    let queue_name = queue_name.to_owned();
    let sql = format!(
        "UPDATE queue
            SET status = 'processing',
                locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?2),
                updated_at = {NOW}
          WHERE id = (
                SELECT id FROM queue
                 WHERE queue_name = ?1
                   AND (status = 'pending'
                        OR (status = 'processing' AND locked_until < {NOW}))
                 ORDER BY id
                 LIMIT 1)
      RETURNING *"
    );
    db.connection()
        .call(move |conn| -> Result<Option<QueueEntry>, rusqlite::Error> {
            conn.query_row(&sql, params![queue_name, LEASE], entry_from_row)
                .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Marks an entry `completed` and releases its lease.
pub async fn ack(db: &Database, id: i64) -> Result<(), DenunciaError> {
    let sql = format!(
        "UPDATE queue SET status = 'completed', locked_until = NULL, updated_at = {NOW}
          WHERE id = ?1"
    );
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(&sql, params![id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Counts a failed attempt.
///
/// The entry returns to `pending` until `max_attempts` is reached, then stays
/// `failed`.
pub async fn fail(db: &Database, id: i64) -> Result<(), DenunciaError> {
    let sql = format!(
        "UPDATE queue
            SET attempts = attempts + 1,
                status = CASE WHEN attempts + 1 >= max_attempts THEN 'failed' ELSE 'pending' END,
                locked_until = NULL,
                updated_at = {NOW}
          WHERE id = ?1"
    );
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(&sql, params![id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INBOX: &str = "whatsapp-incoming";

    async fn open() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    async fn state(db: &Database, id: i64) -> (String, i32) {
        db.connection()
            .call(move |conn| -> Result<(String, i32), rusqlite::Error> {
                conn.query_row(
                    "SELECT status, attempts FROM queue WHERE id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn claimed_entry_is_leased_and_hidden() {
        let (db, _dir) = open().await;
        let id = enqueue(&db, INBOX, r#"{"from":"whatsapp:+521"}"#).await.unwrap();

        let claimed = dequeue(&db, INBOX).await.unwrap().unwrap();
        assert_eq!(claimed.id, id);
        assert_eq!(claimed.status, "processing");
        assert_eq!(claimed.payload, r#"{"from":"whatsapp:+521"}"#);
        assert!(claimed.locked_until.is_some());

        assert!(dequeue(&db, INBOX).await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn entries_come_out_in_arrival_order() {
        let (db, _dir) = open().await;
        let first = enqueue(&db, INBOX, "a").await.unwrap();
        let second = enqueue(&db, INBOX, "b").await.unwrap();

        assert_eq!(dequeue(&db, INBOX).await.unwrap().unwrap().id, first);
        assert_eq!(dequeue(&db, INBOX).await.unwrap().unwrap().id, second);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn other_queues_are_not_claimed() {
        let (db, _dir) = open().await;
        enqueue(&db, "outbox", "x").await.unwrap();

        assert!(dequeue(&db, INBOX).await.unwrap().is_none());
        assert!(dequeue(&db, "outbox").await.unwrap().is_some());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn acked_entry_is_completed() {
        let (db, _dir) = open().await;
        let id = enqueue(&db, INBOX, "hola").await.unwrap();
        dequeue(&db, INBOX).await.unwrap().unwrap();

        ack(&db, id).await.unwrap();

        assert_eq!(state(&db, id).await.0, "completed");
        assert!(dequeue(&db, INBOX).await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn failures_requeue_then_give_up() {
        let (db, _dir) = open().await;
        let id = enqueue(&db, INBOX, "hola").await.unwrap();

        dequeue(&db, INBOX).await.unwrap().unwrap();
        fail(&db, id).await.unwrap();
        assert_eq!(state(&db, id).await, ("pending".to_string(), 1));

        for _ in 0..2 {
            dequeue(&db, INBOX).await.unwrap().unwrap();
            fail(&db, id).await.unwrap();
        }
        assert_eq!(state(&db, id).await, ("failed".to_string(), 3));
        assert!(dequeue(&db, INBOX).await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn lapsed_lease_is_claimable_again() {
        let (db, _dir) = open().await;
        let id = enqueue(&db, INBOX, "hola").await.unwrap();
        dequeue(&db, INBOX).await.unwrap().unwrap();
        assert!(dequeue(&db, INBOX).await.unwrap().is_none());

        db.connection()
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "UPDATE queue SET locked_until = '2000-01-01T00:00:00.000Z' WHERE id = ?1",
                    params![id],
                )
            })
            .await
            .unwrap();

        assert_eq!(dequeue(&db, INBOX).await.unwrap().unwrap().id, id);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn parallel_producers_are_all_drained() {
        let (db, _dir) = open().await;
        let producers: Vec<_> = (0..10)
            .map(|n| {
                let db = db.clone();
                tokio::spawn(async move { enqueue(&db, INBOX, &format!(r#"{{"n":{n}}}"#)).await })
            })
            .collect();
        for producer in producers {
            producer.await.unwrap().unwrap();
        }

        let mut drained = 0;
        while let Some(entry) = dequeue(&db, INBOX).await.unwrap() {
            ack(&db, entry.id).await.unwrap();
            drained += 1;
        }
        assert_eq!(drained, 10);
        db.close().await.unwrap();
    }
}
