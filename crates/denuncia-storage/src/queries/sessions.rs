// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drafting session persistence.

use denuncia_core::{DenunciaError, DraftingSession};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::SessionRow;

const SELECT_COLUMNS: &str = "SELECT id, channel, status, history, draft, evidence, location,
        created_at, updated_at
 FROM drafting_sessions";

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRow> {
    Ok(SessionRow {
        id: row.get(0)?,
        channel: row.get(1)?,
        status: row.get(2)?,
        history: row.get(3)?,
        draft: row.get(4)?,
        evidence: row.get(5)?,
        location: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Insert or fully replace a session in one statement.
pub async fn upsert_session(db: &Database, session: &DraftingSession) -> Result<(), DenunciaError> {
    let row = SessionRow::from_session(session)?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO drafting_sessions
                    (id, channel, status, history, draft, evidence, location, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                    channel = excluded.channel,
                    status = excluded.status,
                    history = excluded.history,
                    draft = excluded.draft,
                    evidence = excluded.evidence,
                    location = excluded.location,
                    updated_at = excluded.updated_at",
                params![
                    row.id,
                    row.channel,
                    row.status,
                    row.history,
                    row.draft,
                    row.evidence,
                    row.location,
                    row.created_at,
                    row.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a session by key.
pub async fn get_session(db: &Database, id: &str) -> Result<Option<DraftingSession>, DenunciaError> {
    let id = id.to_string();
    let row = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
            match stmt.query_row(params![id], read_row) {
                Ok(row) => Ok(Some(row)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;
    row.map(SessionRow::into_session).transpose()
}

/// Most recently updated sessions first.
pub async fn list_sessions(db: &Database, limit: usize) -> Result<Vec<DraftingSession>, DenunciaError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} ORDER BY updated_at DESC, id ASC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], read_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;
    rows.into_iter().map(SessionRow::into_session).collect()
}

/// Delete a session. Returns whether a row was removed.
pub async fn delete_session(db: &Database, id: &str) -> Result<bool, DenunciaError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute("DELETE FROM drafting_sessions WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}
