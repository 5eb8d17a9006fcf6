// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row-level representation of persisted drafting sessions.

use std::str::FromStr;

use denuncia_core::{DenunciaError, DraftingSession, SessionStatus};

pub use denuncia_core::QueueEntry;

/// A `drafting_sessions` row with its JSON columns still encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRow {
    pub id: String,
    pub channel: String,
    pub status: String,
    pub history: String,
    pub draft: String,
    pub evidence: String,
    pub location: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

fn encode_err(e: serde_json::Error) -> DenunciaError {
    DenunciaError::Storage {
        source: Box::new(e),
    }
}

impl SessionRow {
    pub fn from_session(session: &DraftingSession) -> Result<Self, DenunciaError> {
        Ok(Self {
            id: session.id.clone(),
            channel: session.channel.clone(),
            status: session.status.to_string(),
            history: serde_json::to_string(&session.history).map_err(encode_err)?,
            draft: serde_json::to_string(&session.draft).map_err(encode_err)?,
            evidence: serde_json::to_string(&session.evidence).map_err(encode_err)?,
            location: session
                .location
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(encode_err)?,
            created_at: session.created_at.clone(),
            updated_at: session.updated_at.clone(),
        })
    }

    pub fn into_session(self) -> Result<DraftingSession, DenunciaError> {
        let status = SessionStatus::from_str(&self.status).map_err(|_| DenunciaError::Storage {
            source: format!("session {} has unknown status '{}'", self.id, self.status).into(),
        })?;
        Ok(DraftingSession {
            history: serde_json::from_str(&self.history).map_err(encode_err)?,
            draft: serde_json::from_str(&self.draft).map_err(encode_err)?,
            evidence: serde_json::from_str(&self.evidence).map_err(encode_err)?,
            location: self
                .location
                .as_deref()
                .map(serde_json::from_str)
                .transpose()
                .map_err(encode_err)?,
            id: self.id,
            channel: self.channel,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use denuncia_core::{ConversationTurn, FactCategory, LocationContext};

    #[test]
    fn row_preserves_every_field() {
        let mut session = DraftingSession::new("web:1", "web");
        session.history.push(ConversationTurn::user("Hay basura en el río"));
        session.draft.narrative = "Basura en el río".into();
        session.draft.missing_facts.remove(&FactCategory::Mode);
        session.location = Some(LocationContext {
            lat: 19.4326,
            lng: -99.1332,
            address: None,
        });
        session.status = SessionStatus::ReportReady;

        let row = SessionRow::from_session(&session).unwrap();
        assert_eq!(row.status, "REPORT_READY");
        assert_eq!(row.into_session().unwrap(), session);
    }

    #[test]
    fn unknown_status_is_a_storage_error() {
        let session = DraftingSession::new("web:2", "web");
        let mut row = SessionRow::from_session(&session).unwrap();
        row.status = "ARCHIVED".into();
        assert!(matches!(
            row.into_session(),
            Err(DenunciaError::Storage { .. })
        ));
    }
}
