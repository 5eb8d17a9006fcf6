// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The drafting state machine.
//!
//! [`DraftingEngine::apply`] is a pure transition from one session snapshot
//! to the next. The input session is never touched; on a recoverable
//! extractor failure the returned session is an exact copy of the input.

use denuncia_core::types::{
    ConversationTurn, DraftingEvent, DraftingSession, LocationContext, SessionStatus,
    StructuredDraft,
};
use denuncia_core::{DenunciaError, ExtractionError};
use tracing::{debug, info, warn};

use crate::evidence;
use crate::extractor::FactExtractor;
use crate::tracker;

/// Reply shown when the analysis provider could not be reached.
pub const APOLOGY_REPLY: &str =
    "Tuve un problema conectando con el servidor legal. Por favor intenta de nuevo.";

/// Appended once, when the session becomes ready for review.
pub const REPORT_READY_NOTICE: &str =
    "Tu denuncia ya cuenta con todos los elementos necesarios y está lista para revisión.";

/// Outcome of applying one event.
#[derive(Debug, Clone)]
pub struct Transition {
    /// The next session state. Persist it to commit the event.
    pub session: DraftingSession,
    /// Text to show the citizen.
    pub reply: String,
    /// Extractor failure that was absorbed into [`APOLOGY_REPLY`].
    pub recoverable: Option<ExtractionError>,
    pub extractor_called: bool,
}

/// Applies drafting events to session snapshots.
#[derive(Clone)]
pub struct DraftingEngine {
    extractor: FactExtractor,
}

impl DraftingEngine {
    pub fn new(extractor: FactExtractor) -> Self {
        Self { extractor }
    }

    pub fn extractor(&self) -> &FactExtractor {
        &self.extractor
    }

    /// Computes the transition for `event` without mutating `session`.
    ///
    /// Malformed events are rejected with [`DenunciaError::Validation`].
    /// Provider configuration failures are returned unmasked; every other
    /// extractor failure yields an unchanged session and [`APOLOGY_REPLY`].
    pub async fn apply(
        &self,
        session: &DraftingSession,
        event: DraftingEvent,
    ) -> Result<Transition, DenunciaError> {
        debug!(session_id = %session.id, event = event.kind(), "applying event");

        match event {
            DraftingEvent::TextTurn { text } => self.apply_text(session, text).await,
            DraftingEvent::Location { lat, lng, address } => {
                apply_location(session, lat, lng, address)
            }
            DraftingEvent::Evidence {
                bytes,
                source_uri,
                mime_type,
            } => apply_evidence(session, &bytes, &source_uri, &mime_type),
        }
    }

    async fn apply_text(
        &self,
        session: &DraftingSession,
        text: String,
    ) -> Result<Transition, DenunciaError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DenunciaError::Validation(
                "message text must not be empty".to_string(),
            ));
        }

        let mut next = session.clone();
        next.history.push(ConversationTurn::user(text));

        let result = match self
            .extractor
            .extract(&next.history, next.location.as_ref())
            .await
        {
            Ok(result) => result,
            Err(err) if err.is_configuration() => {
                return Err(DenunciaError::Extraction(err));
            }
            Err(err) => {
                warn!(session_id = %session.id, error = %err, "extraction failed, session left unchanged");
                return Ok(Transition {
                    session: session.clone(),
                    reply: APOLOGY_REPLY.to_string(),
                    recoverable: Some(err),
                    extractor_called: true,
                });
            }
        };

        let mut draft = StructuredDraft {
            narrative: result.draft_narrative,
            competency: result.competency,
            legal_basis: result.legal_basis,
            missing_facts: result.missing_elements.into_iter().collect(),
        };
        draft.missing_facts = tracker::compute_missing(&draft, &next.evidence);
        next.draft = draft;

        next.history
            .push(ConversationTurn::assistant(result.message.as_str()));
        let mut reply = result.message;

        if result.report_ready
            && next.draft.missing_facts.is_empty()
            && next.status == SessionStatus::Collecting
        {
            next.status = SessionStatus::ReportReady;
            next.history.push(ConversationTurn::assistant(REPORT_READY_NOTICE));
            reply = if reply.trim().is_empty() {
                REPORT_READY_NOTICE.to_string()
            } else {
                format!("{reply}\n\n{REPORT_READY_NOTICE}")
            };
            info!(session_id = %next.id, competency = %next.draft.competency, "complaint ready for review");
        }

        next.touch();
        Ok(Transition {
            session: next,
            reply,
            recoverable: None,
            extractor_called: true,
        })
    }
}

fn apply_location(
    session: &DraftingSession,
    lat: f64,
    lng: f64,
    address: Option<String>,
) -> Result<Transition, DenunciaError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(DenunciaError::Validation(format!(
            "latitude {lat} is outside [-90, 90]"
        )));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(DenunciaError::Validation(format!(
            "longitude {lng} is outside [-180, 180]"
        )));
    }

    let location = LocationContext {
        lat,
        lng,
        address: address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty()),
    };

    let mut next = session.clone();
    next.history.push(ConversationTurn::user(format!(
        "[Contexto del sistema: el ciudadano compartió su ubicación: {location}]"
    )));
    let reply = format!("Ubicación registrada: {location}. La incluiré en tu denuncia.");
    next.location = Some(location);
    next.touch();

    Ok(Transition {
        session: next,
        reply,
        recoverable: None,
        extractor_called: false,
    })
}

fn apply_evidence(
    session: &DraftingSession,
    bytes: &[u8],
    source_uri: &str,
    mime_type: &str,
) -> Result<Transition, DenunciaError> {
    if bytes.is_empty() {
        return Err(DenunciaError::Validation(
            "evidence must not be empty".to_string(),
        ));
    }

    let record = evidence::record(bytes, source_uri, mime_type);
    info!(
        session_id = %session.id,
        hash = %record.content_hash,
        size = record.size_bytes,
        mime_type = %record.mime_type,
        "evidence secured"
    );

    let mut next = session.clone();
    next.history.push(ConversationTurn::user(format!(
        "[Contexto del sistema: el ciudadano adjuntó evidencia ({}, {} bytes) con hash SHA-256 {}]",
        record.mime_type, record.size_bytes, record.content_hash
    )));
    let reply = format!(
        "Imagen recibida y asegurada. 🛡️ Hash SHA-256: {}",
        record.content_hash
    );
    next.evidence.push(record);
    next.touch();

    Ok(Transition {
        session: next,
        reply,
        recoverable: None,
        extractor_called: false,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use denuncia_core::types::{Competency, FactCategory, Role};
    use denuncia_resilience::RetryPolicy;
    use denuncia_test_utils::{MockProvider, extraction_json};

    use super::*;

    fn engine_with(provider: Arc<MockProvider>) -> DraftingEngine {
        let retry = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_secs(5));
        DraftingEngine::new(FactExtractor::new(provider, retry))
    }

    fn text(t: &str) -> DraftingEvent {
        DraftingEvent::TextTurn {
            text: t.to_string(),
        }
    }

    fn network_error() -> ExtractionError {
        ExtractionError::Network {
            status: Some(503),
            message: "unavailable".into(),
        }
    }

    const LONG_NARRATIVE: &str =
        "El que suscribe hace constar que se observó un derrame de sustancias químicas.";

    #[tokio::test]
    async fn text_turn_updates_draft_and_transcript() {
        let provider = Arc::new(MockProvider::new());
        provider
            .push_analysis(extraction_json(
                "¿Cuándo ocurrió?",
                LONG_NARRATIVE,
                "FEDERAL",
                "Art. 190 LGEEPA",
                &["Time", "Place", "Responsibility"],
                false,
            ))
            .await;
        let engine = engine_with(provider);
        let session = DraftingSession::new("web:1", "web");

        let t = engine.apply(&session, text("Hay un derrame")).await.unwrap();

        assert!(t.extractor_called);
        assert!(t.recoverable.is_none());
        assert_eq!(t.reply, "¿Cuándo ocurrió?");
        assert_eq!(t.session.history.len(), 2);
        assert_eq!(t.session.history[0].role, Role::User);
        assert_eq!(t.session.history[1].text, "¿Cuándo ocurrió?");
        assert_eq!(t.session.draft.narrative, LONG_NARRATIVE);
        assert_eq!(t.session.draft.competency, Competency::Federal);
        assert_eq!(t.session.draft.missing_facts.len(), 3);
        assert!(!t.session.draft.missing_facts.contains(&FactCategory::Mode));
        assert_eq!(t.session.status, SessionStatus::Collecting);
        // Input untouched.
        assert!(session.history.is_empty());
    }

    #[tokio::test]
    async fn network_failure_leaves_session_identical() {
        let provider = Arc::new(MockProvider::new());
        for _ in 0..3 {
            provider.push_analysis_error(network_error()).await;
        }
        let engine = engine_with(provider.clone());
        let session = DraftingSession::new("web:1", "web");

        let t = engine.apply(&session, text("Hay un derrame")).await.unwrap();

        assert_eq!(t.session, session);
        assert_eq!(t.reply, APOLOGY_REPLY);
        assert!(matches!(t.recoverable, Some(ExtractionError::Network { .. })));
        assert_eq!(provider.analysis_calls().await, 3);
    }

    #[tokio::test]
    async fn schema_violation_is_recoverable() {
        let provider = Arc::new(MockProvider::new());
        provider.push_analysis("definitely not json").await;
        let engine = engine_with(provider);
        let session = DraftingSession::new("web:1", "web");

        let t = engine.apply(&session, text("hola")).await.unwrap();
        assert_eq!(t.session, session);
        assert!(matches!(
            t.recoverable,
            Some(ExtractionError::SchemaViolation(_))
        ));
    }

    #[tokio::test]
    async fn configuration_failure_is_unmasked() {
        let provider = Arc::new(MockProvider::new());
        provider
            .push_analysis_error(ExtractionError::Configuration(
                "API_KEY_HTTP_REFERRER_BLOCKED".into(),
            ))
            .await;
        let engine = engine_with(provider);
        let session = DraftingSession::new("web:1", "web");

        let err = engine.apply(&session, text("hola")).await.unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        let engine = DraftingEngine::new(FactExtractor::demo());
        let session = DraftingSession::new("web:1", "web");
        let err = engine.apply(&session, text("   ")).await.unwrap_err();
        assert!(matches!(err, DenunciaError::Validation(_)));
    }

    #[tokio::test]
    async fn readiness_requires_empty_missing_set() {
        let provider = Arc::new(MockProvider::new());
        // Signals ready but still reports a missing element.
        provider
            .push_analysis(extraction_json(
                "Listo",
                LONG_NARRATIVE,
                "FEDERAL",
                "Art. 190",
                &["Time"],
                true,
            ))
            .await;
        let engine = engine_with(provider);
        let session = DraftingSession::new("web:1", "web");

        let t = engine.apply(&session, text("eso es todo")).await.unwrap();
        assert_eq!(t.session.status, SessionStatus::Collecting);
    }

    #[tokio::test]
    async fn readiness_requires_substantial_narrative() {
        let provider = Arc::new(MockProvider::new());
        provider
            .push_analysis(extraction_json("Listo", "Basura.", "MUNICIPAL", "x", &[], true))
            .await;
        let engine = engine_with(provider);
        let session = DraftingSession::new("web:1", "web");

        let t = engine.apply(&session, text("basura")).await.unwrap();
        assert_eq!(t.session.status, SessionStatus::Collecting);
        assert_eq!(t.session.draft.missing_facts.len(), 4);
    }

    #[tokio::test]
    async fn report_ready_is_terminal() {
        let provider = Arc::new(MockProvider::new());
        provider
            .push_analysis(extraction_json(
                "Gracias",
                LONG_NARRATIVE,
                "FEDERAL",
                "Art. 190",
                &[],
                true,
            ))
            .await;
        provider
            .push_analysis(extraction_json(
                "Anotado",
                LONG_NARRATIVE,
                "FEDERAL",
                "Art. 190",
                &["Time"],
                false,
            ))
            .await;
        let engine = engine_with(provider);
        let session = DraftingSession::new("web:1", "web");

        let ready = engine.apply(&session, text("todo dicho")).await.unwrap();
        assert_eq!(ready.session.status, SessionStatus::ReportReady);
        assert!(ready.reply.ends_with(REPORT_READY_NOTICE));
        assert_eq!(
            ready.session.history.last().unwrap().text,
            REPORT_READY_NOTICE
        );

        let later = engine
            .apply(&ready.session, text("una cosa más"))
            .await
            .unwrap();
        assert_eq!(later.session.status, SessionStatus::ReportReady);
        assert_eq!(later.reply, "Anotado");
        assert!(
            later
                .session
                .draft
                .missing_facts
                .contains(&FactCategory::Time)
        );
    }

    #[tokio::test]
    async fn location_is_batched_without_extractor_call() {
        let provider = Arc::new(MockProvider::new());
        let engine = engine_with(provider.clone());
        let session = DraftingSession::new("web:1", "web");

        let t = engine
            .apply(
                &session,
                DraftingEvent::Location {
                    lat: 19.4326,
                    lng: -99.1332,
                    address: Some("  Zócalo, CDMX ".into()),
                },
            )
            .await
            .unwrap();

        assert!(!t.extractor_called);
        assert_eq!(provider.analysis_calls().await, 0);
        let loc = t.session.location.as_ref().unwrap();
        assert_eq!(loc.address.as_deref(), Some("Zócalo, CDMX"));
        assert_eq!(t.session.history.len(), 1);
        assert_eq!(t.session.history[0].role, Role::User);
        assert!(
            t.session.history[0]
                .text
                .starts_with("[Contexto del sistema: el ciudadano compartió su ubicación")
        );
        assert!(t.reply.contains("(19.4326, -99.1332)"));
    }

    #[tokio::test]
    async fn location_then_text_reaches_provider_as_one_user_turn() {
        let provider = Arc::new(MockProvider::new());
        provider
            .push_analysis(extraction_json(
                "¿Cuándo?",
                LONG_NARRATIVE,
                "MUNICIPAL",
                "b",
                &["Time"],
                false,
            ))
            .await;
        let engine = engine_with(provider.clone());
        let located = engine
            .apply(
                &DraftingSession::new("web:1", "web"),
                DraftingEvent::Location {
                    lat: 19.4326,
                    lng: -99.1332,
                    address: None,
                },
            )
            .await
            .unwrap()
            .session;

        engine.apply(&located, text("Tiran basura al río")).await.unwrap();

        let request = provider.last_analysis_request().await.unwrap();
        assert_eq!(request.turns.len(), 1);
        assert_eq!(request.turns[0].role, "user");
        let merged = &request.turns[0].text;
        assert!(
            merged.starts_with("[Contexto del sistema: el ciudadano compartió su ubicación")
        );
        assert!(merged.contains("]\nTiran basura al río"));
        assert!(merged.ends_with("(19.4326, -99.1332)]"));
    }

    #[tokio::test]
    async fn location_out_of_range_is_rejected() {
        let engine = DraftingEngine::new(FactExtractor::demo());
        let session = DraftingSession::new("web:1", "web");

        for (lat, lng) in [(91.0, 0.0), (0.0, -180.5), (f64::NAN, 0.0), (0.0, f64::INFINITY)] {
            let err = engine
                .apply(
                    &session,
                    DraftingEvent::Location {
                        lat,
                        lng,
                        address: None,
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, DenunciaError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn evidence_is_hashed_and_recorded() {
        let provider = Arc::new(MockProvider::new());
        let engine = engine_with(provider.clone());
        let session = DraftingSession::new("whatsapp:+5215512345678", "whatsapp");
        let event = DraftingEvent::Evidence {
            bytes: b"fake-image-data".to_vec(),
            source_uri: "https://api.twilio.com/media/ME1".into(),
            mime_type: "image/jpeg".into(),
        };

        let t = engine.apply(&session, event.clone()).await.unwrap();
        let hash = "28d81db19370f98fdc1d3e43fb1ef83a7cee62f3be86fed923d5f734da41319c";
        assert_eq!(t.session.evidence.len(), 1);
        assert_eq!(t.session.evidence[0].content_hash, hash);
        assert_eq!(
            t.reply,
            format!("Imagen recibida y asegurada. 🛡️ Hash SHA-256: {hash}")
        );
        assert!(t.session.history[0].text.contains(hash));
        assert_eq!(provider.analysis_calls().await, 0);

        // Identical bytes still produce a separate record.
        let again = engine.apply(&t.session, event).await.unwrap();
        assert_eq!(again.session.evidence.len(), 2);
        assert_eq!(again.session.evidence[1].content_hash, hash);
    }

    #[tokio::test]
    async fn empty_evidence_is_rejected() {
        let engine = DraftingEngine::new(FactExtractor::demo());
        let session = DraftingSession::new("web:1", "web");
        let err = engine
            .apply(
                &session,
                DraftingEvent::Evidence {
                    bytes: Vec::new(),
                    source_uri: "upload".into(),
                    mime_type: "image/png".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DenunciaError::Validation(_)));
    }

    #[tokio::test]
    async fn demo_mode_drafts_from_last_turn() {
        let engine = DraftingEngine::new(FactExtractor::demo());
        let session = DraftingSession::new("shell:1", "shell");

        let t = engine
            .apply(
                &session,
                text("Una fábrica vierte desechos al río todas las noches"),
            )
            .await
            .unwrap();
        assert_eq!(t.reply, crate::extractor::DEMO_MESSAGE);
        assert_eq!(t.session.draft.competency, Competency::Municipal);
        assert!(t.session.draft.missing_facts.is_empty());
        assert_eq!(t.session.status, SessionStatus::Collecting);
    }
}
