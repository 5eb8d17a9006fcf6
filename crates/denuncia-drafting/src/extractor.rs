// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fact extraction over the conversation transcript.
//!
//! Sends the full history (plus the known location) to the analysis
//! provider in JSON-schema mode and validates the answer into an
//! [`ExtractionResult`]. Without a provider the extractor runs in demo
//! mode and returns deterministic, labelled placeholders.

use std::str::FromStr;
use std::sync::Arc;

use denuncia_core::ExtractionError;
use denuncia_core::traits::AnalysisProvider;
use denuncia_core::types::{
    AnalysisRequest, Competency, ConversationTurn, ExtractionResult, ExtractionWarning,
    FactCategory, LocationContext, Role,
};
use denuncia_resilience::RetryPolicy;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::prompt;

/// Reply used in demo mode.
pub const DEMO_MESSAGE: &str = "Modo Demo: Describe los hechos.";

/// Wire shape of a drafting response. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExtraction {
    message: String,
    draft_narrative: String,
    competency: String,
    legal_basis: String,
    #[serde(default)]
    missing_elements: Option<Vec<String>>,
    #[serde(default)]
    report_ready: Option<bool>,
}

/// Turns a transcript into a validated draft update.
#[derive(Clone)]
pub struct FactExtractor {
    provider: Option<Arc<dyn AnalysisProvider>>,
    retry: RetryPolicy,
}

impl FactExtractor {
    pub fn new(provider: Arc<dyn AnalysisProvider>, retry: RetryPolicy) -> Self {
        Self {
            provider: Some(provider),
            retry,
        }
    }

    /// Extractor without a provider; every call is simulated.
    pub fn demo() -> Self {
        Self {
            provider: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Returns true when results are simulated rather than analyzed.
    pub fn is_simulated(&self) -> bool {
        self.provider.is_none()
    }

    /// Extracts structured facts from `history`.
    ///
    /// `history` must be non-empty and end with a user turn. Provider calls
    /// are retried according to the configured policy; schema and
    /// configuration failures are returned on the first occurrence.
    pub async fn extract(
        &self,
        history: &[ConversationTurn],
        location: Option<&LocationContext>,
    ) -> Result<ExtractionResult, ExtractionError> {
        let last = history
            .last()
            .ok_or_else(|| ExtractionError::InvalidInput("history is empty".to_string()))?;
        if last.role != Role::User {
            return Err(ExtractionError::InvalidInput(
                "history must end with a user turn".to_string(),
            ));
        }

        let Some(provider) = &self.provider else {
            debug!("no analysis provider configured, returning demo extraction");
            return Ok(demo_result(&last.text));
        };

        let request = AnalysisRequest {
            system_instruction: Some(prompt::SYSTEM_INSTRUCTION.to_string()),
            turns: prompt::build_turns(history, location),
            response_schema: prompt::response_schema(),
        };

        let response = self
            .retry
            .run("extract", ExtractionError::is_retryable, || {
                provider.analyze(request.clone())
            })
            .await?;

        let result = parse_extraction_response(&response.text)?;
        for warning in &result.warnings {
            warn!(?warning, "extraction response needed coercion");
        }
        debug!(
            competency = %result.competency,
            missing = result.missing_elements.len(),
            report_ready = result.report_ready,
            "extraction complete"
        );
        Ok(result)
    }
}

fn demo_result(last_user_text: &str) -> ExtractionResult {
    ExtractionResult {
        message: DEMO_MESSAGE.to_string(),
        draft_narrative: last_user_text.to_string(),
        competency: Competency::Municipal,
        legal_basis: "N/A".to_string(),
        missing_elements: Vec::new(),
        report_ready: false,
        warnings: Vec::new(),
        simulated: true,
    }
}

/// Validates a raw provider response into an [`ExtractionResult`].
///
/// Markdown code fences around the object are tolerated. Missing or
/// ill-typed required fields are a [`ExtractionError::SchemaViolation`];
/// out-of-range enum values are coerced and reported as warnings.
pub fn parse_extraction_response(text: &str) -> Result<ExtractionResult, ExtractionError> {
    let json_str = strip_to_object(text);

    let raw: RawExtraction = serde_json::from_str(json_str).map_err(|e| {
        debug!(raw = %text, "unparseable extraction response");
        ExtractionError::SchemaViolation(e.to_string())
    })?;

    let mut warnings = Vec::new();

    let competency = match Competency::from_str(raw.competency.trim()) {
        Ok(c) => c,
        Err(_) => {
            warnings.push(ExtractionWarning::UnknownCompetency(raw.competency.clone()));
            Competency::Unknown
        }
    };

    let mut missing_elements = Vec::new();
    for label in raw.missing_elements.unwrap_or_default() {
        match FactCategory::from_label(&label) {
            Some(category) if !missing_elements.contains(&category) => {
                missing_elements.push(category)
            }
            Some(_) => {}
            None => warnings.push(ExtractionWarning::UnknownFactCategory(label)),
        }
    }

    let sentinel = raw.message.contains(prompt::REPORT_READY_SENTINEL);
    let message = if sentinel {
        raw.message
            .replace(prompt::REPORT_READY_SENTINEL, "")
            .trim()
            .to_string()
    } else {
        raw.message
    };

    Ok(ExtractionResult {
        message,
        draft_narrative: raw.draft_narrative,
        competency,
        legal_basis: raw.legal_basis,
        missing_elements,
        report_ready: raw.report_ready.unwrap_or(false) || sentinel,
        warnings,
        simulated: false,
    })
}

fn strip_to_object(text: &str) -> &str {
    let trimmed = text.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use denuncia_test_utils::{MockProvider, extraction_json};

    use super::*;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1), Duration::from_secs(5))
    }

    fn user(text: &str) -> ConversationTurn {
        ConversationTurn::user(text)
    }

    #[test]
    fn parses_well_formed_response() {
        let text = extraction_json(
            "¿Cuándo ocurrió?",
            "Se observó un derrame.",
            "FEDERAL",
            "Art. 190 LGEEPA",
            &["Time", "Responsibility"],
            false,
        );
        let result = parse_extraction_response(&text).unwrap();
        assert_eq!(result.message, "¿Cuándo ocurrió?");
        assert_eq!(result.competency, Competency::Federal);
        assert_eq!(
            result.missing_elements,
            vec![FactCategory::Time, FactCategory::Responsibility]
        );
        assert!(!result.report_ready);
        assert!(result.warnings.is_empty());
        assert!(!result.simulated);
    }

    #[test]
    fn tolerates_markdown_fences() {
        let text = format!(
            "```json\n{}\n```",
            extraction_json("ok", "n", "ESTATAL", "b", &[], false)
        );
        let result = parse_extraction_response(&text).unwrap();
        assert_eq!(result.competency, Competency::Estatal);
    }

    #[test]
    fn not_json_is_schema_violation() {
        let err = parse_extraction_response("Lo siento, no entendí").unwrap_err();
        assert!(matches!(err, ExtractionError::SchemaViolation(_)));
    }

    #[test]
    fn missing_required_field_is_schema_violation() {
        let text = r#"{"message": "hola", "draftNarrative": "x", "competency": "FEDERAL"}"#;
        let err = parse_extraction_response(text).unwrap_err();
        assert!(matches!(err, ExtractionError::SchemaViolation(m) if m.contains("legalBasis")));
    }

    #[test]
    fn ill_typed_field_is_schema_violation() {
        let text = r#"{"message": 42, "draftNarrative": "x", "competency": "FEDERAL", "legalBasis": "y"}"#;
        assert!(matches!(
            parse_extraction_response(text),
            Err(ExtractionError::SchemaViolation(_))
        ));
    }

    #[test]
    fn unknown_competency_is_coerced_with_warning() {
        let text = extraction_json("m", "n", "PROVINCIAL", "b", &[], false);
        let result = parse_extraction_response(&text).unwrap();
        assert_eq!(result.competency, Competency::Unknown);
        assert_eq!(
            result.warnings,
            vec![ExtractionWarning::UnknownCompetency("PROVINCIAL".into())]
        );
    }

    #[test]
    fn unknown_missing_label_is_skipped_with_warning() {
        let text = extraction_json("m", "n", "MUNICIPAL", "b", &["Lugar", "Weather", "Place"], false);
        let result = parse_extraction_response(&text).unwrap();
        assert_eq!(result.missing_elements, vec![FactCategory::Place]);
        assert_eq!(
            result.warnings,
            vec![ExtractionWarning::UnknownFactCategory("Weather".into())]
        );
    }

    #[test]
    fn sentinel_marks_ready_and_is_stripped() {
        let text = extraction_json(
            "Gracias, tu denuncia está completa.\n[REPORT_READY]",
            "n",
            "FEDERAL",
            "b",
            &[],
            false,
        );
        let result = parse_extraction_response(&text).unwrap();
        assert!(result.report_ready);
        assert_eq!(result.message, "Gracias, tu denuncia está completa.");
    }

    #[test]
    fn optional_fields_default() {
        let text = r#"{"message": "m", "draftNarrative": "n", "competency": "UNKNOWN", "legalBasis": ""}"#;
        let result = parse_extraction_response(text).unwrap();
        assert!(result.missing_elements.is_empty());
        assert!(!result.report_ready);
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn empty_history_is_invalid_input() {
        let extractor = FactExtractor::demo();
        let err = extractor.extract(&[], None).await.unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn history_ending_with_assistant_is_invalid_and_not_sent() {
        let provider = Arc::new(MockProvider::new());
        let extractor = FactExtractor::new(provider.clone(), fast_retry());
        let history = vec![user("hola"), ConversationTurn::assistant("¿Qué pasó?")];

        let err = extractor.extract(&history, None).await.unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidInput(_)));
        assert_eq!(provider.analysis_calls().await, 0);
    }

    #[tokio::test]
    async fn demo_mode_echoes_last_user_turn() {
        let extractor = FactExtractor::demo();
        assert!(extractor.is_simulated());

        let history = vec![user("Tiran basura en el río")];
        let result = extractor.extract(&history, None).await.unwrap();
        assert!(result.simulated);
        assert_eq!(result.message, DEMO_MESSAGE);
        assert_eq!(result.draft_narrative, "Tiran basura en el río");
        assert_eq!(result.competency, Competency::Municipal);
        assert_eq!(result.legal_basis, "N/A");
        assert!(result.missing_elements.is_empty());
        assert!(!result.report_ready);
    }

    #[tokio::test]
    async fn sends_instruction_schema_and_location() {
        let provider = Arc::new(MockProvider::new());
        provider
            .push_analysis(extraction_json("m", "n", "FEDERAL", "b", &[], false))
            .await;
        let extractor = FactExtractor::new(provider.clone(), fast_retry());
        let location = LocationContext {
            lat: 19.0,
            lng: -99.0,
            address: None,
        };

        extractor
            .extract(&[user("Hay humo")], Some(&location))
            .await
            .unwrap();

        let request = provider.last_analysis_request().await.unwrap();
        assert!(
            request
                .system_instruction
                .as_deref()
                .unwrap()
                .contains("Denuncia Popular")
        );
        assert_eq!(request.response_schema["required"][0], "message");
        assert_eq!(
            request.turns[0].text,
            "Hay humo\n[System Context: User Location is (19, -99)]"
        );
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let provider = Arc::new(MockProvider::new());
        provider
            .push_analysis_error(ExtractionError::Network {
                status: Some(503),
                message: "busy".into(),
            })
            .await;
        provider
            .push_analysis(extraction_json("m", "n", "FEDERAL", "b", &[], false))
            .await;
        let extractor = FactExtractor::new(provider.clone(), fast_retry());

        let result = extractor.extract(&[user("hola")], None).await.unwrap();
        assert_eq!(result.message, "m");
        assert_eq!(provider.analysis_calls().await, 2);
    }

    #[tokio::test]
    async fn configuration_errors_are_not_retried() {
        let provider = Arc::new(MockProvider::new());
        provider
            .push_analysis_error(ExtractionError::Configuration(
                "API_KEY_HTTP_REFERRER_BLOCKED".into(),
            ))
            .await;
        let extractor = FactExtractor::new(provider.clone(), fast_retry());

        let err = extractor.extract(&[user("hola")], None).await.unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(provider.analysis_calls().await, 1);
    }

    #[tokio::test]
    async fn schema_violations_are_not_retried() {
        let provider = Arc::new(MockProvider::new());
        provider.push_analysis("no json here").await;
        let extractor = FactExtractor::new(provider.clone(), fast_retry());

        let err = extractor.extract(&[user("hola")], None).await.unwrap_err();
        assert!(matches!(err, ExtractionError::SchemaViolation(_)));
        assert_eq!(provider.analysis_calls().await, 1);
    }

    #[tokio::test]
    async fn input_history_is_not_mutated() {
        let provider = Arc::new(MockProvider::new());
        provider
            .push_analysis(extraction_json("m", "n", "FEDERAL", "b", &[], false))
            .await;
        let extractor = FactExtractor::new(provider, fast_retry());
        let history = vec![user("hola")];
        let before = history.clone();
        let location = LocationContext {
            lat: 1.0,
            lng: 2.0,
            address: None,
        };

        extractor.extract(&history, Some(&location)).await.unwrap();
        assert_eq!(history, before);
    }
}
