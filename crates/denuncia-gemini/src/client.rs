// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini `generateContent` endpoint.
//!
//! [`GeminiClient`] performs exactly one HTTP exchange per call and maps every
//! failure onto [`ExtractionError`]. Retries are the caller's business.

use std::time::Duration;

use denuncia_core::{DenunciaError, ExtractionError};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use crate::types::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};

/// Markers in an error body that mean the key itself is unusable.
const KEY_ERROR_MARKERS: &[&str] = &[
    "API key",
    "API_KEY_INVALID",
    "API_KEY_HTTP_REFERRER_BLOCKED",
    "PERMISSION_DENIED",
];

/// HTTP client for Gemini API communication.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Creates a new client.
    ///
    /// # Arguments
    /// * `api_key` - sent as `x-goog-api-key` on every request
    /// * `model` - model identifier, e.g. `gemini-2.5-flash`
    /// * `base_url` - API root up to and including the version segment
    /// * `timeout` - per-request deadline
    pub fn new(
        api_key: &str,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, DenunciaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key)
                .map_err(|e| DenunciaError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| DenunciaError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Sends one `generateContent` request.
    pub async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ExtractionError> {
        let response = self
            .client
            .post(self.endpoint())
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "gemini response received");

        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            ExtractionError::SchemaViolation(format!("unparseable response envelope: {e}"))
        })
    }

    fn transport_error(&self, error: reqwest::Error) -> ExtractionError {
        if error.is_timeout() {
            ExtractionError::Timeout {
                duration: self.timeout,
            }
        } else {
            ExtractionError::Network {
                status: error.status().map(|s| s.as_u16()),
                message: format!("HTTP request failed: {error}"),
            }
        }
    }
}

/// Maps a non-success status and its body onto the error taxonomy.
pub fn classify_status(status: StatusCode, body: &str) -> ExtractionError {
    let message = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_err) => match api_err.error.status {
            Some(kind) => format!("Gemini API error ({kind}): {}", api_err.error.message),
            None => format!("Gemini API error: {}", api_err.error.message),
        },
        Err(_) => format!("API returned {status}: {body}"),
    };

    let key_problem = KEY_ERROR_MARKERS.iter().any(|m| body.contains(m));
    let code = status.as_u16();

    match code {
        401 | 403 => ExtractionError::Configuration(message),
        400 if key_problem => ExtractionError::Configuration(message),
        404 => ExtractionError::Configuration(format!("model not available: {message}")),
        _ if key_problem && status.is_client_error() => ExtractionError::Configuration(message),
        _ => ExtractionError::Network {
            status: Some(code),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Content;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: None,
            contents: vec![Content::text(Some("user"), "hola")],
            generation_config: None,
            tools: None,
        }
    }

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new(
            "test-key",
            "gemini-test".into(),
            format!("{}/v1beta/", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn rejects_unrepresentable_api_key() {
        let result = GeminiClient::new(
            "bad\nkey",
            "m".into(),
            "http://localhost".into(),
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(DenunciaError::Config(_))));
    }

    #[test]
    fn classify_auth_failures_as_configuration() {
        let referrer = r#"{"error":{"code":403,"message":"Requests from referer <empty> are blocked.","status":"PERMISSION_DENIED","details":[{"reason":"API_KEY_HTTP_REFERRER_BLOCKED"}]}}"#;
        let err = classify_status(StatusCode::FORBIDDEN, referrer);
        assert!(err.is_configuration());
        assert!(err.to_string().contains("PERMISSION_DENIED"));

        let invalid = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        assert!(classify_status(StatusCode::BAD_REQUEST, invalid).is_configuration());
        assert!(classify_status(StatusCode::UNAUTHORIZED, "").is_configuration());
    }

    #[test]
    fn classify_transient_statuses_as_network() {
        for status in [
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let err = classify_status(status, "overloaded");
            assert_eq!(
                err,
                ExtractionError::Network {
                    status: Some(status.as_u16()),
                    message: format!("API returned {status}: overloaded"),
                }
            );
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn classify_plain_bad_request_as_non_retryable_network() {
        let body = r#"{"error":{"code":400,"message":"Invalid JSON payload","status":"INVALID_ARGUMENT"}}"#;
        let err = classify_status(StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, ExtractionError::Network { status: Some(400), .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn generate_posts_to_model_endpoint_with_key_header() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "ok"}]}}]
        });
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server).generate(&request()).await.unwrap();
        assert_eq!(response.candidates[0].answer_text(), "ok");
    }

    #[tokio::test]
    async fn generate_maps_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate(&request()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Network { status: Some(503), .. }));
    }

    #[tokio::test]
    async fn generate_maps_garbage_body_to_schema_violation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate(&request()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::SchemaViolation(_)));
    }

    #[tokio::test]
    async fn generate_maps_slow_response_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"candidates": []}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = GeminiClient::new(
            "test-key",
            "gemini-test".into(),
            server.uri(),
            Duration::from_millis(50),
        )
        .unwrap();
        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Timeout { .. }));
    }
}
