// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound Twilio webhook.
//!
//! Verifies the request signature, normalizes the payload, enqueues it and
//! acknowledges with an empty TwiML document. Drafting happens later in the
//! [`worker`](crate::worker); the webhook never talks to the extractor.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use denuncia_core::traits::StorageAdapter;
use tracing::{debug, error, info, warn};

use crate::payload::normalize;
use crate::signature::verify_signature;

/// Queue carrying normalized inbound WhatsApp messages.
pub const QUEUE_NAME: &str = "whatsapp-incoming";

/// Route the webhook is mounted on.
pub const WEBHOOK_PATH: &str = "/webhooks/whatsapp";

/// Empty TwiML: acknowledge without an automatic reply.
pub const EMPTY_TWIML: &str = "<Response></Response>";

const SIGNATURE_HEADER: &str = "x-twilio-signature";

/// How inbound requests are authenticated.
#[derive(Debug, Clone)]
pub enum SignaturePolicy {
    /// Require a valid `X-Twilio-Signature` computed over `public_url`.
    Verify { auth_token: String, public_url: String },
    /// Accept unsigned requests (local development only).
    Disabled,
}

/// Shared state for the webhook handler.
#[derive(Clone)]
pub struct WebhookState {
    pub storage: Arc<dyn StorageAdapter>,
    pub signature: SignaturePolicy,
}

/// Router exposing `POST /webhooks/whatsapp`.
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(receive))
        .with_state(state)
}

fn plain(status: StatusCode, text: &'static str) -> Response {
    (status, text).into_response()
}

/// POST /webhooks/whatsapp
pub async fn receive(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let params: Vec<(String, String)> = match serde_urlencoded::from_bytes(&body) {
        Ok(params) => params,
        Err(e) => {
            warn!(error = %e, "webhook body is not form-encoded");
            return plain(StatusCode::BAD_REQUEST, "Bad Request");
        }
    };

    if let SignaturePolicy::Verify {
        auth_token,
        public_url,
    } = &state.signature
    {
        let Some(signature) = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
        else {
            warn!("missing X-Twilio-Signature header");
            return plain(StatusCode::UNAUTHORIZED, "Unauthorized");
        };
        if !verify_signature(auth_token, public_url, &params, signature) {
            warn!(url = %public_url, "invalid Twilio signature");
            return plain(StatusCode::FORBIDDEN, "Forbidden");
        }
    }

    let message = match normalize(&params) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "rejecting malformed webhook payload");
            return plain(StatusCode::BAD_REQUEST, "Bad Request");
        }
    };

    let payload = match serde_json::to_string(&message) {
        Ok(payload) => payload,
        Err(e) => {
            error!(error = %e, "failed to encode normalized message");
            return plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    };

    match state.storage.enqueue(QUEUE_NAME, &payload).await {
        Ok(id) => {
            info!(queue_id = id, from = %message.from, kind = ?message.kind, "WhatsApp message queued");
            debug!(sid = ?message.external_message_id, "acknowledging with empty TwiML");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/xml")],
                EMPTY_TWIML,
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to enqueue WhatsApp message");
            plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use denuncia_test_utils::MemoryStorage;
    use tower::ServiceExt;

    use crate::payload::{MessageKind, NormalizedMessage};
    use crate::signature::compute_signature;

    const URL: &str = "https://denuncia.example.mx/webhooks/whatsapp";
    const TOKEN: &str = "test-token";

    fn form() -> Vec<(String, String)> {
        [
            ("From", "whatsapp:+5215512345678"),
            ("To", "whatsapp:+14155238886"),
            ("Body", "Hola"),
            ("MessageSid", "SM123"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn app(storage: Arc<MemoryStorage>, verify: bool) -> Router {
        let signature = if verify {
            SignaturePolicy::Verify {
                auth_token: TOKEN.into(),
                public_url: URL.into(),
            }
        } else {
            SignaturePolicy::Disabled
        };
        router(WebhookState { storage, signature })
    }

    fn request(params: &[(String, String)], signature: Option<&str>) -> Request<Body> {
        let body = serde_urlencoded::to_string(params).unwrap();
        let mut builder = Request::builder()
            .method("POST")
            .uri(WEBHOOK_PATH)
            .header("content-type", "application/x-www-form-urlencoded");
        if let Some(sig) = signature {
            builder = builder.header("X-Twilio-Signature", sig);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn signed_message_is_queued_and_acknowledged() {
        let storage = Arc::new(MemoryStorage::new());
        let params = form();
        let signature = compute_signature(TOKEN, URL, &params).unwrap();

        let response = app(storage.clone(), true)
            .oneshot(request(&params, Some(&signature)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/xml");
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], EMPTY_TWIML.as_bytes());

        let entries = storage.queue_entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].queue_name, QUEUE_NAME);
        let queued: NormalizedMessage = serde_json::from_str(&entries[0].payload).unwrap();
        assert_eq!(queued.kind, MessageKind::Text);
        assert_eq!(queued.from, "whatsapp:+5215512345678");
    }

    #[tokio::test]
    async fn missing_signature_is_unauthorized() {
        let storage = Arc::new(MemoryStorage::new());
        let response = app(storage.clone(), true)
            .oneshot(request(&form(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(storage.queue_entries().await.is_empty());
    }

    #[tokio::test]
    async fn tampered_body_is_forbidden() {
        let storage = Arc::new(MemoryStorage::new());
        let signature = compute_signature(TOKEN, URL, &form()).unwrap();
        let mut tampered = form();
        tampered[2].1 = "Adiós".into();

        let response = app(storage.clone(), true)
            .oneshot(request(&tampered, Some(&signature)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(storage.queue_entries().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_payload_is_bad_request() {
        let storage = Arc::new(MemoryStorage::new());
        let params = vec![("Body".to_string(), "sin remitente".to_string())];

        let response = app(storage.clone(), false)
            .oneshot(request(&params, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(storage.queue_entries().await.is_empty());
    }

    #[tokio::test]
    async fn disabled_verification_accepts_unsigned() {
        let storage = Arc::new(MemoryStorage::new());
        let response = app(storage.clone(), false)
            .oneshot(request(&form(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(storage.queue_entries().await.len(), 1);
    }
}
