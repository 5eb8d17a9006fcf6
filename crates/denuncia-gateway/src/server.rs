// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the web chat API.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use denuncia_config::model::GatewayConfig;
use denuncia_core::DenunciaError;
use denuncia_drafting::{DraftingService, GroundedLookup};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Largest accepted evidence upload.
pub const MAX_EVIDENCE_BYTES: usize = 20 * 1024 * 1024;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Drafting sessions, shared with the other transports.
    pub service: Arc<DraftingService>,
    pub lookup: GroundedLookup,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(service: Arc<DraftingService>, lookup: GroundedLookup) -> Self {
        Self {
            service,
            lookup,
            start_time: Instant::now(),
        }
    }
}

/// Builds the CORS layer. An empty origin list allows any origin.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, DenunciaError> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o)
                .map_err(|e| DenunciaError::Config(format!("invalid CORS origin '{o}': {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Routes of the web chat API:
/// - POST /v1/sessions, GET|DELETE /v1/sessions/{id}
/// - POST /v1/sessions/{id}/messages, /location, /evidence
/// - POST /v1/lookup/legal, /v1/address/components, /v1/tags
/// - GET /v1/geocode, /v1/area, /health
pub fn api_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/v1/sessions", post(handlers::create_session))
        .route(
            "/v1/sessions/{id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/v1/sessions/{id}/messages", post(handlers::post_message))
        .route("/v1/sessions/{id}/location", post(handlers::post_location))
        .route(
            "/v1/sessions/{id}/evidence",
            post(handlers::post_evidence).layer(DefaultBodyLimit::max(MAX_EVIDENCE_BYTES)),
        )
        .route("/v1/lookup/legal", post(handlers::post_legal_lookup))
        .route("/v1/geocode", get(handlers::get_geocode))
        .route("/v1/area", get(handlers::get_area))
        .route(
            "/v1/address/components",
            post(handlers::post_address_components),
        )
        .route("/v1/tags", post(handlers::post_tags))
        .with_state(state)
}

/// Wraps `app` with CORS and request tracing.
pub fn with_middleware(app: Router, cors_origins: &[String]) -> Result<Router, DenunciaError> {
    Ok(app
        .layer(cors_layer(cors_origins)?)
        .layer(TraceLayer::new_for_http()))
}

/// Binds to the configured host:port and serves `app` until `cancel` fires.
pub async fn start_server(
    config: &GatewayConfig,
    app: Router,
    cancel: CancellationToken,
) -> Result<(), DenunciaError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| DenunciaError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| DenunciaError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
