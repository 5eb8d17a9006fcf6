// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the web chat API.
//!
//! Web sessions are stored under the key `web:{session_id}`, so a web
//! client can never address a WhatsApp conversation.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use denuncia_core::DenunciaError;
use denuncia_core::types::{DraftingEvent, DraftingSession};
use denuncia_drafting::{AddressComponents, GeocodedAddress, LegalInfo};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::server::GatewayState;

/// Channel label recorded on web sessions.
pub const WEB_CHANNEL: &str = "web";

const FILE_NAME_HEADER: &str = "x-file-name";
const DEFAULT_MIME: &str = "application/octet-stream";

fn session_key(id: &str) -> String {
    format!("{WEB_CHANNEL}:{id}")
}

fn check_coordinates(lat: f64, lng: f64) -> Result<(), ApiError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(ApiError::validation(format!("latitude {lat} is outside [-90, 90]")));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(ApiError::validation(format!("longitude {lng} is outside [-180, 180]")));
    }
    Ok(())
}

// --- Sessions ---

/// Response body for POST /v1/sessions.
#[derive(Debug, Serialize)]
pub struct CreatedSession {
    pub session_id: String,
    /// The service runs without an analysis provider.
    pub simulated: bool,
    pub session: DraftingSession,
}

/// Response body for the event endpoints.
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub reply: String,
    /// The provider failed and the fallback reply was used.
    pub degraded: bool,
    pub session: DraftingSession,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub address: Option<String>,
}

/// POST /v1/sessions
pub async fn create_session(
    State(state): State<GatewayState>,
) -> Result<(StatusCode, Json<CreatedSession>), ApiError> {
    let session_id = uuid::Uuid::new_v4().to_string();
    let session = state
        .service
        .open(&session_key(&session_id), WEB_CHANNEL)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedSession {
            session_id,
            simulated: state.service.is_simulated(),
            session,
        }),
    ))
}

/// GET /v1/sessions/{id}
pub async fn get_session(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<DraftingSession>, ApiError> {
    state
        .service
        .snapshot(&session_key(&id))
        .await?
        .map(Json)
        .ok_or(ApiError(DenunciaError::SessionNotFound(id)))
}

/// DELETE /v1/sessions/{id}
pub async fn delete_session(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.service.reset(&session_key(&id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError(DenunciaError::SessionNotFound(id)))
    }
}

/// Applies `event` to an existing web session.
async fn apply(
    state: &GatewayState,
    id: String,
    event: DraftingEvent,
) -> Result<Json<TurnResponse>, ApiError> {
    let handled = state
        .service
        .handle_existing(&session_key(&id), WEB_CHANNEL, event)
        .await
        .map_err(|e| match e {
            DenunciaError::SessionNotFound(_) => DenunciaError::SessionNotFound(id),
            other => other,
        })?;
    Ok(Json(TurnResponse {
        reply: handled.reply,
        degraded: handled.degraded,
        session: handled.session,
    }))
}

/// POST /v1/sessions/{id}/messages
pub async fn post_message(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(body): Json<MessageRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    apply(&state, id, DraftingEvent::TextTurn { text: body.text }).await
}

/// POST /v1/sessions/{id}/location
pub async fn post_location(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(body): Json<LocationRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    apply(
        &state,
        id,
        DraftingEvent::Location {
            lat: body.lat,
            lng: body.lng,
            address: body.address,
        },
    )
    .await
}

/// POST /v1/sessions/{id}/evidence
///
/// The raw request body is the file; `content-type` is its MIME type and
/// the optional `x-file-name` header is kept as its source.
pub async fn post_evidence(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TurnResponse>, ApiError> {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    let mime_type = header_value(header::CONTENT_TYPE.as_str())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
        .unwrap_or_else(|| DEFAULT_MIME.to_string());
    let source_uri = header_value(FILE_NAME_HEADER)
        .map(|name| format!("upload://{name}"))
        .unwrap_or_else(|| format!("upload://{}", uuid::Uuid::new_v4()));

    debug!(session = %id, size = body.len(), mime_type = %mime_type, "evidence upload received");
    apply(
        &state,
        id,
        DraftingEvent::Evidence {
            bytes: body.to_vec(),
            source_uri,
            mime_type,
        },
    )
    .await
}

// --- Grounded lookups ---

#[derive(Debug, Deserialize)]
pub struct LegalQuery {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct TagsRequest {
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct AreaResponse {
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct TagsResponse {
    pub tags: Vec<String>,
}

/// POST /v1/lookup/legal
pub async fn post_legal_lookup(
    State(state): State<GatewayState>,
    Json(body): Json<LegalQuery>,
) -> Json<LegalInfo> {
    Json(state.lookup.lookup_legal_info(&body.query).await)
}

/// GET /v1/geocode?lat=&lng=
pub async fn get_geocode(
    State(state): State<GatewayState>,
    Query(at): Query<Coordinates>,
) -> Result<Json<GeocodedAddress>, ApiError> {
    check_coordinates(at.lat, at.lng)?;
    Ok(Json(state.lookup.reverse_geocode(at.lat, at.lng).await))
}

/// GET /v1/area?lat=&lng=
pub async fn get_area(
    State(state): State<GatewayState>,
    Query(at): Query<Coordinates>,
) -> Result<Json<AreaResponse>, ApiError> {
    check_coordinates(at.lat, at.lng)?;
    Ok(Json(AreaResponse {
        description: state.lookup.describe_area(at.lat, at.lng).await,
    }))
}

/// POST /v1/address/components
pub async fn post_address_components(
    State(state): State<GatewayState>,
    Json(body): Json<AddressRequest>,
) -> Json<AddressComponents> {
    Json(state.lookup.parse_address_components(&body.address).await)
}

/// POST /v1/tags
pub async fn post_tags(
    State(state): State<GatewayState>,
    Json(body): Json<TagsRequest>,
) -> Json<TagsResponse> {
    Json(TagsResponse {
        tags: state.lookup.suggest_tags(&body.description).await,
    })
}

// --- Health ---

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// True when running in demo mode without an analysis provider.
    pub simulated: bool,
    pub uptime_secs: u64,
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        simulated: state.service.is_simulated() || state.lookup.is_simulated(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_sessions_are_namespaced() {
        assert_eq!(session_key("abc"), "web:abc");
    }

    #[test]
    fn coordinate_bounds() {
        assert!(check_coordinates(19.43, -99.13).is_ok());
        assert!(check_coordinates(90.0, 180.0).is_ok());
        assert!(check_coordinates(90.1, 0.0).is_err());
        assert!(check_coordinates(0.0, -180.5).is_err());
        assert!(check_coordinates(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn location_request_address_is_optional() {
        let req: LocationRequest = serde_json::from_str(r#"{"lat": 19.4, "lng": -99.1}"#).unwrap();
        assert!(req.address.is_none());
    }
}
