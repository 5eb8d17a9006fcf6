// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stateless, retrieval-grounded helper queries.
//!
//! None of these operations fail: every provider problem degrades to an
//! explicit "no data" payload that is safe to show to a citizen.
//! Configuration problems are still logged at `error!` for the operator.

use std::sync::Arc;

use denuncia_core::ExtractionError;
use denuncia_core::traits::AnalysisProvider;
use denuncia_core::types::{
    AnalysisRequest, ChunkKind, GroundedRequest, GroundedResponse, ProviderTurn, RetrievalTool,
};
use denuncia_resilience::RetryPolicy;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::prompt;

pub const NO_INFORMATION_FOUND: &str = "No se encontró información.";
pub const DEMO_SEARCH: &str = "Modo Demo: Sin conexión a búsqueda.";
pub const DEMO_ADDRESS: &str = "Ubicación aproximada (Sin API Key)";
pub const ADDRESS_NOT_FOUND: &str = "Dirección no encontrada";
pub const MAPS_TEMPORARY_ERROR: &str = "Error temporal del servicio de mapas. Intente más tarde.";
pub const MAPS_ERROR: &str = "Error al consultar la API de mapas";
pub const DEMO_AREA: &str = "Ubicación seleccionada.";
pub const AREA_UNAVAILABLE: &str = "Descripción no disponible.";
pub const AREA_ERROR: &str = "Error obteniendo descripción.";
pub const UNKNOWN_COMPONENT: &str = "Desconocido";
pub const DEFAULT_TAGS: [&str; 3] = ["General", "Sin categoría", "Pendiente"];

const DEFAULT_SOURCE_TITLE: &str = "Fuente Web";

/// A cited official source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalSource {
    pub title: String,
    pub uri: String,
}

/// Answer to a legal question, with its citations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalInfo {
    pub text: String,
    pub sources: Vec<LegalSource>,
}

impl LegalInfo {
    fn fixed(text: &str) -> Self {
        Self {
            text: text.to_string(),
            sources: Vec::new(),
        }
    }
}

/// Postal address resolved from coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodedAddress {
    pub address: String,
    /// Link to the place on the map service, when one was cited.
    pub map_uri: Option<String>,
}

impl GeocodedAddress {
    fn fixed(text: &str) -> Self {
        Self {
            address: text.to_string(),
            map_uri: None,
        }
    }
}

/// Administrative components of a Mexican address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressComponents {
    #[serde(default)]
    pub estado: String,
    #[serde(default)]
    pub municipio: String,
    #[serde(default)]
    pub localidad: String,
}

/// Grounded helper queries sharing one provider and retry policy.
#[derive(Clone)]
pub struct GroundedLookup {
    provider: Option<Arc<dyn AnalysisProvider>>,
    retry: RetryPolicy,
}

impl GroundedLookup {
    pub fn new(provider: Arc<dyn AnalysisProvider>, retry: RetryPolicy) -> Self {
        Self {
            provider: Some(provider),
            retry,
        }
    }

    /// Lookup without a provider; every answer is a demo placeholder.
    pub fn demo() -> Self {
        Self {
            provider: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn is_simulated(&self) -> bool {
        self.provider.is_none()
    }

    /// Searches official Mexican government sources for `query`.
    pub async fn lookup_legal_info(&self, query: &str) -> LegalInfo {
        let Some(provider) = &self.provider else {
            return LegalInfo::fixed(DEMO_SEARCH);
        };
        if query.trim().is_empty() {
            return LegalInfo::fixed(NO_INFORMATION_FOUND);
        }

        let request = GroundedRequest {
            prompt: prompt::legal_lookup_prompt(query),
            tool: RetrievalTool::WebSearch,
        };
        let response = self
            .retry
            .run("legal_lookup", ExtractionError::is_retryable, || {
                provider.grounded(request.clone())
            })
            .await;

        match response {
            Ok(response) if !response.text.trim().is_empty() => {
                let sources = web_sources(&response);
                debug!(sources = sources.len(), "legal lookup answered");
                LegalInfo {
                    text: response.text.trim().to_string(),
                    sources,
                }
            }
            Ok(_) => LegalInfo::fixed(NO_INFORMATION_FOUND),
            Err(err) => {
                log_failure("legal_lookup", &err);
                LegalInfo::fixed(NO_INFORMATION_FOUND)
            }
        }
    }

    /// Resolves coordinates to a postal address using map retrieval.
    ///
    /// Only server errors and timeouts are retried.
    pub async fn reverse_geocode(&self, lat: f64, lng: f64) -> GeocodedAddress {
        let Some(provider) = &self.provider else {
            return GeocodedAddress::fixed(DEMO_ADDRESS);
        };

        let request = GroundedRequest {
            prompt: prompt::reverse_geocode_prompt(lat, lng),
            tool: RetrievalTool::MapSearch,
        };
        let response = self
            .retry
            .run("reverse_geocode", ExtractionError::is_server_error, || {
                provider.grounded(request.clone())
            })
            .await;

        match response {
            Ok(response) => {
                let address = response.text.trim();
                if address.is_empty() {
                    return GeocodedAddress::fixed(ADDRESS_NOT_FOUND);
                }
                let map_uri = response
                    .chunks
                    .iter()
                    .find(|c| c.kind == ChunkKind::Maps && !c.uri.trim().is_empty())
                    .map(|c| c.uri.clone());
                GeocodedAddress {
                    address: address.to_string(),
                    map_uri,
                }
            }
            Err(err) if err.is_server_error() => {
                warn!(error = %err, "map service unavailable after retries");
                GeocodedAddress::fixed(MAPS_TEMPORARY_ERROR)
            }
            Err(err) => {
                log_failure("reverse_geocode", &err);
                GeocodedAddress::fixed(MAPS_ERROR)
            }
        }
    }

    /// Splits a free-form address into estado, municipio, and localidad.
    pub async fn parse_address_components(&self, address: &str) -> AddressComponents {
        let Some(provider) = &self.provider else {
            return AddressComponents {
                estado: UNKNOWN_COMPONENT.to_string(),
                municipio: UNKNOWN_COMPONENT.to_string(),
                localidad: UNKNOWN_COMPONENT.to_string(),
            };
        };
        if address.trim().is_empty() {
            return AddressComponents::default();
        }

        let request = single_turn_request(
            prompt::address_components_prompt(address),
            prompt::address_components_schema(),
        );
        let response = self
            .retry
            .run("address_components", ExtractionError::is_retryable, || {
                provider.analyze(request.clone())
            })
            .await;

        match response {
            Ok(response) => {
                serde_json::from_str(strip_fences(&response.text)).unwrap_or_else(|e| {
                    debug!(error = %e, "unparseable address components");
                    AddressComponents::default()
                })
            }
            Err(err) => {
                log_failure("address_components", &err);
                AddressComponents::default()
            }
        }
    }

    /// Short grounded description of the surroundings of a point.
    pub async fn describe_area(&self, lat: f64, lng: f64) -> String {
        let Some(provider) = &self.provider else {
            return DEMO_AREA.to_string();
        };

        let request = GroundedRequest {
            prompt: prompt::describe_area_prompt(lat, lng),
            tool: RetrievalTool::WebSearch,
        };
        let response = self
            .retry
            .run("describe_area", ExtractionError::is_retryable, || {
                provider.grounded(request.clone())
            })
            .await;

        match response {
            Ok(response) if !response.text.trim().is_empty() => response.text.trim().to_string(),
            Ok(_) => AREA_UNAVAILABLE.to_string(),
            Err(err) => {
                log_failure("describe_area", &err);
                AREA_ERROR.to_string()
            }
        }
    }

    /// Exactly three Spanish category tags for a report description.
    pub async fn suggest_tags(&self, description: &str) -> Vec<String> {
        let defaults = || -> Vec<String> { DEFAULT_TAGS.iter().map(|t| t.to_string()).collect() };

        let Some(provider) = &self.provider else {
            return defaults();
        };
        if description.trim().is_empty() {
            return defaults();
        }

        let request = single_turn_request(prompt::tags_prompt(description), prompt::tags_schema());
        let response = self
            .retry
            .run("suggest_tags", ExtractionError::is_retryable, || {
                provider.analyze(request.clone())
            })
            .await;

        match response {
            Ok(response) => parse_tags(&response.text).unwrap_or_else(|| {
                debug!(raw = %response.text, "tag response had the wrong shape");
                defaults()
            }),
            Err(err) => {
                log_failure("suggest_tags", &err);
                defaults()
            }
        }
    }
}

fn single_turn_request(text: String, schema: serde_json::Value) -> AnalysisRequest {
    AnalysisRequest {
        system_instruction: None,
        turns: vec![ProviderTurn {
            role: "user".to_string(),
            text,
        }],
        response_schema: schema,
    }
}

fn log_failure(operation: &str, err: &ExtractionError) {
    if err.is_configuration() {
        error!(operation, error = %err, "analysis provider rejected configuration");
    } else {
        warn!(operation, error = %err, "grounded lookup failed, returning fallback");
    }
}

/// Web citations deduplicated by URI; the first title seen wins.
fn web_sources(response: &GroundedResponse) -> Vec<LegalSource> {
    let mut sources: Vec<LegalSource> = Vec::new();
    for chunk in response.chunks.iter().filter(|c| c.kind == ChunkKind::Web) {
        let uri = chunk.uri.trim();
        if uri.is_empty() || sources.iter().any(|s| s.uri == uri) {
            continue;
        }
        let title = match chunk.title.trim() {
            "" => DEFAULT_SOURCE_TITLE,
            t => t,
        };
        sources.push(LegalSource {
            title: title.to_string(),
            uri: uri.to_string(),
        });
    }
    sources
}

fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Accepts a JSON array of exactly three non-blank strings, possibly wrapped in prose.
fn parse_tags(text: &str) -> Option<Vec<String>> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }
    let tags: Vec<String> = serde_json::from_str(&text[start..=end]).ok()?;
    let tags: Vec<String> = tags.into_iter().map(|t| t.trim().to_string()).collect();
    if tags.len() == 3 && tags.iter().all(|t| !t.is_empty()) {
        Some(tags)
    } else {
        None
    }
}
