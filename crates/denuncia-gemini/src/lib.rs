// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini provider adapter for the Denuncia drafting service.
//!
//! This crate implements [`AnalysisProvider`] against the Gemini REST API:
//! schema-constrained JSON analysis for fact extraction and tool-grounded
//! free text (Google Search, Google Maps) for lookups.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use denuncia_config::DenunciaConfig;
use denuncia_core::error::{DenunciaError, ExtractionError};
use denuncia_core::traits::{AnalysisProvider, PluginAdapter};
use denuncia_core::types::{
    AdapterType, AnalysisRequest, AnalysisResponse, ChunkKind, GroundedRequest,
    GroundedResponse, GroundingChunk, HealthStatus, RetrievalTool,
};
use tracing::{debug, info};

use crate::client::GeminiClient;
use crate::types::{
    Content, EmptyObject, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Tool,
};

/// Gemini provider implementing [`AnalysisProvider`].
///
/// API key resolution: `gemini.api_key` in config, with `GEMINI_API_KEY`
/// applied by the config loader. No key means no provider (demo mode).
pub struct GeminiProvider {
    client: GeminiClient,
}

impl GeminiProvider {
    /// Builds the provider from configuration.
    ///
    /// Returns `Ok(None)` when no API key is configured, so callers can fall
    /// back to the simulated extractor.
    pub fn from_config(config: &DenunciaConfig) -> Result<Option<Self>, DenunciaError> {
        let Some(api_key) = config
            .gemini
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
        else {
            info!("no Gemini API key configured, analysis runs in demo mode");
            return Ok(None);
        };

        let client = GeminiClient::new(
            api_key,
            config.gemini.model.clone(),
            config.gemini.base_url.clone(),
            Duration::from_secs(config.drafting.call_timeout_secs),
        )?;

        info!(model = config.gemini.model, "Gemini provider initialized");
        Ok(Some(Self { client }))
    }

    /// Creates a provider with an existing client.
    pub fn with_client(client: GeminiClient) -> Self {
        Self { client }
    }

    fn to_analyze_request(request: AnalysisRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: request
                .system_instruction
                .map(|text| Content::text(None, text)),
            contents: request
                .turns
                .into_iter()
                .map(|turn| Content::text(Some(&turn.role), turn.text))
                .collect(),
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json".into(),
                response_schema: request.response_schema,
            }),
            tools: None,
        }
    }

    fn to_grounded_request(request: GroundedRequest) -> GenerateContentRequest {
        let tool = match request.tool {
            RetrievalTool::WebSearch => Tool {
                google_search: Some(EmptyObject {}),
                ..Default::default()
            },
            RetrievalTool::MapSearch => Tool {
                google_maps: Some(EmptyObject {}),
                ..Default::default()
            },
        };
        GenerateContentRequest {
            system_instruction: None,
            contents: vec![Content::text(Some("user"), request.prompt)],
            generation_config: None,
            tools: Some(vec![tool]),
        }
    }
}

/// Text and citations of the first candidate.
fn first_candidate(
    response: GenerateContentResponse,
) -> Result<(String, Vec<GroundingChunk>), ExtractionError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ExtractionError::SchemaViolation("response has no candidates".into()))?;

    let text = candidate.answer_text();
    let mut chunks = Vec::new();
    if let Some(metadata) = candidate.grounding_metadata {
        for chunk in metadata.grounding_chunks {
            let sources = [(chunk.web, ChunkKind::Web), (chunk.maps, ChunkKind::Maps)];
            for (source, kind) in sources {
                if let Some(source) = source
                    && let Some(uri) = source.link()
                {
                    chunks.push(GroundingChunk {
                        uri: uri.to_string(),
                        title: source.title.clone().unwrap_or_default(),
                        kind,
                    });
                }
            }
        }
    }
    Ok((text, chunks))
}

#[async_trait]
impl PluginAdapter for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, DenunciaError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DenunciaError> {
        Ok(())
    }
}

#[async_trait]
impl AnalysisProvider for GeminiProvider {
    async fn analyze(
        &self,
        request: AnalysisRequest,
    ) -> Result<AnalysisResponse, ExtractionError> {
        let turns = request.turns.len();
        let response = self
            .client
            .generate(&Self::to_analyze_request(request))
            .await?;
        let (text, _) = first_candidate(response)?;
        if text.trim().is_empty() {
            return Err(ExtractionError::SchemaViolation(
                "candidate carried no text".into(),
            ));
        }
        debug!(turns, chars = text.len(), "analysis response received");
        Ok(AnalysisResponse { text })
    }

    async fn grounded(
        &self,
        request: GroundedRequest,
    ) -> Result<GroundedResponse, ExtractionError> {
        let tool = request.tool;
        let response = self
            .client
            .generate(&Self::to_grounded_request(request))
            .await?;
        let (text, chunks) = first_candidate(response)?;
        debug!(tool = %tool, chunks = chunks.len(), "grounded response received");
        Ok(GroundedResponse { text, chunks })
    }
}
