// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock analysis provider for deterministic testing.
//!
//! `MockProvider` implements `AnalysisProvider` with scripted results and
//! records every request so tests can assert on call counts and payloads.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use denuncia_core::traits::{AnalysisProvider, PluginAdapter};
use denuncia_core::types::{
    AdapterType, AnalysisRequest, AnalysisResponse, GroundedRequest, GroundedResponse,
    HealthStatus,
};
use denuncia_core::{DenunciaError, ExtractionError};

/// A provider that replays queued results in FIFO order.
///
/// An empty queue yields a 503 network error, so an unexpected call fails
/// loudly instead of hanging.
pub struct MockProvider {
    analyses: Mutex<VecDeque<Result<String, ExtractionError>>>,
    grounded: Mutex<VecDeque<Result<GroundedResponse, ExtractionError>>>,
    analysis_requests: Mutex<Vec<AnalysisRequest>>,
    grounded_requests: Mutex<Vec<GroundedRequest>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            analyses: Mutex::new(VecDeque::new()),
            grounded: Mutex::new(VecDeque::new()),
            analysis_requests: Mutex::new(Vec::new()),
            grounded_requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock pre-loaded with successful analysis texts.
    pub fn with_analyses(texts: Vec<String>) -> Self {
        Self {
            analyses: Mutex::new(texts.into_iter().map(Ok).collect()),
            ..Self::new()
        }
    }

    /// Queue a successful structured analysis.
    pub async fn push_analysis(&self, text: impl Into<String>) {
        self.analyses.lock().await.push_back(Ok(text.into()));
    }

    /// Queue a failed structured analysis.
    pub async fn push_analysis_error(&self, err: ExtractionError) {
        self.analyses.lock().await.push_back(Err(err));
    }

    /// Queue a successful grounded answer.
    pub async fn push_grounded(&self, response: GroundedResponse) {
        self.grounded.lock().await.push_back(Ok(response));
    }

    /// Queue a failed grounded answer.
    pub async fn push_grounded_error(&self, err: ExtractionError) {
        self.grounded.lock().await.push_back(Err(err));
    }

    /// Number of `analyze` calls made so far.
    pub async fn analysis_calls(&self) -> usize {
        self.analysis_requests.lock().await.len()
    }

    /// Number of `grounded` calls made so far.
    pub async fn grounded_calls(&self) -> usize {
        self.grounded_requests.lock().await.len()
    }

    /// The most recent structured request, if any.
    pub async fn last_analysis_request(&self) -> Option<AnalysisRequest> {
        self.analysis_requests.lock().await.last().cloned()
    }

    /// The most recent grounded request, if any.
    pub async fn last_grounded_request(&self) -> Option<GroundedRequest> {
        self.grounded_requests.lock().await.last().cloned()
    }

    fn exhausted() -> ExtractionError {
        ExtractionError::Network {
            status: Some(503),
            message: "mock provider has no scripted response".to_string(),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
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
impl AnalysisProvider for MockProvider {
    async fn analyze(
        &self,
        request: AnalysisRequest,
    ) -> Result<AnalysisResponse, ExtractionError> {
        self.analysis_requests.lock().await.push(request);
        let next = self.analyses.lock().await.pop_front();
        next.unwrap_or_else(|| Err(Self::exhausted()))
            .map(|text| AnalysisResponse { text })
    }

    async fn grounded(
        &self,
        request: GroundedRequest,
    ) -> Result<GroundedResponse, ExtractionError> {
        self.grounded_requests.lock().await.push(request);
        let next = self.grounded.lock().await.pop_front();
        next.unwrap_or_else(|| Err(Self::exhausted()))
    }
}
