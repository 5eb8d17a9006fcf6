// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language-analysis capability used by the extractor and the lookup helpers.

use async_trait::async_trait;

use crate::error::ExtractionError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AnalysisRequest, AnalysisResponse, GroundedRequest, GroundedResponse};

/// A remote model able to answer structured and retrieval-grounded requests.
///
/// Implementations make exactly one provider call per method invocation.
/// Retries and deadlines are applied by the caller.
#[async_trait]
pub trait AnalysisProvider: PluginAdapter {
    /// Sends a JSON-schema constrained request and returns the raw text.
    async fn analyze(&self, request: AnalysisRequest)
    -> Result<AnalysisResponse, ExtractionError>;

    /// Sends a request grounded with a live retrieval tool.
    async fn grounded(&self, request: GroundedRequest)
    -> Result<GroundedResponse, ExtractionError>;
}
