// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring shared by `serve` and `shell`.

use std::sync::Arc;
use std::time::Duration;

use denuncia_config::DenunciaConfig;
use denuncia_core::DenunciaError;
use denuncia_core::traits::{AnalysisProvider, StorageAdapter};
use denuncia_drafting::{DraftingEngine, DraftingService, FactExtractor, GroundedLookup};
use denuncia_gemini::GeminiProvider;
use denuncia_resilience::RetryPolicy;
use denuncia_storage::SqliteStorage;
use tracing::{info, warn};

/// Everything a transport needs to drive drafting sessions.
pub struct Components {
    pub storage: Arc<dyn StorageAdapter>,
    pub service: Arc<DraftingService>,
    pub lookup: GroundedLookup,
}

pub fn retry_policy(config: &DenunciaConfig) -> RetryPolicy {
    RetryPolicy::new(
        config.drafting.max_attempts,
        Duration::from_millis(config.drafting.base_delay_ms),
        Duration::from_secs(config.drafting.call_timeout_secs),
    )
}

/// Opens storage and builds the drafting service. Without a Gemini key the
/// extractor and lookups run in demo mode.
pub async fn build(config: &DenunciaConfig) -> Result<Components, DenunciaError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

    let provider: Option<Arc<dyn AnalysisProvider>> = GeminiProvider::from_config(config)?
        .map(|p| Arc::new(p) as Arc<dyn AnalysisProvider>);

    let retry = retry_policy(config);
    let (extractor, lookup) = match provider {
        Some(provider) => (
            FactExtractor::new(provider.clone(), retry),
            GroundedLookup::new(provider, retry),
        ),
        None => {
            warn!("running in demo mode: replies are simulated, set GEMINI_API_KEY to enable analysis");
            (FactExtractor::demo(), GroundedLookup::demo())
        }
    };

    let service = Arc::new(DraftingService::new(
        DraftingEngine::new(extractor),
        storage.clone(),
    ));
    info!(simulated = service.is_simulated(), "drafting service ready");

    Ok(Components {
        storage,
        service,
        lookup,
    })
}
