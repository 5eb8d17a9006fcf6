// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Denuncia complaint drafting service.
//!
//! This crate provides the data model, error types, and adapter traits
//! shared by the drafting engine and every transport and backend.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{DenunciaError, ExtractionError};
pub use types::{
    AdapterType, AnalysisRequest, AnalysisResponse, ChunkKind, Competency, ConversationTurn,
    DraftingEvent, DraftingSession, EvidenceRecord, ExtractionResult, ExtractionWarning,
    FactCategory, GroundedRequest, GroundedResponse, GroundingChunk, HealthStatus,
    LocationContext, MediaContent, MessageId, OutboundMessage, ProviderTurn, QueueEntry,
    RetrievalTool, Role, SessionStatus, StructuredDraft,
};

pub use traits::{AnalysisProvider, ChannelAdapter, PluginAdapter, StorageAdapter};
