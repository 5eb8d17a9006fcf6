// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the drafting engine, adapters, and transports.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Provider,
    Storage,
}

/// Identifier assigned by a channel to a delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

// --- Conversation ---

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Role name expected by the analysis provider (`user` / `model`).
    pub fn provider_role(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "model",
        }
    }
}

/// A single turn of the drafting dialogue. Insertion order is meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::now(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::now(Role::Assistant, text)
    }

    fn now(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

// --- Draft ---

/// Level of government with jurisdiction over the complaint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Competency {
    Municipal,
    Estatal,
    Federal,
    #[default]
    Unknown,
}

/// The four legally-required elements of a complaint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum FactCategory {
    /// When it happened.
    Time,
    /// What happened and how.
    Mode,
    /// Where it happened, beyond raw coordinates.
    Place,
    /// Who the alleged offender is.
    Responsibility,
}

impl FactCategory {
    /// All categories, in canonical order.
    pub const ALL: [FactCategory; 4] = [
        FactCategory::Time,
        FactCategory::Mode,
        FactCategory::Place,
        FactCategory::Responsibility,
    ];

    /// The full set, used whenever nothing is known yet.
    pub fn all() -> BTreeSet<FactCategory> {
        Self::ALL.into_iter().collect()
    }

    /// Parses a label as reported by the analysis provider.
    ///
    /// Accepts the English labels used in the instruction plus common
    /// Spanish equivalents, case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase();
        match normalized.as_str() {
            "time" | "tiempo" | "fecha" | "cuando" | "cuándo" => Some(FactCategory::Time),
            "mode" | "modo" | "descripcion" | "descripción" | "description" => {
                Some(FactCategory::Mode)
            }
            "place" | "lugar" | "ubicacion" | "ubicación" | "location" => {
                Some(FactCategory::Place)
            }
            "responsibility" | "responsable" | "responsabilidad" | "responsible" => {
                Some(FactCategory::Responsibility)
            }
            _ => None,
        }
    }

    /// Human-readable Spanish name, used in user-facing checklists.
    pub fn label_es(&self) -> &'static str {
        match self {
            FactCategory::Time => "Tiempo",
            FactCategory::Mode => "Modo",
            FactCategory::Place => "Lugar",
            FactCategory::Responsibility => "Responsable",
        }
    }
}

/// The structured complaint as known so far.
///
/// Only replaced by applying a new extraction result; transports never edit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredDraft {
    /// Formal, third-person narrative of the facts.
    pub narrative: String,
    pub competency: Competency,
    pub legal_basis: String,
    pub missing_facts: BTreeSet<FactCategory>,
}

impl Default for StructuredDraft {
    fn default() -> Self {
        Self {
            narrative: String::new(),
            competency: Competency::Unknown,
            legal_basis: String::new(),
            missing_facts: FactCategory::all(),
        }
    }
}

// --- Side-channel facts ---

/// GPS position shared by the citizen, fed to the extractor as context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationContext {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub address: Option<String>,
}

impl fmt::Display for LocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address.as_deref().map(str::trim) {
            Some(address) if !address.is_empty() => {
                write!(f, "{address} ({}, {})", self.lat, self.lng)
            }
            _ => write!(f, "({}, {})", self.lat, self.lng),
        }
    }
}

/// Content-addressed record of an uploaded attachment. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    /// Lowercase hex SHA-256 of the raw bytes.
    pub content_hash: String,
    pub source_uri: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// RFC 3339 timestamp of receipt.
    pub received_at: String,
}

// --- Session ---

/// Lifecycle of a drafting session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    #[default]
    Collecting,
    ReportReady,
}

/// One citizen interaction: transcript, draft, evidence, and location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftingSession {
    /// Session key, e.g. `web:<uuid>` or `whatsapp:+5215512345678`.
    pub id: String,
    /// Transport that created the session.
    pub channel: String,
    pub history: Vec<ConversationTurn>,
    pub draft: StructuredDraft,
    pub evidence: Vec<EvidenceRecord>,
    pub location: Option<LocationContext>,
    pub status: SessionStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl DraftingSession {
    /// Creates an empty session in the `COLLECTING` state.
    pub fn new(id: impl Into<String>, channel: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: id.into(),
            channel: channel.into(),
            history: Vec::new(),
            draft: StructuredDraft::default(),
            evidence: Vec::new(),
            location: None,
            status: SessionStatus::Collecting,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn is_report_ready(&self) -> bool {
        self.status == SessionStatus::ReportReady
    }

    /// Stamps `updated_at` with the current time.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// An inbound event normalized by a transport adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftingEvent {
    /// The citizen typed or sent a message.
    TextTurn { text: String },
    /// The citizen shared a position.
    Location {
        lat: f64,
        lng: f64,
        address: Option<String>,
    },
    /// The citizen attached a file.
    Evidence {
        bytes: Vec<u8>,
        source_uri: String,
        mime_type: String,
    },
}

impl DraftingEvent {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            DraftingEvent::TextTurn { .. } => "text",
            DraftingEvent::Location { .. } => "location",
            DraftingEvent::Evidence { .. } => "evidence",
        }
    }
}

// --- Extraction ---

/// Recoverable oddities found while validating an extraction response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionWarning {
    /// The competency was outside the enum and was coerced to `UNKNOWN`.
    UnknownCompetency(String),
    /// A missing-element label matched no fact category and was ignored.
    UnknownFactCategory(String),
}

/// Validated output of one extractor call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Conversational reply for the citizen.
    pub message: String,
    /// Full formal narrative accumulated so far.
    pub draft_narrative: String,
    pub competency: Competency,
    pub legal_basis: String,
    pub missing_elements: Vec<FactCategory>,
    /// The extractor judged the complaint complete.
    pub report_ready: bool,
    pub warnings: Vec<ExtractionWarning>,
    /// Produced without an analysis provider (demo mode).
    pub simulated: bool,
}

// --- Analysis provider wire types ---

/// One role-tagged turn as sent to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderTurn {
    /// `user` or `model`.
    pub role: String,
    pub text: String,
}

/// Structured (JSON-schema constrained) analysis request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub system_instruction: Option<String>,
    pub turns: Vec<ProviderTurn>,
    /// JSON schema the response must satisfy.
    pub response_schema: serde_json::Value,
}

/// Raw structured response; validation happens in the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResponse {
    pub text: String,
}

/// Live retrieval tool to ground a request with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RetrievalTool {
    WebSearch,
    MapSearch,
}

/// Retrieval-augmented request. Cannot be combined with JSON-schema mode.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundedRequest {
    pub prompt: String,
    pub tool: RetrievalTool,
}

/// Source of a grounding citation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Web,
    Maps,
}

/// A citation attached to a grounded response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    pub uri: String,
    pub title: String,
    pub kind: ChunkKind,
}

/// Free-text grounded answer with its citations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroundedResponse {
    pub text: String,
    pub chunks: Vec<GroundingChunk>,
}

// --- Queue ---

/// A persisted work-queue entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: i64,
    pub queue_name: String,
    pub payload: String,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub created_at: String,
    pub updated_at: String,
    pub locked_until: Option<String>,
}

// --- Channel ---

/// A reply to deliver through a messaging channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Recipient address, e.g. `whatsapp:+5215512345678`.
    pub to: String,
    pub body: String,
}

/// Downloaded attachment bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaContent {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}
