// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Denuncia drafting service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Denuncia configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DenunciaConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Gemini analysis provider settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Drafting engine resilience settings.
    #[serde(default)]
    pub drafting: DraftingConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Web chat HTTP API settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Twilio WhatsApp channel settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name used in logs and health output.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "denuncia".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Gemini REST API configuration.
///
/// When no API key is available the service runs in demo mode.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API key. Falls back to the `GEMINI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for both structured and grounded requests.
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Base URL of the Generative Language API.
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

/// Retry and deadline settings for every analysis call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DraftingConfig {
    /// Total attempts per provider call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each further retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Deadline for a single provider call.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

impl Default for DraftingConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_call_timeout_secs() -> u64 {
    30
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("denuncia").join("denuncia.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("denuncia.db"))
        .to_string_lossy()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP gateway configuration for the web chat API.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Whether `serve` starts the HTTP listener.
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Allowed CORS origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            host: default_gateway_host(),
            port: default_gateway_port(),
            cors_origins: Vec::new(),
        }
    }
}

fn default_gateway_enabled() -> bool {
    true
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3000
}

/// Twilio WhatsApp channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Mounts the webhook and starts the queue worker.
    #[serde(default)]
    pub enabled: bool,

    /// Twilio account SID. Falls back to `TWILIO_ACCOUNT_SID`.
    #[serde(default)]
    pub account_sid: Option<String>,

    /// Twilio auth token, used for both signatures and API calls.
    /// Falls back to `TWILIO_AUTH_TOKEN`.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Sender address, e.g. `whatsapp:+14155238886`.
    #[serde(default)]
    pub from_number: Option<String>,

    /// Public URL Twilio posts to; part of the signed payload.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Reject webhook calls without a valid `X-Twilio-Signature`.
    #[serde(default = "default_verify_signature")]
    pub verify_signature: bool,

    /// Base URL of the Twilio REST API.
    #[serde(default = "default_twilio_api_base")]
    pub api_base_url: String,

    /// Idle delay between queue polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            account_sid: None,
            auth_token: None,
            from_number: None,
            webhook_url: None,
            verify_signature: default_verify_signature(),
            api_base_url: default_twilio_api_base(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_verify_signature() -> bool {
    true
}

fn default_twilio_api_base() -> String {
    "https://api.twilio.com".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}
