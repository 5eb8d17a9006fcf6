// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Denuncia drafting service.

use std::time::Duration;

use thiserror::Error;

/// Failure of the language-analysis capability (extraction or grounded lookup).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// Transport failure or an HTTP error status from the provider.
    #[error("network error{}: {message}", status_suffix(.status))]
    Network {
        /// HTTP status, when the provider answered at all.
        status: Option<u16>,
        message: String,
    },

    /// A single provider call exceeded its deadline.
    #[error("analysis call timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// The provider answered, but not with the structure we asked for.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// Provider rejected the credentials or the calling domain. Needs an operator.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The caller violated the extractor's input contract.
    #[error("invalid extraction input: {0}")]
    InvalidInput(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" ({code})"),
        None => String::new(),
    }
}

impl ExtractionError {
    /// Transient failures worth another attempt: connection errors, 429, 5xx and timeouts.
    pub fn is_retryable(&self) -> bool {
        match self {
            ExtractionError::Network { status: None, .. } => true,
            ExtractionError::Network {
                status: Some(status),
                ..
            } => *status == 429 || (500..600).contains(status),
            ExtractionError::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Strictly server-side failures (5xx) and timeouts, which are treated alike.
    pub fn is_server_error(&self) -> bool {
        match self {
            ExtractionError::Network {
                status: Some(status),
                ..
            } => (500..600).contains(status),
            ExtractionError::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns true for errors that must reach an operator unmasked.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ExtractionError::Configuration(_))
    }
}

/// The primary error type used across the Denuncia workspace.
#[derive(Debug, Error)]
pub enum DenunciaError {
    /// Configuration errors (invalid TOML, missing credentials, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (outbound delivery, media download).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Language-analysis capability failures.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Malformed inbound event, rejected at the boundary.
    #[error("validation error: {0}")]
    Validation(String),

    /// No drafting session exists for the given key.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DenunciaError {
    /// Returns true when this wraps a capability configuration failure.
    pub fn is_configuration(&self) -> bool {
        matches!(self, DenunciaError::Extraction(e) if e.is_configuration())
    }
}
