// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Evidence integrity: content-addressed records hashed on receipt.

use denuncia_core::types::EvidenceRecord;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Hashes `bytes` and builds the record stored with the session.
pub fn record(bytes: &[u8], source_uri: &str, mime_type: &str) -> EvidenceRecord {
    EvidenceRecord {
        content_hash: sha256_hex(bytes),
        source_uri: source_uri.to_string(),
        mime_type: mime_type.to_string(),
        size_bytes: bytes.len() as u64,
        received_at: chrono::Utc::now().to_rfc3339(),
    }
}
