// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalization of Twilio's flat form payload into a queueable message.

use denuncia_core::DenunciaError;
use serde::{Deserialize, Serialize};

/// What the citizen sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    Location,
}

/// Provider-independent form of one inbound WhatsApp message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMessage {
    pub provider: String,
    /// Sender address, e.g. `whatsapp:+5215512345678`.
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub body: Option<String>,
    pub kind: MessageKind,
    #[serde(default)]
    pub media_uri: Option<String>,
    #[serde(default)]
    pub media_content_type: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub external_message_id: Option<String>,
    pub timestamp: String,
}

impl NormalizedMessage {
    /// Drafting session key for this sender.
    pub fn session_key(&self) -> String {
        if self.from.starts_with("whatsapp:") {
            self.from.clone()
        } else {
            format!("whatsapp:{}", self.from)
        }
    }
}

fn field<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

fn coordinate(params: &[(String, String)], name: &str) -> Result<f64, DenunciaError> {
    let raw = field(params, name)
        .ok_or_else(|| DenunciaError::Validation(format!("location message without {name}")))?;
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DenunciaError::Validation(format!("{name} '{raw}' is not a number")))
}

/// Builds a [`NormalizedMessage`] from decoded webhook form fields.
///
/// The kind is `image` when `MediaUrl0` is present, else `location` when
/// `Latitude` is present, else `text`.
pub fn normalize(params: &[(String, String)]) -> Result<NormalizedMessage, DenunciaError> {
    let from = field(params, "From")
        .ok_or_else(|| DenunciaError::Validation("payload has no From".to_string()))?;

    let media_uri = field(params, "MediaUrl0").map(str::to_string);
    let kind = if media_uri.is_some() {
        MessageKind::Image
    } else if field(params, "Latitude").is_some() {
        MessageKind::Location
    } else {
        MessageKind::Text
    };

    let (lat, lng) = if kind == MessageKind::Location {
        (
            Some(coordinate(params, "Latitude")?),
            Some(coordinate(params, "Longitude")?),
        )
    } else {
        (None, None)
    };

    Ok(NormalizedMessage {
        provider: "twilio".to_string(),
        from: from.to_string(),
        to: field(params, "To").unwrap_or_default().to_string(),
        body: field(params, "Body").map(str::to_string),
        kind,
        media_uri,
        media_content_type: field(params, "MediaContentType0").map(str::to_string),
        lat,
        lng,
        external_message_id: field(params, "MessageSid").map(str::to_string),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
