// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twilio REST client: outbound WhatsApp messages and media downloads.

use std::time::Duration;

use async_trait::async_trait;
use denuncia_config::model::WhatsAppConfig;
use denuncia_core::traits::{ChannelAdapter, PluginAdapter};
use denuncia_core::types::{AdapterType, HealthStatus, MediaContent, MessageId, OutboundMessage};
use denuncia_core::DenunciaError;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, info};

/// Subset of Twilio's message resource.
#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
}

fn channel_err(message: String, source: reqwest::Error) -> DenunciaError {
    DenunciaError::Channel {
        message,
        source: Some(Box::new(source)),
    }
}

/// WhatsApp channel backed by the Twilio Messages API.
#[derive(Debug, Clone)]
pub struct TwilioChannel {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    api_base_url: String,
}

impl TwilioChannel {
    pub fn new(
        account_sid: String,
        auth_token: String,
        from_number: String,
        api_base_url: String,
    ) -> Result<Self, DenunciaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DenunciaError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            account_sid,
            auth_token,
            from_number,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds the channel from the `[whatsapp]` section.
    pub fn from_config(config: &WhatsAppConfig) -> Result<Self, DenunciaError> {
        let required = |value: &Option<String>, key: &str| {
            value
                .clone()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| DenunciaError::Config(format!("whatsapp.{key} is required")))
        };
        let channel = Self::new(
            required(&config.account_sid, "account_sid")?,
            required(&config.auth_token, "auth_token")?,
            required(&config.from_number, "from_number")?,
            config.api_base_url.clone(),
        )?;
        info!(from = %channel.from_number, "Twilio WhatsApp channel initialized");
        Ok(channel)
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base_url, self.account_sid
        )
    }
}

#[async_trait]
impl PluginAdapter for TwilioChannel {
    fn name(&self) -> &str {
        "twilio-whatsapp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, DenunciaError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DenunciaError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TwilioChannel {
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, DenunciaError> {
        let form = serde_urlencoded::to_string([
            ("From", self.from_number.as_str()),
            ("To", msg.to.as_str()),
            ("Body", msg.body.as_str()),
        ])
        .map_err(|e| DenunciaError::Internal(format!("failed to encode reply: {e}")))?;

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await
            .map_err(|e| channel_err(format!("Twilio request failed: {e}"), e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| channel_err(format!("failed to read Twilio response: {e}"), e))?;

        if !status.is_success() {
            return Err(DenunciaError::Channel {
                message: format!("Twilio returned {status}: {body}"),
                source: None,
            });
        }

        let resource: MessageResource =
            serde_json::from_str(&body).map_err(|e| DenunciaError::Channel {
                message: format!("unexpected Twilio response: {e}"),
                source: Some(Box::new(e)),
            })?;
        debug!(sid = %resource.sid, to = %msg.to, "WhatsApp reply sent");
        Ok(MessageId(resource.sid))
    }

    async fn download_media(&self, uri: &str) -> Result<MediaContent, DenunciaError> {
        let response = self
            .client
            .get(uri)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await
            .map_err(|e| channel_err(format!("media download failed: {e}"), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DenunciaError::Channel {
                message: format!("media download returned {status}"),
                source: None,
            });
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| channel_err(format!("failed to read media body: {e}"), e))?;

        debug!(uri, size = bytes.len(), "media downloaded");
        Ok(MediaContent {
            bytes: bytes.to_vec(),
            mime_type,
        })
    }
}
