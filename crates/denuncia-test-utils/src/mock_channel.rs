// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter capturing outbound replies.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use denuncia_core::DenunciaError;
use denuncia_core::traits::{ChannelAdapter, PluginAdapter};
use denuncia_core::types::{AdapterType, HealthStatus, MediaContent, MessageId, OutboundMessage};

/// A messaging channel for tests.
///
/// Messages passed to `send()` are captured; media downloads are served
/// from a map registered with `add_media()`.
pub struct MockChannel {
    sent: Mutex<Vec<OutboundMessage>>,
    media: Mutex<HashMap<String, MediaContent>>,
    fail_sends: Mutex<bool>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            media: Mutex::new(HashMap::new()),
            fail_sends: Mutex::new(false),
        }
    }

    /// Serve `bytes` for downloads of `uri`.
    pub async fn add_media(&self, uri: &str, bytes: Vec<u8>, mime_type: &str) {
        self.media.lock().await.insert(
            uri.to_string(),
            MediaContent {
                bytes,
                mime_type: Some(mime_type.to_string()),
            },
        );
    }

    /// Make every subsequent `send()` fail.
    pub async fn fail_sends(&self, fail: bool) {
        *self.fail_sends.lock().await = fail;
    }

    /// All messages passed to `send()`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
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
impl ChannelAdapter for MockChannel {
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, DenunciaError> {
        if *self.fail_sends.lock().await {
            return Err(DenunciaError::Channel {
                message: "mock send failure".to_string(),
                source: None,
            });
        }
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        self.sent.lock().await.push(msg);
        Ok(MessageId(id))
    }

    async fn download_media(&self, uri: &str) -> Result<MediaContent, DenunciaError> {
        self.media
            .lock()
            .await
            .get(uri)
            .cloned()
            .ok_or_else(|| DenunciaError::Channel {
                message: format!("no media registered for {uri}"),
                source: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_captures_outbound_messages() {
        let channel = MockChannel::new();
        let id = channel
            .send(OutboundMessage {
                to: "whatsapp:+5215512345678".into(),
                body: "hola".into(),
            })
            .await
            .unwrap();
        assert!(id.0.starts_with("mock-msg-"));
        assert_eq!(channel.sent_messages().await[0].body, "hola");
    }

    #[tokio::test]
    async fn unknown_media_is_an_error() {
        let channel = MockChannel::new();
        channel
            .add_media("https://media/1", b"img".to_vec(), "image/jpeg")
            .await;
        assert_eq!(
            channel.download_media("https://media/1").await.unwrap().bytes,
            b"img".to_vec()
        );
        assert!(channel.download_media("https://media/2").await.is_err());
    }

    #[tokio::test]
    async fn failing_sends_are_not_captured() {
        let channel = MockChannel::new();
        channel.fail_sends(true).await;
        let result = channel
            .send(OutboundMessage {
                to: "x".into(),
                body: "y".into(),
            })
            .await;
        assert!(result.is_err());
        assert_eq!(channel.sent_count().await, 0);
    }
}
