// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for outbound messaging transports.

use async_trait::async_trait;

use crate::error::DenunciaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{MediaContent, MessageId, OutboundMessage};

/// Adapter for messaging channels (WhatsApp, etc.).
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Delivers a reply to the citizen.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, DenunciaError>;

    /// Downloads an attachment referenced by an inbound message.
    async fn download_media(&self, uri: &str) -> Result<MediaContent, DenunciaError>;
}
