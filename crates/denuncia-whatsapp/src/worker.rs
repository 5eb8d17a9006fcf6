// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue consumer that turns queued WhatsApp messages into drafting events.
//!
//! Each entry is processed under the sender's session lock (through
//! [`DraftingService::handle`]) and the reply is sent back over the channel.
//!
//! Ack/fail policy:
//! - success, degraded replies and rejected input: ack
//! - configuration failures: operator-facing log, citizen notice, ack
//! - media download and storage failures: fail (retried up to `max_attempts`)
//! - reply delivery failures after the session was saved: logged, ack

use std::sync::Arc;
use std::time::Duration;

use denuncia_core::traits::{ChannelAdapter, StorageAdapter};
use denuncia_core::types::{DraftingEvent, OutboundMessage, QueueEntry};
use denuncia_core::DenunciaError;
use denuncia_drafting::DraftingService;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::payload::{MessageKind, NormalizedMessage};
use crate::webhook::QUEUE_NAME;

/// Sent when the analysis capability is misconfigured.
pub const CONFIGURATION_REPLY: &str = "El servicio de análisis legal no está disponible en este momento. \
Ya avisamos al equipo técnico; por favor intenta más tarde.";

/// Sent when a message cannot be turned into a drafting event.
pub const UNSUPPORTED_REPLY: &str =
    "No pude procesar ese mensaje. Envía texto, tu ubicación o una imagen como evidencia.";

const DEFAULT_MIME: &str = "application/octet-stream";

/// What to do with a queue entry after processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    Retry,
}

/// Polls the inbound queue and drives the drafting service.
pub struct WhatsAppWorker {
    service: Arc<DraftingService>,
    storage: Arc<dyn StorageAdapter>,
    channel: Arc<dyn ChannelAdapter>,
    poll_interval: Duration,
}

impl WhatsAppWorker {
    pub fn new(
        service: Arc<DraftingService>,
        storage: Arc<dyn StorageAdapter>,
        channel: Arc<dyn ChannelAdapter>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            service,
            storage,
            channel,
            poll_interval,
        }
    }

    /// Runs until `cancel` fires. An empty queue is polled every `poll_interval`.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(queue = QUEUE_NAME, "WhatsApp worker started");
        loop {
            let processed = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.process_next() => result,
            };

            let idle = match processed {
                Ok(true) => false,
                Ok(false) => true,
                Err(e) => {
                    error!(error = %e, "queue poll failed");
                    true
                }
            };

            if idle {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
            }
        }
        info!("WhatsApp worker stopped");
    }

    /// Claims and processes at most one entry. Returns false when the queue was empty.
    pub async fn process_next(&self) -> Result<bool, DenunciaError> {
        let Some(entry) = self.storage.dequeue(QUEUE_NAME).await? else {
            return Ok(false);
        };

        match self.process(&entry).await {
            Disposition::Ack => self.storage.ack(entry.id).await?,
            Disposition::Retry => {
                warn!(queue_id = entry.id, attempts = entry.attempts + 1, "queue entry will be retried");
                self.storage.fail(entry.id).await?;
            }
        }
        Ok(true)
    }

    async fn process(&self, entry: &QueueEntry) -> Disposition {
        let message: NormalizedMessage = match serde_json::from_str(&entry.payload) {
            Ok(message) => message,
            Err(e) => {
                error!(queue_id = entry.id, error = %e, "dropping undecodable queue entry");
                return Disposition::Ack;
            }
        };
        debug!(queue_id = entry.id, from = %message.from, kind = ?message.kind, "processing WhatsApp message");

        let event = match self.to_event(&message).await {
            Ok(event) => event,
            Err(DenunciaError::Validation(reason)) => {
                warn!(from = %message.from, reason = %reason, "unsupported WhatsApp message");
                self.reply(&message, UNSUPPORTED_REPLY).await;
                return Disposition::Ack;
            }
            Err(e) => {
                warn!(from = %message.from, error = %e, "could not prepare drafting event");
                return Disposition::Retry;
            }
        };

        match self
            .service
            .handle(&message.session_key(), "whatsapp", event)
            .await
        {
            Ok(handled) => {
                self.reply(&message, &handled.reply).await;
                Disposition::Ack
            }
            Err(DenunciaError::Validation(reason)) => {
                warn!(from = %message.from, reason = %reason, "drafting rejected the message");
                self.reply(&message, UNSUPPORTED_REPLY).await;
                Disposition::Ack
            }
            Err(e) if e.is_configuration() => {
                error!(error = %e, "analysis capability misconfigured; operator action required");
                self.reply(&message, CONFIGURATION_REPLY).await;
                Disposition::Ack
            }
            Err(e) => {
                error!(from = %message.from, error = %e, "drafting failed");
                Disposition::Retry
            }
        }
    }

    async fn to_event(&self, message: &NormalizedMessage) -> Result<DraftingEvent, DenunciaError> {
        match message.kind {
            MessageKind::Text => Ok(DraftingEvent::TextTurn {
                text: message.body.clone().unwrap_or_default(),
            }),
            MessageKind::Location => match (message.lat, message.lng) {
                (Some(lat), Some(lng)) => Ok(DraftingEvent::Location {
                    lat,
                    lng,
                    address: None,
                }),
                _ => Err(DenunciaError::Validation(
                    "location message without coordinates".to_string(),
                )),
            },
            MessageKind::Image => {
                let uri = message.media_uri.as_deref().ok_or_else(|| {
                    DenunciaError::Validation("image message without media URL".to_string())
                })?;
                let media = self.channel.download_media(uri).await?;
                let mime_type = media
                    .mime_type
                    .or_else(|| message.media_content_type.clone())
                    .unwrap_or_else(|| DEFAULT_MIME.to_string());
                Ok(DraftingEvent::Evidence {
                    bytes: media.bytes,
                    source_uri: uri.to_string(),
                    mime_type,
                })
            }
        }
    }

    async fn reply(&self, message: &NormalizedMessage, body: &str) {
        let outbound = OutboundMessage {
            to: message.from.clone(),
            body: body.to_string(),
        };
        if let Err(e) = self.channel.send(outbound).await {
            error!(to = %message.from, error = %e, "failed to deliver WhatsApp reply");
        }
    }
}
