// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp channel for the Denuncia drafting service, via Twilio.
//!
//! - [`webhook`]: signed inbound webhook that only validates and enqueues
//! - [`worker`]: queue consumer that applies messages to drafting sessions
//! - [`client`]: [`TwilioChannel`], the outbound [`ChannelAdapter`](denuncia_core::ChannelAdapter)

pub mod client;
pub mod payload;
pub mod signature;
pub mod webhook;
pub mod worker;

pub use client::TwilioChannel;
pub use payload::{MessageKind, NormalizedMessage, normalize};
pub use signature::{compute_signature, verify_signature};
pub use webhook::{QUEUE_NAME, SignaturePolicy, WebhookState, router};
pub use worker::{CONFIGURATION_REPLY, WhatsAppWorker};

use denuncia_config::model::WhatsAppConfig;

/// Chooses the webhook signature policy from configuration.
///
/// Verification needs both the auth token and the public webhook URL that
/// Twilio signs; the config validator enforces their presence.
pub fn signature_policy(config: &WhatsAppConfig) -> SignaturePolicy {
    match (&config.auth_token, &config.webhook_url) {
        (Some(auth_token), Some(public_url)) if config.verify_signature => SignaturePolicy::Verify {
            auth_token: auth_token.clone(),
            public_url: public_url.clone(),
        },
        _ => {
            tracing::warn!("Twilio signature verification disabled");
            SignaturePolicy::Disabled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_requires_token_url_and_flag() {
        let mut config = WhatsAppConfig {
            auth_token: Some("tok".into()),
            webhook_url: Some("https://x/webhooks/whatsapp".into()),
            ..WhatsAppConfig::default()
        };
        assert!(matches!(
            signature_policy(&config),
            SignaturePolicy::Verify { .. }
        ));

        config.verify_signature = false;
        assert!(matches!(signature_policy(&config), SignaturePolicy::Disabled));

        config.verify_signature = true;
        config.webhook_url = None;
        assert!(matches!(signature_policy(&config), SignaturePolicy::Disabled));
    }
}
