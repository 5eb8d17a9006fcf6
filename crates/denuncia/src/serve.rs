// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `denuncia serve` command implementation.
//!
//! Opens storage, builds the drafting service, and runs the HTTP server
//! (web chat API plus the WhatsApp webhook) and the WhatsApp worker until
//! SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use denuncia_config::DenunciaConfig;
use denuncia_core::DenunciaError;
use denuncia_core::traits::{ChannelAdapter, StorageAdapter};
use denuncia_gateway::GatewayState;
use denuncia_whatsapp::{TwilioChannel, WebhookState, WhatsAppWorker};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::runtime;

/// Runs the `denuncia serve` command.
pub async fn run_serve(config: DenunciaConfig) -> Result<(), DenunciaError> {
    init_tracing(&config.service.log_level);

    info!(name = %config.service.name, "starting denuncia serve");

    let components = runtime::build(&config).await?;
    let cancel = install_signal_handler();

    let mut app = Router::new();
    if config.gateway.enabled {
        let state = GatewayState::new(components.service.clone(), components.lookup.clone());
        app = app.merge(denuncia_gateway::api_router(state));
        info!("web chat API enabled");
    }

    let mut worker_handle = None;
    if config.whatsapp.enabled {
        let channel: Arc<dyn ChannelAdapter> = Arc::new(TwilioChannel::from_config(&config.whatsapp)?);
        app = app.merge(denuncia_whatsapp::router(WebhookState {
            storage: components.storage.clone(),
            signature: denuncia_whatsapp::signature_policy(&config.whatsapp),
        }));

        let worker = WhatsAppWorker::new(
            components.service.clone(),
            components.storage.clone(),
            channel,
            Duration::from_millis(config.whatsapp.poll_interval_ms),
        );
        let worker_cancel = cancel.clone();
        worker_handle = Some(tokio::spawn(async move { worker.run(worker_cancel).await }));
        info!("WhatsApp channel enabled");
    }

    if config.gateway.enabled || config.whatsapp.enabled {
        let app = denuncia_gateway::with_middleware(app, &config.gateway.cors_origins)?;
        if let Err(e) = denuncia_gateway::start_server(&config.gateway, app, cancel.clone()).await {
            error!(error = %e, "HTTP server failed");
            cancel.cancel();
        }
    } else {
        warn!("no transport enabled; waiting for shutdown signal");
        cancel.cancelled().await;
    }

    if let Some(handle) = worker_handle
        && let Err(e) = handle.await
    {
        error!(error = %e, "WhatsApp worker panicked");
    }

    components.storage.close().await?;
    info!("denuncia stopped");
    Ok(())
}

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {
                            info!("received SIGINT (Ctrl+C), initiating shutdown");
                        }
                        _ = sigterm.recv() => {
                            info!("received SIGTERM, initiating shutdown");
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, listening for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("denuncia={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
