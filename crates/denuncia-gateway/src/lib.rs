// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the web chat.
//!
//! Exposes drafting sessions and the grounded helper lookups as a JSON API.
//! Other transports (the WhatsApp webhook) are merged into the same router
//! by the binary so the service listens on a single port.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ErrorResponse};
pub use server::{GatewayState, api_router, cors_layer, start_server, with_middleware};
