// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives shared by every capability call.

pub mod retry;

pub use retry::RetryPolicy;
