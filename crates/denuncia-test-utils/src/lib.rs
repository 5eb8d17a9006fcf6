// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Denuncia integration tests.
//!
//! Provides mock adapters for fast, deterministic tests without external
//! services.
//!
//! # Components
//!
//! - [`MockProvider`] - Scripted analysis provider with call counting
//! - [`MockChannel`] - Messaging channel capturing outbound replies
//! - [`MemoryStorage`] - In-memory sessions and work queue
//! - [`extraction_json`] - Builds a well-formed extractor response

pub mod fixtures;
pub mod memory_storage;
pub mod mock_channel;
pub mod mock_provider;

pub use fixtures::extraction_json;
pub use memory_storage::MemoryStorage;
pub use mock_channel::MockChannel;
pub use mock_provider::MockProvider;
