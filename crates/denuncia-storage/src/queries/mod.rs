// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed queries over the storage tables.

pub mod queue;
pub mod sessions;
