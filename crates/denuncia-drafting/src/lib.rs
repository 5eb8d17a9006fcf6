// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Complaint drafting state machine.
//!
//! Turns a citizen's conversational account, shared location, and uploaded
//! evidence into a structured "denuncia popular" draft:
//!
//! - [`FactExtractor`] asks the analysis provider for a validated draft update
//! - [`tracker`] decides which legal fact categories are still missing
//! - [`DraftingEngine`] applies one event to a session snapshot
//! - [`DraftingService`] serializes events per session and persists them
//! - [`GroundedLookup`] answers stateless, retrieval-grounded helper queries

pub mod engine;
pub mod evidence;
pub mod extractor;
pub mod locks;
pub mod lookup;
pub mod prompt;
pub mod service;
pub mod tracker;

pub use engine::{APOLOGY_REPLY, DraftingEngine, REPORT_READY_NOTICE, Transition};
pub use extractor::FactExtractor;
pub use locks::{SessionGuard, SessionLocks};
pub use lookup::{AddressComponents, GeocodedAddress, GroundedLookup, LegalInfo, LegalSource};
pub use service::{DraftingService, Handled};
