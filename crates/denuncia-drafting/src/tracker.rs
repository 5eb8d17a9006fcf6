// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Missing-fact tracking.

use std::collections::BTreeSet;

use denuncia_core::types::{EvidenceRecord, FactCategory, StructuredDraft};

/// Narratives shorter than this (trimmed, in characters) cover nothing.
pub const MIN_NARRATIVE_CHARS: usize = 20;

/// Computes the fact categories still missing from `draft`.
///
/// The set reported by the extractor is authoritative, except that a
/// narrative under [`MIN_NARRATIVE_CHARS`] marks every category missing.
/// Evidence never satisfies a category on its own.
pub fn compute_missing(
    draft: &StructuredDraft,
    _evidence: &[EvidenceRecord],
) -> BTreeSet<FactCategory> {
    if draft.narrative.trim().chars().count() < MIN_NARRATIVE_CHARS {
        return FactCategory::all();
    }
    draft.missing_facts.clone()
}
