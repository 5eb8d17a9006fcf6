// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned provider payloads.

use serde_json::json;

/// Builds the JSON text a well-behaved analysis provider returns for one turn.
pub fn extraction_json(
    message: &str,
    narrative: &str,
    competency: &str,
    legal_basis: &str,
    missing: &[&str],
    report_ready: bool,
) -> String {
    json!({
        "message": message,
        "draftNarrative": narrative,
        "competency": competency,
        "legalBasis": legal_basis,
        "missingElements": missing,
        "reportReady": report_ready,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_camel_case_fields() {
        let text = extraction_json("¿Cuándo?", "Se observó", "FEDERAL", "Art. 190", &["Time"], false);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["draftNarrative"], "Se observó");
        assert_eq!(value["missingElements"][0], "Time");
        assert_eq!(value["reportReady"], false);
    }
}
