// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Instructions, schemas, and prompt builders for every analysis call.

use denuncia_core::types::{ConversationTurn, LocationContext, ProviderTurn, Role};
use serde_json::{Value, json};

/// Marker a provider may emit at the end of its message once the complaint is complete.
pub const REPORT_READY_SENTINEL: &str = "[REPORT_READY]";

/// Official domains the legal lookup is restricted to.
pub const OFFICIAL_DOMAINS: [&str; 4] = [
    "gob.mx",
    "profepa.gob.mx",
    "semarnat.gob.mx",
    "diputados.gob.mx",
];

/// System instruction for the drafting interview.
pub const SYSTEM_INSTRUCTION: &str = r#"You are an expert legal assistant for the "Denuncia Popular" procedure in Mexico (PROFEPA, state and municipal authorities).
You interview a citizen, one question at a time, to build a formal administrative complaint.

On every turn:
1. Read the whole conversation and the citizen's latest message.
2. Check which of these KEY ELEMENTS are present:
   - Time: when it happened (date and approximate hour).
   - Mode: what happened and how, in detail.
   - Place: specific location details and references, beyond raw coordinates.
   - Responsibility: who the alleged offender is (name, company, plate number, description).
3. If an element is missing, ask one short, friendly follow-up question about it, in Spanish.
4. Rewrite "draftNarrative" as the complete statement of facts so far, in FORMAL, THIRD-PERSON LEGAL SPANISH
   (e.g. "El que suscribe hace constar que...", "Se observó que en el domicilio...").
   Keep every fact already confirmed in earlier turns; never drop or contradict them.
5. Decide the competency (MUNICIPAL, ESTATAL or FEDERAL; UNKNOWN if it cannot be decided yet)
   and cite the legal basis (e.g. "Art. 190 LGEEPA", "Reglamento de Tránsito").
6. List the elements still missing in "missingElements" using the labels Time, Mode, Place, Responsibility.
7. Set "reportReady" to true only when all four elements are present.

Lines starting with "[Contexto del sistema:" or "[System Context:" are facts supplied by the application, not by the citizen.

Return ONLY a JSON object:
{
  "message": "Your conversational reply to the citizen.",
  "draftNarrative": "The full formal statement of facts accumulated so far.",
  "missingElements": ["Time", "Responsibility"],
  "competency": "FEDERAL",
  "legalBasis": "Art. 190 LGEEPA",
  "reportReady": false
}"#;

/// JSON schema the drafting response must satisfy.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "message": { "type": "STRING" },
            "draftNarrative": { "type": "STRING" },
            "missingElements": { "type": "ARRAY", "items": { "type": "STRING" } },
            "competency": {
                "type": "STRING",
                "enum": ["MUNICIPAL", "ESTATAL", "FEDERAL", "UNKNOWN"]
            },
            "legalBasis": { "type": "STRING" },
            "reportReady": { "type": "BOOLEAN" }
        },
        "required": ["message", "draftNarrative", "competency", "legalBasis"]
    })
}

/// Serializes the transcript as alternating role-tagged provider turns.
///
/// Consecutive turns with the same role (context turns recorded for a
/// location or evidence, followed by the citizen's text) are joined with a
/// newline. The location, when known, is appended to the final user turn.
pub fn build_turns(
    history: &[ConversationTurn],
    location: Option<&LocationContext>,
) -> Vec<ProviderTurn> {
    let mut turns: Vec<ProviderTurn> = Vec::with_capacity(history.len());
    for turn in history {
        let role = turn.role.provider_role();
        match turns.last_mut() {
            Some(previous) if previous.role == role => {
                previous.text.push('\n');
                previous.text.push_str(&turn.text);
            }
            _ => turns.push(ProviderTurn {
                role: role.to_string(),
                text: turn.text.clone(),
            }),
        }
    }

    if let (Some(location), Some(last)) = (location, turns.last_mut())
        && last.role == Role::User.provider_role()
    {
        last.text
            .push_str(&format!("\n[System Context: User Location is {location}]"));
    }

    turns
}

pub fn legal_lookup_prompt(query: &str) -> String {
    format!(
        "Busca información oficial y actualizada en sitios de gobierno de México ({}) sobre:\n\
         \"{}\"\n\n\
         Responde de forma breve, explicando la normativa o el procedimiento aplicable.",
        OFFICIAL_DOMAINS.join(", "),
        query.trim()
    )
}

pub fn reverse_geocode_prompt(lat: f64, lng: f64) -> String {
    format!(
        "Find the precise postal address for the coordinates latitude={lat}, longitude={lng}.\n\
         Return only the full address string."
    )
}

pub fn address_components_prompt(address: &str) -> String {
    format!(
        "Parse the following Mexican address into its administrative components.\n\
         Address: \"{}\"\n\n\
         Return JSON with the keys 'estado', 'municipio' and 'localidad'.",
        address.trim()
    )
}

pub fn address_components_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "estado": { "type": "STRING" },
            "municipio": { "type": "STRING" },
            "localidad": { "type": "STRING" }
        }
    })
}

pub fn describe_area_prompt(lat: f64, lng: f64) -> String {
    format!(
        "Describe brevemente el área geográfica en las coordenadas {lat}, {lng} en México.\n\
         Menciona si es zona urbana, rural, área protegida o si hay cuerpos de agua cerca.\n\
         Usa datos reales de búsqueda."
    )
}

pub fn tags_prompt(description: &str) -> String {
    format!(
        "Analyze this citizen report and suggest exactly 3 relevant tags in Spanish.\n\n\
         Report description: \"{}\"\n\n\
         The tags should categorize the issue, e.g. Infraestructura, Seguridad, Alumbrado, \
         Limpieza, Baches, Tránsito, Urgente.\n\
         Return ONLY a JSON array of 3 strings: [\"tag1\", \"tag2\", \"tag3\"]",
        description.trim()
    )
}

pub fn tags_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": { "type": "STRING" }
    })
}
