// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics rendered through miette.
//!
//! Figment reports what went wrong but not where. We re-read the TOML
//! sources to point at the offending key and suggest the closest valid one.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score above which a key counts as a likely typo.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// One problem found while loading or validating configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(denuncia::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest valid key, if any is similar enough.
        suggestion: Option<String>,
        /// Comma-separated keys accepted by the section.
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: {detail}")]
    #[diagnostic(code(denuncia::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(denuncia::config::missing_key),
        help("add `{key} = <value>` to denuncia.toml")
    )]
    MissingKey { key: String },

    /// An enabled feature needs a credential that no source provides.
    #[error("{feature} needs `{key}`")]
    #[diagnostic(
        code(denuncia::config::missing_credential),
        help("set `{key}` in denuncia.toml or export {env_var}")
    )]
    MissingCredential {
        /// Dotted key, e.g. `whatsapp.auth_token`.
        key: String,
        feature: String,
        env_var: String,
    },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(denuncia::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(denuncia::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Splits a figment error into one diagnostic per underlying failure.
///
/// `toml_sources` holds `(path, content)` pairs used to locate unknown keys.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let (span, src) = locate(&error, field, toml_sources).unzip();
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, expected),
                    valid_keys: expected.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.to_string(),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("found {actual}"),
                expected: expected.clone(),
            },
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

/// Span of `field` inside the file the error came from.
fn locate(
    error: &figment::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> Option<(SourceSpan, NamedSource<String>)> {
    let origin = match error.metadata.as_ref()?.source.as_ref()? {
        figment::Source::File(path) => path.display().to_string(),
        _ => return None,
    };
    let (path, content) = toml_sources.iter().find(|(p, _)| *p == origin)?;
    let offset = find_key_offset(content, &error.path, field)?;
    Some((
        SourceSpan::new(offset.into(), field.len()),
        NamedSource::new(path, content.clone()),
    ))
}

/// Byte offset of `field` as a key inside the table named by `path[0]`.
///
/// An empty `path` searches the top level. Returns `None` when the table
/// header or the key cannot be found.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = match path.first() {
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header)? + header.len()
        }
        None => 0,
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        let rest = &line[indent..];
        if rest.starts_with('[') && offset > start {
            // Next table: the key is not in this section.
            return None;
        }
        if let Some(after) = rest.strip_prefix(field)
            && after.trim_start().starts_with('=')
        {
            return Some(offset + indent);
        }
        offset += line.len();
    }
    None
}

/// Closest entry of `valid_keys` to `unknown` by Jaro-Winkler similarity.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Prints every error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_api_key_for_typo() {
        let valid = &["api_key", "model", "base_url"];
        assert_eq!(suggest_key("api_kye", valid), Some("api_key".to_string()));
    }

    #[test]
    fn suggests_webhook_url_for_typo() {
        let valid = &["enabled", "account_sid", "auth_token", "webhook_url"];
        assert_eq!(
            suggest_key("webhok_url", valid),
            Some("webhook_url".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        assert_eq!(suggest_key("zzzzzz", &["name", "log_level"]), None);
    }

    #[test]
    fn finds_key_inside_its_section() {
        let content = "[service]\nname = \"x\"\n\n[gemini]\nmodle = \"flash\"\n";
        let path = vec!["gemini".to_string()];
        let o = find_key_offset(content, &path, "modle").expect("key should be found");
        assert_eq!(&content[o..o + 5], "modle");
    }

    #[test]
    fn does_not_match_key_prefixes_or_other_sections() {
        let content = "[gemini]\nmodel_x = 1\n\n[drafting]\nmodel = 2\n";
        let path = vec!["gemini".to_string()];
        assert!(find_key_offset(content, &path, "model").is_none());
    }

    #[test]
    fn missing_section_has_no_offset() {
        let content = "[service]\nname = \"x\"\n";
        let path = vec!["gateway".to_string()];
        assert!(find_key_offset(content, &path, "port").is_none());
    }
}
