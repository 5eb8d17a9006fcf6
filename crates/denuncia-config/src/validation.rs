// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints that serde attributes cannot express and
//! collects every failure instead of stopping at the first.

use crate::diagnostic::ConfigError;
use crate::model::DenunciaConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors.
pub fn validate_config(config: &DenunciaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.service.log_level.trim().to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level `{}` must be one of: {}",
                config.service.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.gemini.model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "gemini.model must not be empty".to_string(),
        });
    }

    if !is_http_url(&config.gemini.base_url) {
        errors.push(ConfigError::Validation {
            message: format!(
                "gemini.base_url `{}` must start with http:// or https://",
                config.gemini.base_url
            ),
        });
    }

    if config.drafting.max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "drafting.max_attempts must be at least 1".to_string(),
        });
    }

    if config.drafting.call_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "drafting.call_timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.whatsapp.enabled {
        validate_whatsapp(config, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_whatsapp(config: &DenunciaConfig, errors: &mut Vec<ConfigError>) {
    let wa = &config.whatsapp;
    let feature = "whatsapp.enabled = true";

    if is_blank(wa.account_sid.as_deref()) {
        errors.push(ConfigError::MissingCredential {
            key: "whatsapp.account_sid".to_string(),
            feature: feature.to_string(),
            env_var: "TWILIO_ACCOUNT_SID".to_string(),
        });
    }
    if is_blank(wa.auth_token.as_deref()) {
        errors.push(ConfigError::MissingCredential {
            key: "whatsapp.auth_token".to_string(),
            feature: feature.to_string(),
            env_var: "TWILIO_AUTH_TOKEN".to_string(),
        });
    }
    if is_blank(wa.from_number.as_deref()) {
        errors.push(ConfigError::MissingCredential {
            key: "whatsapp.from_number".to_string(),
            feature: feature.to_string(),
            env_var: "DENUNCIA_WHATSAPP_FROM_NUMBER".to_string(),
        });
    }

    match wa.webhook_url.as_deref() {
        Some(url) if is_http_url(url) => {}
        Some(url) => errors.push(ConfigError::Validation {
            message: format!("whatsapp.webhook_url `{url}` must start with http:// or https://"),
        }),
        None if wa.verify_signature => errors.push(ConfigError::Validation {
            message: "whatsapp.webhook_url is required when verify_signature is enabled"
                .to_string(),
        }),
        None => {}
    }

    if wa.poll_interval_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "whatsapp.poll_interval_ms must be greater than 0".to_string(),
        });
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}
