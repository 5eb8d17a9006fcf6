// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./denuncia.toml` > `~/.config/denuncia/denuncia.toml` >
//! `/etc/denuncia/denuncia.toml` with environment variable overrides via `DENUNCIA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::DenunciaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/denuncia/denuncia.toml` (system-wide)
/// 3. `~/.config/denuncia/denuncia.toml` (user XDG config)
/// 4. `./denuncia.toml` (local directory)
/// 5. `DENUNCIA_*` environment variables
///
/// Well-known vendor variables (`GEMINI_API_KEY`, `TWILIO_*`) fill credentials
/// that are still unset afterwards.
pub fn load_config() -> Result<DenunciaConfig, figment::Error> {
    let mut config: DenunciaConfig = build_figment().extract()?;
    apply_credential_fallbacks(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<DenunciaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DenunciaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DenunciaConfig, figment::Error> {
    let mut config: DenunciaConfig = Figment::new()
        .merge(Serialized::defaults(DenunciaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()?;
    apply_credential_fallbacks(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(DenunciaConfig::default()))
        .merge(Toml::file("/etc/denuncia/denuncia.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("denuncia/denuncia.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("denuncia.toml"))
        .merge(env_provider())
}

/// Fill unset credentials from vendor-standard variables.
///
/// `lookup` resolves a variable name; blank values are ignored.
pub fn apply_credential_fallbacks<F>(config: &mut DenunciaConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let fetch = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if config.gemini.api_key.is_none() {
        config.gemini.api_key = fetch("GEMINI_API_KEY");
    }
    if config.whatsapp.account_sid.is_none() {
        config.whatsapp.account_sid = fetch("TWILIO_ACCOUNT_SID");
    }
    if config.whatsapp.auth_token.is_none() {
        config.whatsapp.auth_token = fetch("TWILIO_AUTH_TOKEN");
    }
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `DENUNCIA_GEMINI_API_KEY` must map to `gemini.api_key`,
/// not `gemini.api.key`.
fn env_provider() -> Env {
    Env::prefixed("DENUNCIA_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("gemini_", "gemini.", 1)
            .replacen("drafting_", "drafting.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("gateway_", "gateway.", 1)
            .replacen("whatsapp_", "whatsapp.", 1);
        mapped.into()
    })
}
