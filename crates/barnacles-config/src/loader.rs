// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./barnacles.toml` > `~/.config/barnacles/barnacles.toml` > `/etc/barnacles/barnacles.toml`
//! with environment variable overrides via `BARNACLES_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::BarnaclesConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/barnacles/barnacles.toml` (system-wide)
/// 3. `~/.config/barnacles/barnacles.toml` (user XDG config)
/// 4. `./barnacles.toml` (local directory)
/// 5. `BARNACLES_*` environment variables
pub fn load_config() -> Result<BarnaclesConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<BarnaclesConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BarnaclesConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BarnaclesConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BarnaclesConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(BarnaclesConfig::default()))
        .merge(Toml::file("/etc/barnacles/barnacles.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("barnacles/barnacles.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("barnacles.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `BARNACLES_TABLES_DYNAMB_TABLE`
/// must map to `tables.dynamb_table`, and top-level keys such as
/// `BARNACLES_PRINT_ERRORS` contain underscores of their own.
fn env_provider() -> Env {
    Env::prefixed("BARNACLES_").map(|key| {
        // `key` keeps the env var's case, with the prefix stripped.
        let mapped = key
            .as_str()
            .to_ascii_lowercase()
            .replacen("connection_", "connection.", 1)
            .replacen("tables_", "tables.", 1);
        mapped.into()
    })
}
