// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./warmup.toml` > `~/.config/warmup/warmup.toml` > `/etc/warmup/warmup.toml`,
//! with environment variable overrides via the `WARMUP_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::WarmupConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/warmup/warmup.toml";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "warmup.toml";

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/warmup/warmup.toml`
/// 3. `~/.config/warmup/warmup.toml`
/// 4. `./warmup.toml`
/// 5. `WARMUP_*` environment variables
pub fn load_config() -> Result<WarmupConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<WarmupConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WarmupConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WarmupConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WarmupConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(WarmupConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Path of the per-user configuration file, if the platform has a config dir.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("warmup").join(LOCAL_CONFIG_FILE))
}

/// Environment provider mapping `WARMUP_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the section prefix is split, so `WARMUP_SCHEDULER_MAX_SEND_ATTEMPTS`
/// maps to `scheduler.max_send_attempts`.
fn env_provider() -> Env {
    Env::prefixed("WARMUP_").map(|key| {
        key.as_str()
            .replacen("scheduler_", "scheduler.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("smtp_", "smtp.", 1)
            .into()
    })
}
