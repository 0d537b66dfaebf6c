// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Warmup scheduler.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Warmup configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WarmupConfig {
    /// Scheduler cadence, calendar zone, and dispatch limits.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// SMTP relay settings.
    #[serde(default)]
    pub smtp: SmtpConfig,
}

/// Scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Seconds between scheduler passes in `serve` mode.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// IANA time zone that defines "calendar day" for campaigns and domains.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Failed dispatch attempts after which a contact is no longer selected.
    #[serde(default = "default_max_send_attempts")]
    pub max_send_attempts: u32,

    /// Upper bound on sends per campaign in a single pass.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: u32,

    /// Timeout for one transport dispatch.
    #[serde(default = "default_dispatch_timeout_secs")]
    pub dispatch_timeout_secs: u64,

    /// Lease length of a contact claim; expired claims become selectable again.
    #[serde(default = "default_claim_lease_secs")]
    pub claim_lease_secs: u64,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timezone: default_timezone(),
            max_send_attempts: default_max_send_attempts(),
            max_batch_size: default_max_batch_size(),
            dispatch_timeout_secs: default_dispatch_timeout_secs(),
            claim_lease_secs: default_claim_lease_secs(),
            log_level: default_log_level(),
        }
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_max_send_attempts() -> u32 {
    3
}

fn default_max_batch_size() -> u32 {
    500
}

fn default_dispatch_timeout_secs() -> u64 {
    30
}

fn default_claim_lease_secs() -> u64 {
    600
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("warmup").join("warmup.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "warmup.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// SMTP relay configuration used by the mail transport.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SmtpConfig {
    /// Relay hostname.
    #[serde(default = "default_smtp_host")]
    pub host: String,

    /// Relay port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Relay username. `None` sends unauthenticated.
    #[serde(default)]
    pub username: Option<String>,

    /// Relay password.
    #[serde(default)]
    pub password: Option<String>,

    /// Upgrade the connection with STARTTLS.
    #[serde(default = "default_starttls")]
    pub starttls: bool,

    /// Local part of the sender address; the domain part is the sending domain.
    #[serde(default = "default_from_local_part")]
    pub from_local_part: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: None,
            password: None,
            starttls: default_starttls(),
            from_local_part: default_from_local_part(),
        }
    }
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_starttls() -> bool {
    true
}

fn default_from_local_part() -> String {
    "hello".to_string()
}
