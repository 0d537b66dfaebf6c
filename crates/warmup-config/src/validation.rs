// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use chrono_tz::Tz;

use crate::diagnostic::ConfigError;
use crate::model::WarmupConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &WarmupConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let scheduler = &config.scheduler;
    if scheduler.interval_secs == 0 {
        fail("scheduler.interval_secs must be greater than 0".to_string());
    }
    if scheduler.timezone.parse::<Tz>().is_err() {
        fail(format!(
            "scheduler.timezone `{}` is not a known IANA time zone",
            scheduler.timezone
        ));
    }
    if scheduler.max_send_attempts < 1 {
        fail("scheduler.max_send_attempts must be at least 1".to_string());
    }
    if scheduler.max_batch_size < 1 {
        fail("scheduler.max_batch_size must be at least 1".to_string());
    }
    if scheduler.dispatch_timeout_secs == 0 {
        fail("scheduler.dispatch_timeout_secs must be greater than 0".to_string());
    }
    if scheduler.claim_lease_secs <= scheduler.dispatch_timeout_secs {
        fail(format!(
            "scheduler.claim_lease_secs ({}) must exceed scheduler.dispatch_timeout_secs ({})",
            scheduler.claim_lease_secs, scheduler.dispatch_timeout_secs
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.smtp.host.trim().is_empty() {
        fail("smtp.host must not be empty".to_string());
    }
    if config.smtp.from_local_part.trim().is_empty() || config.smtp.from_local_part.contains('@')
    {
        fail(format!(
            "smtp.from_local_part `{}` must be a non-empty local part without `@`",
            config.smtp.from_local_part
        ));
    }
    if config.smtp.password.is_some() && config.smtp.username.is_none() {
        fail("smtp.password is set but smtp.username is missing".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&WarmupConfig::default()).is_ok());
    }

    #[test]
    fn unknown_timezone_fails_validation() {
        let mut config = WarmupConfig::default();
        config.scheduler.timezone = "Mars/Olympus".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "scheduler.timezone"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = WarmupConfig::default();
        config.scheduler.interval_secs = 0;
        config.scheduler.max_send_attempts = 0;
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(has_message(&errors, "interval_secs"));
        assert!(has_message(&errors, "max_send_attempts"));
        assert!(has_message(&errors, "database_path"));
    }

    #[test]
    fn lease_must_outlast_dispatch_timeout() {
        let mut config = WarmupConfig::default();
        config.scheduler.dispatch_timeout_secs = 60;
        config.scheduler.claim_lease_secs = 30;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "claim_lease_secs"));
    }

    #[test]
    fn from_local_part_rejects_full_address() {
        let mut config = WarmupConfig::default();
        config.smtp.from_local_part = "hello@example.com".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "from_local_part"));
    }

    #[test]
    fn named_timezone_passes() {
        let mut config = WarmupConfig::default();
        config.scheduler.timezone = "Europe/Berlin".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
