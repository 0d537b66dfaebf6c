// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Warmup scheduling engine.

use thiserror::Error;

/// The primary error type used across all Warmup adapter traits and engine operations.
///
/// Expected scheduling outcomes (zero quota, an empty contact pool, a full
/// domain) are never represented here; they are plain values returned by the
/// engine.
#[derive(Debug, Error)]
pub enum WarmupError {
    /// Configuration errors (invalid TOML, unknown time zone, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Mail transport errors (connection refused, rejected recipient, bad address).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A campaign's persisted configuration failed validation at load time.
    #[error("invalid campaign {id}: {reason}")]
    InvalidCampaign { id: String, reason: String },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WarmupError {
    /// Shorthand for a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }
}
