// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock mail transport for deterministic testing.
//!
//! `MockTransport` implements `MailTransport`, captures every successful send
//! for assertion, and fails sends to scripted recipients.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use warmup_core::traits::adapter::PluginAdapter;
use warmup_core::traits::transport::MailTransport;
use warmup_core::types::{AdapterType, Contact, Domain, HealthStatus, ResolvedContent};
use warmup_core::WarmupError;

use crate::clock::ManualClock;

/// A message accepted by the mock transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedSend {
    /// Hostname of the sending domain.
    pub domain: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub message_id: String,
}

#[derive(Default)]
struct Script {
    failing: HashSet<String>,
    fail_all: bool,
    delay: Option<Duration>,
    /// Scheduling time that passes during each send.
    clock_step: Option<(Arc<ManualClock>, chrono::Duration)>,
    attempts: usize,
}

/// A mail transport that records instead of delivering.
pub struct MockTransport {
    sent: Mutex<Vec<CapturedSend>>,
    script: Mutex<Script>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            script: Mutex::new(Script::default()),
        }
    }

    /// Fail every send to `email`.
    pub async fn fail_for(&self, email: &str) {
        self.script.lock().await.failing.insert(email.to_string());
    }

    /// Fail every send while `fail` is set.
    pub async fn fail_all(&self, fail: bool) {
        self.script.lock().await.fail_all = fail;
    }

    /// Sleep for `delay` before answering each send.
    pub async fn set_delay(&self, delay: Duration) {
        self.script.lock().await.delay = Some(delay);
    }

    /// Advance `clock` by `step` as each send starts, simulating a slow relay.
    pub async fn advance_clock_per_send(&self, clock: Arc<ManualClock>, step: chrono::Duration) {
        self.script.lock().await.clock_step = Some((clock, step));
    }

    /// Get all messages that were sent successfully.
    pub async fn sent_messages(&self) -> Vec<CapturedSend> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Number of send calls, successful or not.
    pub async fn attempt_count(&self) -> usize {
        self.script.lock().await.attempts
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, WarmupError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WarmupError> {
        Ok(())
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn send(
        &self,
        domain: &Domain,
        contact: &Contact,
        content: &ResolvedContent,
    ) -> Result<String, WarmupError> {
        let (fail, delay) = {
            let mut script = self.script.lock().await;
            script.attempts += 1;
            if let Some((clock, step)) = &script.clock_step {
                clock.advance(*step);
            }
            (
                script.fail_all || script.failing.contains(&contact.email),
                script.delay,
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(WarmupError::transport(format!(
                "mock rejected recipient {}",
                contact.email
            )));
        }

        let message_id = format!("<{}@{}>", uuid::Uuid::new_v4(), domain.hostname);
        self.sent.lock().await.push(CapturedSend {
            domain: domain.hostname.clone(),
            to: contact.email.clone(),
            subject: content.subject.clone(),
            body: content.body.clone(),
            message_id: message_id.clone(),
        });
        tracing::debug!(to = %contact.email, domain = %domain.hostname, "mock send captured");
        Ok(message_id)
    }
}
