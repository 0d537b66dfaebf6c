// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP mail transport for the Warmup scheduling engine.
//!
//! Sends plain-text messages through a configured relay with lettre. The
//! sender address is `{from_local_part}@{hostname}` of the sending domain the
//! planner picked, and every message carries a generated `Message-ID` in that
//! domain, which is also the id returned to the engine.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, warn};

use warmup_config::model::SmtpConfig;
use warmup_core::types::{AdapterType, Contact, Domain, HealthStatus, ResolvedContent};
use warmup_core::{MailTransport, PluginAdapter, WarmupError};

/// SMTP relay transport.
pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_local_part: String,
    relay: String,
}

impl SmtpTransport {
    /// Build a transport for the relay in `config`. No connection is made yet.
    pub fn new(config: &SmtpConfig) -> Result<Self, WarmupError> {
        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host).map_err(
                |e: lettre::transport::smtp::Error| {
                    WarmupError::Config(format!("invalid SMTP relay `{}`: {e}", config.host))
                },
            )?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        let builder = builder.port(config.port);
        let builder = match (&config.username, &config.password) {
            (Some(username), password) => builder.credentials(Credentials::new(
                username.clone(),
                password.clone().unwrap_or_default(),
            )),
            (None, _) => builder,
        };

        Ok(Self {
            mailer: builder.build(),
            from_local_part: config.from_local_part.clone(),
            relay: format!("{}:{}", config.host, config.port),
        })
    }
}

/// Compose the message for one dispatch. Returns the message and its `Message-ID`.
pub fn build_message(
    from_local_part: &str,
    domain: &Domain,
    contact: &Contact,
    content: &ResolvedContent,
) -> Result<(Message, String), WarmupError> {
    let from: Mailbox = format!("{from_local_part}@{}", domain.hostname)
        .parse()
        .map_err(|e: lettre::address::AddressError| {
            WarmupError::transport(format!("invalid sender for domain {}: {e}", domain.hostname))
        })?;
    let to: Mailbox = contact
        .email
        .parse()
        .map_err(|e: lettre::address::AddressError| {
            WarmupError::transport(format!("invalid recipient {}: {e}", contact.email))
        })?;
    let message_id = format!("<{}@{}>", uuid::Uuid::new_v4(), domain.hostname);

    let message = Message::builder()
        .message_id(Some(message_id.clone()))
        .from(from)
        .to(to)
        .subject(content.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(content.body.clone())
        .map_err(|e| WarmupError::Transport {
            message: format!("failed to build email: {e}"),
            source: Some(Box::new(e)),
        })?;
    Ok((message, message_id))
}

#[async_trait]
impl PluginAdapter for SmtpTransport {
    fn name(&self) -> &str {
        "smtp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, WarmupError> {
        match self.mailer.test_connection().await {
            Ok(true) => Ok(HealthStatus::Healthy),
            Ok(false) => Ok(HealthStatus::Unhealthy(format!(
                "relay {} did not accept the connection",
                self.relay
            ))),
            Err(e) => {
                warn!(relay = %self.relay, error = %e, "SMTP health check failed");
                Ok(HealthStatus::Unhealthy(e.to_string()))
            }
        }
    }

    async fn shutdown(&self) -> Result<(), WarmupError> {
        Ok(())
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(
        &self,
        domain: &Domain,
        contact: &Contact,
        content: &ResolvedContent,
    ) -> Result<String, WarmupError> {
        let (message, message_id) = build_message(&self.from_local_part, domain, contact, content)?;
        let response = self
            .mailer
            .send(message)
            .await
            .map_err(|e: lettre::transport::smtp::Error| WarmupError::Transport {
                message: format!("relay {} rejected message: {e}", self.relay),
                source: Some(Box::new(e)),
            })?;
        debug!(
            domain = %domain.hostname,
            contact_id = %contact.id,
            code = %response.code(),
            "message accepted by relay"
        );
        Ok(message_id)
    }
}
