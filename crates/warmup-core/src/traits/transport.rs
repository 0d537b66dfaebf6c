// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mail transport trait for delivering a composed message.

use async_trait::async_trait;

use crate::error::WarmupError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Contact, Domain, ResolvedContent};

/// Delivers one message from a sending domain to a contact.
///
/// The sending domain is chosen by the planner and passed explicitly.
#[async_trait]
pub trait MailTransport: PluginAdapter {
    /// Send `content` to `contact` from `domain`, returning the transport message id.
    async fn send(
        &self,
        domain: &Domain,
        contact: &Contact,
        content: &ResolvedContent,
    ) -> Result<String, WarmupError>;
}
