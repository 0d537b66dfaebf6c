// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-contact token substitution.

use warmup_core::types::{Campaign, Contact, ResolvedContent};
use warmup_core::ContentRenderer;

/// Replaces `{email}`, `{campaign}`, and `{day}` in subject and body.
///
/// `{day}` is the campaign day, not the day of the sequence entry in use.
///
/// Unknown tokens are left as written.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenRenderer;

impl TokenRenderer {
    fn substitute(template: &str, contact: &Contact, campaign: &Campaign, day: i64) -> String {
        template
            .replace("{email}", &contact.email)
            .replace("{campaign}", &campaign.name)
            .replace("{day}", &day.to_string())
    }
}

impl ContentRenderer for TokenRenderer {
    fn render(
        &self,
        content: &ResolvedContent,
        contact: &Contact,
        campaign: &Campaign,
        day: i64,
    ) -> ResolvedContent {
        ResolvedContent {
            subject: Self::substitute(&content.subject, contact, campaign, day),
            body: Self::substitute(&content.body, contact, campaign, day),
            sequence_day: content.sequence_day,
            match_kind: content.match_kind,
        }
    }
}
