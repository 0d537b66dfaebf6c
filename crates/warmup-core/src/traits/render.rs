// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content rendering trait for per-contact token substitution.

use crate::types::{Campaign, Contact, ResolvedContent};

/// Pure string substitution applied to resolved content before dispatch.
pub trait ContentRenderer: Send + Sync {
    /// `day` is the campaign day of the send, which differs from
    /// `content.sequence_day` when the sequence list wrapped.
    fn render(
        &self,
        content: &ResolvedContent,
        contact: &Contact,
        campaign: &Campaign,
        day: i64,
    ) -> ResolvedContent;
}
