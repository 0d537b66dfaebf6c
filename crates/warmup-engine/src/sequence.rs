// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sequence rotation: which content a campaign sends on a given day.

use warmup_core::types::{Content, MatchKind, ResolvedContent, Sequence};

/// Choose the content for campaign `day`.
///
/// An exact day match wins; otherwise the list is indexed with
/// `(day - 1) mod len`. With no sequences the fallback content is used.
pub fn select(day: i64, sequences: &[Sequence], fallback: &Content) -> ResolvedContent {
    if sequences.is_empty() {
        return ResolvedContent {
            subject: fallback.subject.clone(),
            body: fallback.body.clone(),
            sequence_day: day,
            match_kind: MatchKind::NoneConfigured,
        };
    }

    if let Some(sequence) = sequences.iter().find(|s| s.day == day) {
        return resolved(sequence, MatchKind::ExactMatch);
    }

    let index = (day - 1).rem_euclid(sequences.len() as i64) as usize;
    resolved(&sequences[index], MatchKind::Wrapped)
}

/// The first configured sequence day after `day`, if any.
pub fn next_sequence_day(day: i64, sequences: &[Sequence]) -> Option<i64> {
    sequences.iter().map(|s| s.day).filter(|d| *d > day).min()
}

fn resolved(sequence: &Sequence, match_kind: MatchKind) -> ResolvedContent {
    ResolvedContent {
        subject: sequence.subject.clone(),
        body: sequence.body.clone(),
        sequence_day: sequence.day,
        match_kind,
    }
}
