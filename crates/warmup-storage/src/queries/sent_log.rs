// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only sent log.

use chrono::{DateTime, Utc};
use rusqlite::params;
use warmup_core::types::{CampaignId, SendOutcome, SentLogEntry};
use warmup_core::WarmupError;

use super::format_ts;
use crate::database::{map_tr_err, Database};

pub async fn append(db: &Database, entry: &SentLogEntry) -> Result<(), WarmupError> {
    let e = entry.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO sent_log (domain_id, campaign_id, contact_id, sequence_day,
                    subject, body, sent_at, outcome, message_id, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    e.domain_id.0,
                    e.campaign_id.0,
                    e.contact_id.0,
                    e.sequence_day,
                    e.subject,
                    e.body,
                    format_ts(e.sent_at),
                    e.outcome.to_string(),
                    e.message_id,
                    e.error,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Successful sends of `campaign` logged at or after `since`.
pub async fn count_sent_since(
    db: &Database,
    campaign: CampaignId,
    since: DateTime<Utc>,
) -> Result<u64, WarmupError> {
    let since = format_ts(since);
    let sent = SendOutcome::Sent.to_string();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM sent_log
                 WHERE campaign_id = ?1 AND outcome = ?2 AND sent_at >= ?3",
                params![campaign.0, sent, since],
                |row| row.get(0),
            )
        })
        .await
        .map(|n| n.max(0) as u64)
        .map_err(map_tr_err)
}
