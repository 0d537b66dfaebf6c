// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact persistence and claiming selection.
//!
//! Selection works like a crash-safe queue dequeue: eligible rows are read and
//! stamped with a claim token and lease expiry in one transaction. Rows with
//! an unexpired lease are invisible to other selections; an expired lease
//! (for example after a crash) makes the contact selectable again.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use warmup_core::types::{
    CampaignId, ClaimToken, Contact, ContactId, ContactPredicate, ContactQuery, ContactStatus,
};
use warmup_core::WarmupError;

use super::{format_ts, parse_opt_ts, parse_text};
use crate::database::{map_tr_err, Database};

const CONTACT_COLUMNS: &str = "id, campaign_id, email, status, emails_sent, send_attempts,
    next_send_at, active, published, unsubscribed";

fn contact_from_row(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: ContactId(row.get(0)?),
        campaign_id: CampaignId(row.get(1)?),
        email: row.get(2)?,
        status: parse_text(row, 3)?,
        emails_sent: row.get(4)?,
        send_attempts: row.get(5)?,
        next_send_at: parse_opt_ts(row, 6)?,
        active: row.get(7)?,
        published: row.get(8)?,
        unsubscribed: row.get(9)?,
    })
}

fn not_found(id: ContactId) -> WarmupError {
    WarmupError::NotFound {
        entity: "contact",
        id: id.to_string(),
    }
}

/// Insert a contact. Returns the new id.
pub async fn insert_contact(db: &Database, contact: &Contact) -> Result<ContactId, WarmupError> {
    let c = contact.clone();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.execute(
                "INSERT INTO contacts (campaign_id, email, status, emails_sent, send_attempts,
                    next_send_at, active, published, unsubscribed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    c.campaign_id.0,
                    c.email,
                    c.status.to_string(),
                    c.emails_sent,
                    c.send_attempts,
                    c.next_send_at.map(format_ts),
                    c.active,
                    c.published,
                    c.unsubscribed,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map(ContactId)
        .map_err(map_tr_err)
}

pub async fn load_contact(db: &Database, id: ContactId) -> Result<Contact, WarmupError> {
    db.connection()
        .call(move |conn| -> Result<Option<Contact>, rusqlite::Error> {
            let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1");
            conn.query_row(&sql, params![id.0], contact_from_row).optional()
        })
        .await
        .map_err(map_tr_err)?
        .ok_or_else(|| not_found(id))
}

/// Select and claim up to `query.limit` eligible contacts, ascending by id.
pub async fn select_and_claim(
    db: &Database,
    query: &ContactQuery,
) -> Result<Vec<Contact>, WarmupError> {
    let predicate = match query.predicate {
        ContactPredicate::FirstEmail => "status = 'pending' AND emails_sent = 0",
        ContactPredicate::FollowUp => {
            "status IN ('pending', 'scheduled') AND emails_sent > 0
             AND next_send_at IS NOT NULL AND next_send_at <= ?3"
        }
    };
    let sql = format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts
         WHERE campaign_id = ?1
           AND active = 1 AND published = 1 AND unsubscribed = 0
           AND send_attempts < ?2
           AND (claim_until IS NULL OR claim_until <= ?3)
           AND {predicate}
         ORDER BY id ASC
         LIMIT ?4"
    );
    let campaign = query.campaign_id.0;
    let max_attempts = query.max_attempts;
    let now = format_ts(query.now);
    let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
    let claim = query.claim.0.clone();
    let claim_until = format_ts(query.claim_until);

    db.connection()
        .call(move |conn| -> Result<Vec<Contact>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let contacts = {
                let mut stmt = tx.prepare(&sql)?;
                let rows = stmt.query_map(
                    params![campaign, max_attempts, now, limit],
                    contact_from_row,
                )?;
                rows.collect::<Result<Vec<_>, _>>()?
            };
            {
                let mut claim_stmt = tx.prepare(
                    "UPDATE contacts SET claim_token = ?1, claim_until = ?2 WHERE id = ?3",
                )?;
                for contact in &contacts {
                    claim_stmt.execute(params![claim, claim_until, contact.id.0])?;
                }
            }
            tx.commit()?;
            Ok(contacts)
        })
        .await
        .map_err(map_tr_err)
}

/// Clear every claim held under `claim`.
pub async fn release_claims(db: &Database, claim: &ClaimToken) -> Result<u64, WarmupError> {
    let claim = claim.0.clone();
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE contacts SET claim_token = NULL, claim_until = NULL
                 WHERE claim_token = ?1",
                params![claim],
            )
        })
        .await
        .map(|n| n as u64)
        .map_err(map_tr_err)
}

/// Extend the lease of every contact still held under `claim` to `until`.
pub async fn renew_claims(
    db: &Database,
    claim: &ClaimToken,
    until: DateTime<Utc>,
) -> Result<u64, WarmupError> {
    let claim = claim.0.clone();
    let until = format_ts(until);
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE contacts SET claim_until = ?2 WHERE claim_token = ?1",
                params![claim, until],
            )
        })
        .await
        .map(|n| n as u64)
        .map_err(map_tr_err)
}

/// Record a successful send and clear the claim.
///
/// Only applies while the contact is still held under `claim`; returns
/// `false` and changes nothing once another selection has taken it over.
pub async fn mark_sent(
    db: &Database,
    id: ContactId,
    claim: &ClaimToken,
    next_send_at: Option<DateTime<Utc>>,
    status: ContactStatus,
) -> Result<bool, WarmupError> {
    let claim = claim.0.clone();
    let next = next_send_at.map(format_ts);
    let status = status.to_string();
    let outcome = db
        .connection()
        .call(move |conn| -> Result<Option<bool>, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE contacts SET emails_sent = emails_sent + 1, send_attempts = 0,
                    next_send_at = ?3, status = ?4, claim_token = NULL, claim_until = NULL
                 WHERE id = ?1 AND claim_token = ?2",
                params![id.0, claim, next, status],
            )?;
            if changed > 0 {
                return Ok(Some(true));
            }
            let exists = conn
                .query_row("SELECT 1 FROM contacts WHERE id = ?1", params![id.0], |_| Ok(()))
                .optional()?;
            Ok(exists.map(|()| false))
        })
        .await
        .map_err(map_tr_err)?;
    outcome.ok_or_else(|| not_found(id))
}

/// Record a failed attempt and clear the claim.
pub async fn record_failure(db: &Database, id: ContactId) -> Result<(), WarmupError> {
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE contacts SET send_attempts = send_attempts + 1,
                    claim_token = NULL, claim_until = NULL
                 WHERE id = ?1",
                params![id.0],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

/// Contacts of `campaign` that have received at least one email.
pub async fn count_with_emails(db: &Database, campaign: CampaignId) -> Result<u64, WarmupError> {
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM contacts WHERE campaign_id = ?1 AND emails_sent > 0",
                params![campaign.0],
                |row| row.get(0),
            )
        })
        .await
        .map(|n| n.max(0) as u64)
        .map_err(map_tr_err)
}
