// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign persistence. Growth plans and sequences are JSON columns.

use rusqlite::{params, OptionalExtension, Row};
use warmup_core::types::{
    Campaign, CampaignCounters, CampaignId, CampaignStatus, Content, DomainId, SendWindow,
};
use warmup_core::WarmupError;

use super::{
    format_date, format_ts, parse_count, parse_date, parse_json, parse_opt_ts, parse_text,
    to_sql_count,
};
use crate::database::{map_tr_err, Database};

const CAMPAIGN_COLUMNS: &str = "id, name, status, start_date, growth, sequences,
    fallback_subject, fallback_body, rotation, window_start_hour, window_end_hour,
    sent_count, delivered_count, opened_count, clicked_count, bounced_count,
    progress, completed_at";

fn campaign_from_row(row: &Row<'_>) -> rusqlite::Result<Campaign> {
    let window_start: Option<u8> = row.get(9)?;
    let window_end: Option<u8> = row.get(10)?;
    let send_window = match (window_start, window_end) {
        (Some(start_hour), Some(end_hour)) => Some(SendWindow {
            start_hour,
            end_hour,
        }),
        _ => None,
    };
    Ok(Campaign {
        id: CampaignId(row.get(0)?),
        name: row.get(1)?,
        status: parse_text(row, 2)?,
        start_date: parse_date(row, 3)?,
        growth: parse_json(row, 4)?,
        sequences: parse_json(row, 5)?,
        fallback: Content {
            subject: row.get(6)?,
            body: row.get(7)?,
        },
        domain_ids: Vec::new(),
        rotation: parse_text(row, 8)?,
        send_window,
        counters: CampaignCounters {
            sent: parse_count(row, 11)?,
            delivered: parse_count(row, 12)?,
            opened: parse_count(row, 13)?,
            clicked: parse_count(row, 14)?,
            bounced: parse_count(row, 15)?,
        },
        progress: row.get(16)?,
        completed_at: parse_opt_ts(row, 17)?,
    })
}

fn load_domain_ids(
    conn: &rusqlite::Connection,
    campaign: i64,
) -> rusqlite::Result<Vec<DomainId>> {
    let mut stmt = conn.prepare(
        "SELECT domain_id FROM campaign_domains WHERE campaign_id = ?1 ORDER BY position ASC",
    )?;
    let rows = stmt.query_map(params![campaign], |row| Ok(DomainId(row.get(0)?)))?;
    rows.collect()
}

fn encode_err(e: serde_json::Error) -> WarmupError {
    WarmupError::Storage {
        source: Box::new(e),
    }
}

/// Insert a campaign with its domain assignments. Returns the new id.
pub async fn insert_campaign(db: &Database, campaign: &Campaign) -> Result<CampaignId, WarmupError> {
    let growth = serde_json::to_string(&campaign.growth).map_err(encode_err)?;
    let sequences = serde_json::to_string(&campaign.sequences).map_err(encode_err)?;
    let c = campaign.clone();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO campaigns (name, status, start_date, growth, sequences,
                    fallback_subject, fallback_body, rotation, window_start_hour,
                    window_end_hour, sent_count, delivered_count, opened_count,
                    clicked_count, bounced_count, progress, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                params![
                    c.name,
                    c.status.to_string(),
                    format_date(c.start_date),
                    growth,
                    sequences,
                    c.fallback.subject,
                    c.fallback.body,
                    c.rotation.to_string(),
                    c.send_window.map(|w| w.start_hour),
                    c.send_window.map(|w| w.end_hour),
                    to_sql_count(c.counters.sent),
                    to_sql_count(c.counters.delivered),
                    to_sql_count(c.counters.opened),
                    to_sql_count(c.counters.clicked),
                    to_sql_count(c.counters.bounced),
                    c.progress,
                    c.completed_at.map(format_ts),
                ],
            )?;
            let id = tx.last_insert_rowid();
            for (position, domain) in c.domain_ids.iter().enumerate() {
                tx.execute(
                    "INSERT INTO campaign_domains (campaign_id, domain_id, position)
                     VALUES (?1, ?2, ?3)",
                    params![id, domain.0, position as i64],
                )?;
            }
            tx.commit()?;
            Ok(id)
        })
        .await
        .map(CampaignId)
        .map_err(map_tr_err)
}

/// Load a campaign with its domains in priority order.
pub async fn load_campaign(db: &Database, id: CampaignId) -> Result<Campaign, WarmupError> {
    let found = db
        .connection()
        .call(move |conn| -> Result<Option<Campaign>, rusqlite::Error> {
            let sql = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = ?1");
            let campaign = conn
                .query_row(&sql, params![id.0], campaign_from_row)
                .optional()?;
            match campaign {
                Some(mut campaign) => {
                    campaign.domain_ids = load_domain_ids(conn, id.0)?;
                    Ok(Some(campaign))
                }
                None => Ok(None),
            }
        })
        .await
        .map_err(map_tr_err)?;
    found.ok_or_else(|| WarmupError::NotFound {
        entity: "campaign",
        id: id.to_string(),
    })
}

/// Ids of campaigns in `status`, ascending.
pub async fn campaign_ids_with_status(
    db: &Database,
    status: CampaignStatus,
) -> Result<Vec<CampaignId>, WarmupError> {
    let status = status.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<CampaignId>, rusqlite::Error> {
            let mut stmt =
                conn.prepare("SELECT id FROM campaigns WHERE status = ?1 ORDER BY id ASC")?;
            let rows = stmt.query_map(params![status], |row| Ok(CampaignId(row.get(0)?)))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// All campaigns in `status`, ascending by id.
pub async fn campaigns_with_status(
    db: &Database,
    status: CampaignStatus,
) -> Result<Vec<Campaign>, WarmupError> {
    let status = status.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<Campaign>, rusqlite::Error> {
            let sql = format!(
                "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE status = ?1 ORDER BY id ASC"
            );
            let mut campaigns = {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![status], campaign_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            };
            for campaign in &mut campaigns {
                campaign.domain_ids = load_domain_ids(conn, campaign.id.0)?;
            }
            Ok(campaigns)
        })
        .await
        .map_err(map_tr_err)
}

/// Persist the mutable state of a campaign: status, progress, counters, completion.
pub async fn save_campaign(db: &Database, campaign: &Campaign) -> Result<(), WarmupError> {
    let c = campaign.clone();
    let updated = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE campaigns SET status = ?1, progress = ?2, sent_count = ?3,
                    delivered_count = ?4, opened_count = ?5, clicked_count = ?6,
                    bounced_count = ?7, completed_at = ?8,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?9",
                params![
                    c.status.to_string(),
                    c.progress,
                    to_sql_count(c.counters.sent),
                    to_sql_count(c.counters.delivered),
                    to_sql_count(c.counters.opened),
                    to_sql_count(c.counters.clicked),
                    to_sql_count(c.counters.bounced),
                    c.completed_at.map(format_ts),
                    c.id.0,
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if updated == 0 {
        return Err(WarmupError::NotFound {
            entity: "campaign",
            id: campaign.id.to_string(),
        });
    }
    Ok(())
}

/// Add `sent_delta` to the sent counter and raise progress to `progress`.
///
/// Progress only moves while the campaign is active and never decreases;
/// status and the other counters are left to their owners.
pub async fn record_progress(
    db: &Database,
    id: CampaignId,
    sent_delta: u64,
    progress: f64,
) -> Result<(), WarmupError> {
    let delta = to_sql_count(sent_delta);
    let updated = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE campaigns SET sent_count = sent_count + ?2,
                    progress = CASE WHEN status = 'active' THEN MAX(progress, ?3)
                                    ELSE progress END,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id.0, delta, progress],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if updated == 0 {
        return Err(WarmupError::NotFound {
            entity: "campaign",
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Move an active campaign to completed, stamping `at` unless already stamped.
///
/// Returns `false` when the stored campaign is not active (paused, already
/// completed, or missing).
pub async fn complete_campaign(
    db: &Database,
    id: CampaignId,
    at: chrono::DateTime<chrono::Utc>,
) -> Result<bool, WarmupError> {
    let at = format_ts(at);
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE campaigns SET status = 'completed', progress = 100.0,
                    completed_at = COALESCE(completed_at, ?2),
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND status = 'active'",
                params![id.0, at],
            )
        })
        .await
        .map(|n| n > 0)
        .map_err(map_tr_err)
}
