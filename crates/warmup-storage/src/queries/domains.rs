// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain persistence and the atomic daily counter.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};
use warmup_core::types::{Domain, DomainId};
use warmup_core::WarmupError;

use super::{format_date, parse_opt_date, parse_text};
use crate::database::{map_tr_err, Database};

const DOMAIN_COLUMNS: &str =
    "id, hostname, daily_limit, sent_today, active, verified, phase, timezone, last_reset_on";

fn domain_from_row(row: &Row<'_>) -> rusqlite::Result<Domain> {
    Ok(Domain {
        id: DomainId(row.get(0)?),
        hostname: row.get(1)?,
        daily_limit: row.get(2)?,
        sent_today: row.get(3)?,
        active: row.get(4)?,
        verified: row.get(5)?,
        phase: parse_text(row, 6)?,
        timezone: row.get(7)?,
        last_reset_on: parse_opt_date(row, 8)?,
    })
}

fn not_found(id: DomainId) -> WarmupError {
    WarmupError::NotFound {
        entity: "domain",
        id: id.to_string(),
    }
}

fn domain_exists(conn: &rusqlite::Connection, id: DomainId) -> rusqlite::Result<bool> {
    conn.query_row("SELECT 1 FROM domains WHERE id = ?1", params![id.0], |_| Ok(()))
        .optional()
        .map(|row| row.is_some())
}

/// Insert a domain. Returns the new id.
pub async fn insert_domain(db: &Database, domain: &Domain) -> Result<DomainId, WarmupError> {
    let d = domain.clone();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.execute(
                "INSERT INTO domains (hostname, daily_limit, sent_today, active, verified,
                    phase, timezone, last_reset_on)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    d.hostname,
                    d.daily_limit,
                    d.sent_today,
                    d.active,
                    d.verified,
                    d.phase.to_string(),
                    d.timezone,
                    d.last_reset_on.map(format_date),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map(DomainId)
        .map_err(map_tr_err)
}

pub async fn load_domain(db: &Database, id: DomainId) -> Result<Domain, WarmupError> {
    db.connection()
        .call(move |conn| -> Result<Option<Domain>, rusqlite::Error> {
            let sql = format!("SELECT {DOMAIN_COLUMNS} FROM domains WHERE id = ?1");
            conn.query_row(&sql, params![id.0], domain_from_row).optional()
        })
        .await
        .map_err(map_tr_err)?
        .ok_or_else(|| not_found(id))
}

/// All domains, ascending by id.
pub async fn list_domains(db: &Database) -> Result<Vec<Domain>, WarmupError> {
    db.connection()
        .call(|conn| -> Result<Vec<Domain>, rusqlite::Error> {
            let sql = format!("SELECT {DOMAIN_COLUMNS} FROM domains ORDER BY id ASC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], domain_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Add `delta` to today's counter only if it stays within the daily limit.
///
/// A single conditional UPDATE, so concurrent callers can never overshoot.
pub async fn increment_counter(
    db: &Database,
    id: DomainId,
    delta: u32,
) -> Result<bool, WarmupError> {
    let outcome = db
        .connection()
        .call(move |conn| -> Result<Option<bool>, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE domains SET sent_today = sent_today + ?2
                 WHERE id = ?1 AND sent_today + ?2 <= daily_limit",
                params![id.0, delta],
            )?;
            if changed == 1 {
                return Ok(Some(true));
            }
            Ok(domain_exists(conn, id)?.then_some(false))
        })
        .await
        .map_err(map_tr_err)?;
    outcome.ok_or_else(|| not_found(id))
}

/// Subtract `delta` from today's counter, floored at zero.
pub async fn release_counter(db: &Database, id: DomainId, delta: u32) -> Result<(), WarmupError> {
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE domains SET sent_today = MAX(sent_today - ?2, 0) WHERE id = ?1",
                params![id.0, delta],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

/// Zero the counter for `today` unless that day (or a later one) was already reset.
pub async fn reset_counter(
    db: &Database,
    id: DomainId,
    today: NaiveDate,
) -> Result<bool, WarmupError> {
    let today = format_date(today);
    let outcome = db
        .connection()
        .call(move |conn| -> Result<Option<bool>, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE domains SET sent_today = 0, last_reset_on = ?2
                 WHERE id = ?1 AND (last_reset_on IS NULL OR last_reset_on < ?2)",
                params![id.0, today],
            )?;
            if changed == 1 {
                return Ok(Some(true));
            }
            Ok(domain_exists(conn, id)?.then_some(false))
        })
        .await
        .map_err(map_tr_err)?;
    outcome.ok_or_else(|| not_found(id))
}
