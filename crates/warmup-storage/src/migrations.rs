// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied on
//! every database open.

use warmup_core::WarmupError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<usize, WarmupError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| WarmupError::Storage {
            source: Box::new(e),
        })?;
    Ok(report.applied_migrations().len())
}
