// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `warmup run` and `warmup serve` command implementations.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use warmup_config::model::WarmupConfig;
use warmup_core::{PluginAdapter, SystemClock, WarmupError};
use warmup_engine::{CampaignStatusReport, PassReport, WarmupScheduler};
use warmup_smtp::SmtpTransport;
use warmup_storage::SqliteStore;

use crate::shutdown;

/// Open storage, connect the relay and assemble the scheduler.
async fn build_scheduler(
    config: &WarmupConfig,
) -> Result<(WarmupScheduler, Arc<SqliteStore>), WarmupError> {
    let store = Arc::new(SqliteStore::open(config.storage.clone()).await?);
    info!(path = %config.storage.database_path, "storage opened");

    let transport = Arc::new(SmtpTransport::new(&config.smtp)?);
    info!(host = %config.smtp.host, port = config.smtp.port, "smtp relay configured");

    let scheduler = WarmupScheduler::new(
        &config.scheduler,
        store.clone(),
        transport,
        Arc::new(SystemClock),
    )?;
    Ok((scheduler, store))
}

/// Run one pass and print a line per campaign.
pub async fn run_once(config: &WarmupConfig) -> Result<(), WarmupError> {
    let (scheduler, store) = build_scheduler(config).await?;
    let result = scheduler.run_pass(&CancellationToken::new()).await;
    close_store(&store).await;

    let report = result?;
    print_report(&report);
    if report.failed_campaigns() > 0 {
        warn!(failed = report.failed_campaigns(), "some campaigns failed");
    }
    Ok(())
}

/// Run passes until SIGINT or SIGTERM.
pub async fn run_serve(config: &WarmupConfig) -> Result<(), WarmupError> {
    let (scheduler, store) = build_scheduler(config).await?;
    let cancel = shutdown::install_signal_handler();

    scheduler.run_forever(cancel).await;

    close_store(&store).await;
    info!("warmup stopped");
    Ok(())
}

async fn close_store(store: &SqliteStore) {
    if let Err(e) = store.shutdown().await {
        warn!(error = %e, "storage shutdown failed");
    }
}

fn print_report(report: &PassReport) {
    println!(
        "pass at {}: {} campaign(s), {} dispatched, {} domain(s) reset",
        report.started_at.to_rfc3339(),
        report.outcomes.len(),
        report.dispatched(),
        report.domains_reset,
    );
    for outcome in &report.outcomes {
        let line = match &outcome.status {
            CampaignStatusReport::Processed(summary) => format!(
                "processed day {} quota {} ({}): {} sent, {} failed, {} deferred",
                summary.day,
                summary.quota,
                summary.match_kind,
                summary.dispatched,
                summary.failed,
                summary.deferred,
            ),
            CampaignStatusReport::Skipped(reason) => format!("skipped: {reason}"),
            CampaignStatusReport::Failed(error) => format!("failed: {error}"),
        };
        let progress = outcome
            .progress
            .map(|p| format!(" [{p:.1}%]"))
            .unwrap_or_default();
        let completed = if outcome.completed { " completed" } else { "" };
        println!("  campaign {}: {line}{progress}{completed}", outcome.campaign_id);
    }
    if report.cancelled {
        println!("  pass cancelled");
    }
}
