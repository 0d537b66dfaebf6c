// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `warmup check`: validate the configuration and storage, then show today's plan
//! without sending anything.

use warmup_config::model::WarmupConfig;
use warmup_core::types::HealthStatus;
use warmup_core::{Clock, PluginAdapter, SystemClock, WarmupError, WarmupStore};
use warmup_engine::{growth, sequence, CampaignCalendar};
use warmup_storage::SqliteStore;

pub async fn run_check(config: &WarmupConfig) -> Result<(), WarmupError> {
    let calendar = CampaignCalendar::from_name(&config.scheduler.timezone)?;
    println!(
        "config ok: zone {}, interval {}s, database {}",
        calendar.timezone(),
        config.scheduler.interval_secs,
        config.storage.database_path,
    );

    let store = SqliteStore::open(config.storage.clone()).await?;
    let result = print_plan(&store, calendar, SystemClock.now()).await;
    if let Err(e) = store.shutdown().await {
        tracing::warn!(error = %e, "storage shutdown failed");
    }
    result
}

async fn print_plan(
    store: &SqliteStore,
    calendar: CampaignCalendar,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<(), WarmupError> {
    match store.health_check().await? {
        HealthStatus::Healthy => println!("storage: healthy"),
        HealthStatus::Degraded(reason) => println!("storage: degraded ({reason})"),
        HealthStatus::Unhealthy(reason) => println!("storage: unhealthy ({reason})"),
    }

    let domains = store.list_domains().await?;
    println!("domains: {}", domains.len());
    for domain in &domains {
        println!(
            "  {} {}: {}/{} sent today, phase {}{}",
            domain.id,
            domain.hostname,
            domain.sent_today,
            domain.daily_limit,
            domain.phase,
            if domain.is_usable() { "" } else { " (unusable)" },
        );
    }

    let campaigns = store.load_active_campaigns().await?;
    println!("active campaigns: {}", campaigns.len());
    for campaign in &campaigns {
        if let Err(e) = campaign.validate() {
            println!("  {} {}: invalid ({e})", campaign.id, campaign.name);
            continue;
        }
        let day = calendar.day_index(campaign.start_date, now);
        let quota = growth::daily_quota(day, &campaign.growth);
        let content = sequence::select(day, &campaign.sequences, &campaign.fallback);
        println!(
            "  {} {}: day {day}, quota {quota}, content day {} ({}), progress {:.1}%",
            campaign.id,
            campaign.name,
            content.sequence_day,
            content.match_kind,
            campaign.progress,
        );
    }
    Ok(())
}
