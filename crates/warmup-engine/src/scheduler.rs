// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The scheduler pass and its periodic driver.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use warmup_config::model::SchedulerConfig;
use warmup_core::types::{CampaignId, HealthStatus};
use warmup_core::{Clock, ContentRenderer, MailTransport, WarmupError, WarmupStore};

use crate::calendar::CampaignCalendar;
use crate::capacity::CapacityLedger;
use crate::planner::DistributionPlanner;
use crate::progress::CampaignProgressTracker;
use crate::report::{CampaignOutcome, CampaignStatusReport, PassReport, PlanOutcome};

/// Runs scheduler passes over every active campaign.
///
/// Passes never overlap within one scheduler; a second caller waits for the
/// running pass to finish.
pub struct WarmupScheduler {
    store: Arc<dyn WarmupStore>,
    clock: Arc<dyn Clock>,
    calendar: CampaignCalendar,
    ledger: CapacityLedger,
    planner: DistributionPlanner,
    tracker: CampaignProgressTracker,
    interval: Duration,
    pass_lock: Mutex<()>,
}

impl WarmupScheduler {
    pub fn new(
        config: &SchedulerConfig,
        store: Arc<dyn WarmupStore>,
        transport: Arc<dyn MailTransport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, WarmupError> {
        let calendar = CampaignCalendar::from_name(&config.timezone)?;
        Ok(Self {
            ledger: CapacityLedger::new(store.clone()),
            planner: DistributionPlanner::new(
                config,
                calendar,
                store.clone(),
                transport,
                clock.clone(),
            ),
            tracker: CampaignProgressTracker::new(store.clone()),
            store,
            clock,
            calendar,
            interval: Duration::from_secs(config.interval_secs),
            pass_lock: Mutex::new(()),
        })
    }

    /// Use `renderer` for per-contact content instead of the token renderer.
    pub fn with_renderer(mut self, renderer: Arc<dyn ContentRenderer>) -> Self {
        self.planner = self.planner.with_renderer(renderer);
        self
    }

    /// Run one pass: domain resets, then every active campaign in isolation.
    ///
    /// Returns `Err` only when the store is unhealthy or cannot list its
    /// campaigns; per-campaign failures are recorded in the report.
    pub async fn run_pass(&self, cancel: &CancellationToken) -> Result<PassReport, WarmupError> {
        let _pass = self.pass_lock.lock().await;
        let started_at = self.clock.now();

        match self.store.health_check().await? {
            HealthStatus::Healthy => {}
            HealthStatus::Degraded(reason) => warn!(%reason, "store degraded"),
            HealthStatus::Unhealthy(reason) => {
                return Err(WarmupError::Storage {
                    source: format!("store unhealthy: {reason}").into(),
                });
            }
        }

        let domains_reset = self.reset_domains(started_at).await?;

        let mut report = PassReport {
            started_at,
            domains_reset,
            outcomes: Vec::new(),
            cancelled: false,
        };

        for id in self.store.active_campaign_ids().await? {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let outcome = match self.process_campaign(id, cancel).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(campaign_id = %id, error = %e, "campaign failed");
                    CampaignOutcome {
                        campaign_id: id,
                        status: CampaignStatusReport::Failed(e.to_string()),
                        progress: None,
                        completed: false,
                    }
                }
            };
            let cancelled = matches!(
                &outcome.status,
                CampaignStatusReport::Processed(summary) if summary.cancelled
            );
            report.outcomes.push(outcome);
            if cancelled {
                report.cancelled = true;
                break;
            }
        }

        info!(
            campaigns = report.outcomes.len(),
            dispatched = report.dispatched(),
            failed = report.failed_campaigns(),
            domains_reset = report.domains_reset,
            cancelled = report.cancelled,
            "scheduler pass finished"
        );
        Ok(report)
    }

    /// Run passes every `interval_secs` until `cancel` fires.
    pub async fn run_forever(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval_secs = self.interval.as_secs(), "scheduler started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.run_pass(&cancel).await {
                        error!(error = %e, "scheduler pass failed");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("scheduler shutting down");
                    break;
                }
            }
        }
    }

    /// Reset every domain whose local day rolled over. Returns how many were reset.
    async fn reset_domains(&self, now: DateTime<Utc>) -> Result<usize, WarmupError> {
        let mut reset = 0;
        for domain in self.store.list_domains().await? {
            let calendar = match self.calendar.for_domain(&domain) {
                Ok(calendar) => calendar,
                Err(e) => {
                    warn!(domain_id = %domain.id, error = %e, "domain time zone invalid, using scheduler zone");
                    self.calendar
                }
            };
            let today = calendar.local_date(now);
            if !CapacityLedger::needs_reset(&domain, today) {
                continue;
            }
            match self.ledger.reset_daily(domain.id, today).await {
                Ok(true) => reset += 1,
                Ok(false) => debug!(domain_id = %domain.id, "domain already reset"),
                Err(e) => warn!(domain_id = %domain.id, error = %e, "domain reset failed"),
            }
        }
        Ok(reset)
    }

    async fn process_campaign(
        &self,
        id: CampaignId,
        cancel: &CancellationToken,
    ) -> Result<CampaignOutcome, WarmupError> {
        let mut campaign = self.store.load_campaign(id).await?;
        campaign.validate()?;

        let now = self.clock.now();
        let outcome = self.planner.plan(&campaign, now, cancel).await?;
        let update = self
            .tracker
            .update(&mut campaign, outcome.dispatched(), now)
            .await?;

        let status = match outcome {
            PlanOutcome::Skipped { reason, .. } => CampaignStatusReport::Skipped(reason),
            PlanOutcome::Dispatched(summary) => CampaignStatusReport::Processed(summary),
        };
        Ok(CampaignOutcome {
            campaign_id: id,
            status,
            progress: Some(update.progress),
            completed: update.completed_now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use warmup_core::types::{CampaignStatus, DomainId};
    use warmup_test_utils::{
        contact, CampaignBuilder, DomainBuilder, ManualClock, MemoryStore, MockTransport,
    };

    use crate::report::SkipReason;

    struct Fixture {
        store: Arc<MemoryStore>,
        transport: Arc<MockTransport>,
        clock: Arc<ManualClock>,
        scheduler: WarmupScheduler,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(MockTransport::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
        ));
        let scheduler = WarmupScheduler::new(
            &SchedulerConfig::default(),
            store.clone(),
            transport.clone(),
            clock.clone(),
        )
        .unwrap();
        Fixture {
            store,
            transport,
            clock,
            scheduler,
        }
    }

    async fn campaign(store: &MemoryStore, domain: DomainId, total: u32, contacts: usize) -> CampaignId {
        let c = CampaignBuilder::new("c")
            .start_date(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
            .params(10, 1, 0, total)
            .domains(vec![domain])
            .build();
        let id = store.insert_campaign(&c).await.unwrap();
        for i in 0..contacts {
            store
                .insert_contact(&contact(id, &format!("u{i}@example.com")))
                .await
                .unwrap();
        }
        id
    }

    #[tokio::test]
    async fn unhealthy_store_aborts_before_any_mutation() {
        let f = fixture();
        let d = f
            .store
            .insert_domain(&DomainBuilder::new("a.example.com").sent_today(50).build())
            .await
            .unwrap();
        f.store
            .set_health(HealthStatus::Unhealthy("disk full".into()))
            .await;

        let err = f.scheduler.run_pass(&CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, WarmupError::Storage { .. }));
        assert_eq!(f.store.load_domain(d).await.unwrap().sent_today, 50);
    }

    #[tokio::test]
    async fn resets_domains_once_per_local_day() {
        let f = fixture();
        let d = f
            .store
            .insert_domain(
                &DomainBuilder::new("a.example.com")
                    .sent_today(50)
                    .last_reset_on(NaiveDate::from_ymd_opt(2026, 2, 28).unwrap())
                    .build(),
            )
            .await
            .unwrap();

        let first = f.scheduler.run_pass(&CancellationToken::new()).await.unwrap();
        assert_eq!(first.domains_reset, 1);
        assert_eq!(f.store.load_domain(d).await.unwrap().sent_today, 0);

        let second = f.scheduler.run_pass(&CancellationToken::new()).await.unwrap();
        assert_eq!(second.domains_reset, 0);
    }

    #[tokio::test]
    async fn domain_resets_follow_the_domain_zone() {
        let f = fixture();
        // 12:00 UTC on March 1 is already March 2 in Auckland.
        f.clock.set(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        f.store
            .insert_domain(
                &DomainBuilder::new("nz.example.com")
                    .timezone("Pacific/Auckland")
                    .last_reset_on(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
                    .build(),
            )
            .await
            .unwrap();
        f.store
            .insert_domain(
                &DomainBuilder::new("utc.example.com")
                    .last_reset_on(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
                    .build(),
            )
            .await
            .unwrap();

        let report = f.scheduler.run_pass(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.domains_reset, 1);
    }

    #[tokio::test]
    async fn failing_campaign_does_not_stop_the_others() {
        let f = fixture();
        let d = f
            .store
            .insert_domain(&DomainBuilder::new("a.example.com").build())
            .await
            .unwrap();
        let broken = campaign(&f.store, d, 100, 5).await;
        let healthy = campaign(&f.store, d, 100, 5).await;
        f.store.fail_loads_for(broken).await;

        let report = f.scheduler.run_pass(&CancellationToken::new()).await.unwrap();

        assert!(matches!(
            report.outcome(broken).unwrap().status,
            CampaignStatusReport::Failed(_)
        ));
        assert!(matches!(
            report.outcome(healthy).unwrap().status,
            CampaignStatusReport::Processed(_)
        ));
        assert_eq!(f.transport.sent_count().await, 5);
    }

    #[tokio::test]
    async fn skipped_campaigns_are_reported_with_reason() {
        let f = fixture();
        let d = f
            .store
            .insert_domain(&DomainBuilder::new("a.example.com").build())
            .await
            .unwrap();
        let id = campaign(&f.store, d, 100, 0).await;

        let report = f.scheduler.run_pass(&CancellationToken::new()).await.unwrap();

        assert_eq!(
            report.outcome(id).unwrap().status,
            CampaignStatusReport::Skipped(SkipReason::NoEligibleContacts)
        );
    }

    #[tokio::test]
    async fn campaign_completes_and_leaves_the_active_set() {
        let f = fixture();
        let d = f
            .store
            .insert_domain(&DomainBuilder::new("a.example.com").build())
            .await
            .unwrap();
        let id = campaign(&f.store, d, 3, 3).await;

        let report = f.scheduler.run_pass(&CancellationToken::new()).await.unwrap();
        let outcome = report.outcome(id).unwrap();
        assert!(outcome.completed);
        assert_eq!(outcome.progress, Some(100.0));

        let saved = f.store.load_campaign(id).await.unwrap();
        assert_eq!(saved.status, CampaignStatus::Completed);
        let completed_at = saved.completed_at;
        assert!(completed_at.is_some());

        f.clock.advance(chrono::Duration::minutes(1));
        let second = f.scheduler.run_pass(&CancellationToken::new()).await.unwrap();
        assert!(second.outcome(id).is_none());
        assert_eq!(f.store.load_campaign(id).await.unwrap().completed_at, completed_at);
    }

    #[tokio::test]
    async fn cancelled_pass_reports_cancellation() {
        let f = fixture();
        let d = f
            .store
            .insert_domain(&DomainBuilder::new("a.example.com").build())
            .await
            .unwrap();
        campaign(&f.store, d, 100, 5).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = f.scheduler.run_pass(&cancel).await.unwrap();

        assert!(report.cancelled);
        assert!(report.outcomes.is_empty());
        assert_eq!(f.transport.sent_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_forever_stops_on_cancel() {
        let f = fixture();
        let scheduler = Arc::new(f.scheduler);
        let cancel = CancellationToken::new();
        let handle = {
            let scheduler = scheduler.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { scheduler.run_forever(cancel).await })
        };

        tokio::time::sleep(Duration::from_secs(150)).await;
        cancel.cancel();
        handle.await.unwrap();
    }

    #[test]
    fn unknown_scheduler_zone_is_a_config_error() {
        let config = SchedulerConfig {
            timezone: "Mars/Olympus".into(),
            ..SchedulerConfig::default()
        };
        let result = WarmupScheduler::new(
            &config,
            Arc::new(MemoryStore::new()),
            Arc::new(MockTransport::new()),
            Arc::new(ManualClock::new(Utc::now())),
        );
        assert!(matches!(result, Err(WarmupError::Config(_))));
    }
}
