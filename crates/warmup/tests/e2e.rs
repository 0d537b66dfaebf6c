// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scheduler passes over a real SQLite database.
//!
//! Each test wires `SqliteStore` + `MockTransport` + `ManualClock` into a
//! `WarmupScheduler` exactly as `warmup run` does, with the SMTP relay and
//! wall clock swapped out.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use warmup_config::model::{SchedulerConfig, StorageConfig};
use warmup_core::types::{CampaignId, CampaignStatus, DomainId, MatchKind, Sequence};
use warmup_core::{Clock, PluginAdapter, WarmupStore};
use warmup_engine::{
    CampaignStatusReport, DispatchSummary, PassReport, SkipReason, WarmupScheduler,
};
use warmup_storage::SqliteStore;
use warmup_test_utils::{contact, CampaignBuilder, DomainBuilder, ManualClock, MockTransport};

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

struct Harness {
    _dir: TempDir,
    path: String,
    store: Arc<SqliteStore>,
    transport: Arc<MockTransport>,
    clock: Arc<ManualClock>,
}

impl Harness {
    async fn new(day: u32) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warmup.db").to_string_lossy().into_owned();
        let store = Arc::new(open(&path).await);
        Self {
            _dir: dir,
            path,
            store,
            transport: Arc::new(MockTransport::new()),
            clock: Arc::new(ManualClock::new(
                Utc.with_ymd_and_hms(2026, 3, day, 10, 0, 0).unwrap(),
            )),
        }
    }

    fn scheduler(&self) -> WarmupScheduler {
        self.scheduler_with(&SchedulerConfig::default())
    }

    fn scheduler_with(&self, config: &SchedulerConfig) -> WarmupScheduler {
        WarmupScheduler::new(
            config,
            self.store.clone(),
            self.transport.clone(),
            self.clock.clone(),
        )
        .unwrap()
    }

    async fn domain(&self, limit: u32, sent_today: u32) -> DomainId {
        let domain = DomainBuilder::new("mail.example.com")
            .limit(limit)
            .sent_today(sent_today)
            .last_reset_on(march(1))
            .build();
        self.store.insert_domain(&domain).await.unwrap()
    }

    async fn campaign(&self, builder: CampaignBuilder, contacts: usize) -> CampaignId {
        let id = self.store.insert_campaign(&builder.build()).await.unwrap();
        for i in 0..contacts {
            self.store
                .insert_contact(&contact(id, &format!("user{i}@example.org")))
                .await
                .unwrap();
        }
        id
    }
}

async fn open(path: &str) -> SqliteStore {
    SqliteStore::open(StorageConfig {
        database_path: path.to_string(),
        wal_mode: true,
    })
    .await
    .unwrap()
}

async fn pass(scheduler: &WarmupScheduler) -> PassReport {
    scheduler.run_pass(&CancellationToken::new()).await.unwrap()
}

fn spawn_pass(scheduler: WarmupScheduler) -> tokio::task::JoinHandle<PassReport> {
    tokio::spawn(async move { pass(&scheduler).await })
}

fn processed(report: &PassReport, id: CampaignId) -> DispatchSummary {
    match &report.outcome(id).unwrap().status {
        CampaignStatusReport::Processed(summary) => summary.clone(),
        other => panic!("campaign {id} was not processed: {other:?}"),
    }
}

#[tokio::test]
async fn arithmetic_day_three_sends_thirty() {
    let h = Harness::new(3).await;
    let domain = h.domain(1000, 0).await;
    let id = h
        .campaign(
            CampaignBuilder::new("ramp").params(20, 10, 5, 500).domains(vec![domain]),
            40,
        )
        .await;

    let report = pass(&h.scheduler()).await;

    let summary = processed(&report, id);
    assert_eq!(summary.day, 3);
    assert_eq!(summary.quota, 30);
    assert_eq!(summary.dispatched, 30);
    assert_eq!(h.transport.sent_count().await, 30);
    assert_eq!(h.store.count_contacts_with_emails(id).await.unwrap(), 30);
    assert_eq!(h.store.load_domain(domain).await.unwrap().sent_today, 30);
}

#[tokio::test]
async fn domain_headroom_bounds_the_pass() {
    let h = Harness::new(1).await;
    let domain = h.domain(100, 95).await;
    let id = h
        .campaign(CampaignBuilder::new("tight").domains(vec![domain]), 10)
        .await;

    let report = pass(&h.scheduler()).await;

    let summary = processed(&report, id);
    assert_eq!(summary.dispatched, 5);
    assert_eq!(summary.deferred, 5);
    assert_eq!(h.store.load_domain(domain).await.unwrap().sent_today, 100);
    assert_eq!(h.store.count_contacts_with_emails(id).await.unwrap(), 5);

    // The deferred contacts were released and are offered again tomorrow.
    h.clock.advance(chrono::Duration::days(1));
    let next = pass(&h.scheduler()).await;
    assert_eq!(next.domains_reset, 1);
    assert_eq!(h.store.count_contacts_with_emails(id).await.unwrap(), 10);
}

#[tokio::test]
async fn sequence_list_wraps_on_an_unconfigured_day() {
    let h = Harness::new(7).await;
    let domain = h.domain(1000, 0).await;
    let sequences = [1, 3, 5]
        .into_iter()
        .map(|day| Sequence {
            day,
            subject: format!("Part {day}"),
            body: format!("Body for {{email}} on day {day}"),
        })
        .collect();
    let id = h
        .campaign(
            CampaignBuilder::new("series")
                .params(2, 10, 0, 100)
                .sequences(sequences)
                .domains(vec![domain]),
            2,
        )
        .await;

    let report = pass(&h.scheduler()).await;

    let summary = processed(&report, id);
    assert_eq!(summary.day, 7);
    assert_eq!(summary.match_kind, MatchKind::Wrapped);
    let sent = h.transport.sent_messages().await;
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|m| m.subject == "Part 1"));
    assert!(sent[0].body.starts_with("Body for user"));
}

#[tokio::test]
async fn campaign_completes_exactly_once() {
    let h = Harness::new(1).await;
    let domain = h.domain(1000, 0).await;
    let id = h
        .campaign(
            CampaignBuilder::new("short").params(10, 1, 0, 3).domains(vec![domain]),
            3,
        )
        .await;
    let scheduler = h.scheduler();

    let first = pass(&scheduler).await;
    let outcome = first.outcome(id).unwrap();
    assert!(outcome.completed);
    assert_eq!(outcome.progress, Some(100.0));

    let stored = h.store.load_campaign(id).await.unwrap();
    assert_eq!(stored.status, CampaignStatus::Completed);
    let completed_at = stored.completed_at.unwrap();

    h.clock.advance(chrono::Duration::hours(2));
    let second = pass(&scheduler).await;
    assert!(second.outcome(id).is_none());
    let stored = h.store.load_campaign(id).await.unwrap();
    assert_eq!(stored.completed_at, Some(completed_at));
    assert_eq!(stored.counters.sent, 3);
}

#[tokio::test]
async fn overlapping_schedulers_share_one_domain_budget() {
    let h = Harness::new(1).await;
    let domain = h.domain(10, 0).await;
    let a = h
        .campaign(CampaignBuilder::new("a").params(10, 1, 0, 10).domains(vec![domain]), 10)
        .await;
    let b = h
        .campaign(CampaignBuilder::new("b").params(10, 1, 0, 10).domains(vec![domain]), 10)
        .await;
    let first = h.scheduler();
    let second = h.scheduler();

    let (r1, r2) = tokio::join!(pass(&first), pass(&second));

    assert_eq!(r1.dispatched() + r2.dispatched(), 10);
    assert_eq!(h.store.load_domain(domain).await.unwrap().sent_today, 10);
    let sent = h.transport.sent_messages().await;
    assert_eq!(sent.len(), 10);
    let unique: HashSet<_> = sent.iter().map(|m| m.to.clone()).collect();
    assert_eq!(unique.len(), 10, "no contact may be emailed twice");
    let reached = h.store.count_contacts_with_emails(a).await.unwrap()
        + h.store.count_contacts_with_emails(b).await.unwrap();
    assert_eq!(reached, 10);
}

#[tokio::test]
async fn state_survives_a_restart() {
    let mut h = Harness::new(1).await;
    let domain = h.domain(1000, 0).await;
    let id = h
        .campaign(CampaignBuilder::new("durable").domains(vec![domain]), 60)
        .await;

    let day_one = pass(&h.scheduler()).await;
    assert_eq!(processed(&day_one, id).dispatched, 20);
    h.store.shutdown().await.unwrap();

    h.store = Arc::new(open(&h.path).await);
    h.clock.advance(chrono::Duration::days(1));
    let day_two = pass(&h.scheduler()).await;

    assert_eq!(day_two.domains_reset, 1);
    let summary = processed(&day_two, id);
    assert_eq!(summary.day, 2);
    assert_eq!(summary.dispatched, 25);
    assert_eq!(h.store.count_contacts_with_emails(id).await.unwrap(), 45);
    assert_eq!(h.store.load_campaign(id).await.unwrap().counters.sent, 45);
}

#[tokio::test]
async fn slow_batch_renews_its_lease_in_the_database() {
    let h = Harness::new(1).await;
    let domain = h.domain(1000, 0).await;
    let id = h
        .campaign(CampaignBuilder::new("slow").params(3, 1, 0, 3).domains(vec![domain]), 3)
        .await;
    let mut config = SchedulerConfig::default();
    config.claim_lease_secs = 60;
    config.dispatch_timeout_secs = 30;
    // Every send costs 50 seconds of campaign time, so the batch outlives
    // the lease it was selected under.
    h.transport
        .advance_clock_per_send(h.clock.clone(), chrono::Duration::seconds(50))
        .await;
    h.transport.set_delay(Duration::from_millis(200)).await;

    let slow = spawn_pass(h.scheduler_with(&config));
    tokio::time::sleep(Duration::from_millis(300)).await;
    let overlapping = pass(&h.scheduler_with(&config)).await;
    let first = slow.await.unwrap();

    assert!(matches!(
        overlapping.outcome(id).unwrap().status,
        CampaignStatusReport::Skipped(SkipReason::NoEligibleContacts)
    ));
    assert_eq!(processed(&first, id).dispatched, 3);
    let sent = h.transport.sent_messages().await;
    let unique: HashSet<_> = sent.iter().map(|m| m.to.clone()).collect();
    assert_eq!(sent.len(), 3);
    assert_eq!(unique.len(), 3, "no contact may be emailed twice");
    assert_eq!(h.store.load_campaign(id).await.unwrap().counters.sent, 3);
}

#[tokio::test]
async fn operator_pause_during_a_pass_is_kept() {
    let h = Harness::new(1).await;
    let domain = h.domain(1000, 0).await;
    let id = h
        .campaign(CampaignBuilder::new("pause").params(3, 1, 0, 3).domains(vec![domain]), 3)
        .await;
    h.transport.set_delay(Duration::from_millis(200)).await;

    let running = spawn_pass(h.scheduler());
    tokio::time::sleep(Duration::from_millis(300)).await;
    let mut campaign = h.store.load_campaign(id).await.unwrap();
    campaign.transition(CampaignStatus::Paused, h.clock.now()).unwrap();
    h.store.save_campaign(&campaign).await.unwrap();
    let report = running.await.unwrap();

    assert!(!report.outcome(id).unwrap().completed);
    let stored = h.store.load_campaign(id).await.unwrap();
    assert_eq!(stored.status, CampaignStatus::Paused);
    assert_eq!(stored.completed_at, None);
    assert_eq!(stored.counters.sent, 3);
    assert_eq!(h.store.count_contacts_with_emails(id).await.unwrap(), 3);

    let next = pass(&h.scheduler()).await;
    assert!(next.outcome(id).is_none());
}
