// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign progress and completion.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use warmup_core::types::{Campaign, CampaignStatus};
use warmup_core::{WarmupError, WarmupStore};

/// Result of a progress update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub progress: f64,
    /// The campaign transitioned to completed during this update.
    pub completed_now: bool,
}

/// Recomputes progress from the store and completes finished campaigns.
///
/// Writes are targeted: the sent counter is incremented in place and
/// completion applies only to a campaign that is still active, so a status
/// change made while the pass ran is kept.
#[derive(Clone)]
pub struct CampaignProgressTracker {
    store: Arc<dyn WarmupStore>,
}

impl CampaignProgressTracker {
    pub fn new(store: Arc<dyn WarmupStore>) -> Self {
        Self { store }
    }

    /// Fold `dispatched` new sends into `campaign` and refresh its progress.
    ///
    /// `campaign` is the copy loaded at the start of the pass. Progress never
    /// decreases while the campaign is active, and nothing is written when
    /// nothing changed, so repeated calls are no-ops.
    pub async fn update(
        &self,
        campaign: &mut Campaign,
        dispatched: u32,
        now: DateTime<Utc>,
    ) -> Result<ProgressUpdate, WarmupError> {
        let total = u64::from(campaign.total_contacts());
        let reached = self.store.count_contacts_with_emails(campaign.id).await?;

        let mut progress = campaign.progress;
        if total > 0 && campaign.status == CampaignStatus::Active {
            let computed = (reached as f64 / total as f64 * 100.0).clamp(0.0, 100.0);
            progress = progress.max(computed);
        }

        if dispatched > 0 || progress != campaign.progress {
            self.store
                .record_campaign_progress(campaign.id, u64::from(dispatched), progress)
                .await?;
            campaign.counters.sent += u64::from(dispatched);
            campaign.progress = progress;
        }

        let mut completed_now = false;
        if total > 0 && reached >= total && campaign.status == CampaignStatus::Active {
            if self.store.complete_campaign(campaign.id, now).await? {
                campaign.transition(CampaignStatus::Completed, now)?;
                campaign.progress = 100.0;
                completed_now = true;
                info!(campaign_id = %campaign.id, reached, total, "campaign completed");
            } else {
                debug!(campaign_id = %campaign.id, "campaign no longer active, not completed");
            }
        }

        Ok(ProgressUpdate {
            progress: campaign.progress,
            completed_now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warmup_core::types::{ClaimToken, ContactPredicate, ContactQuery, ContactStatus};
    use warmup_test_utils::{contact, CampaignBuilder, MemoryStore};

    async fn seeded(total: u32, contacts: usize) -> (Arc<MemoryStore>, Campaign) {
        let store = Arc::new(MemoryStore::new());
        let campaign = CampaignBuilder::new("c").params(10, 10, 0, total).build();
        let id = store.insert_campaign(&campaign).await.unwrap();
        for i in 0..contacts {
            store
                .insert_contact(&contact(id, &format!("user{i}@example.com")))
                .await
                .unwrap();
        }
        let campaign = store.load_campaign(id).await.unwrap();
        (store, campaign)
    }

    /// Claim `n` fresh contacts of `campaign` and record one send to each.
    async fn email(store: &MemoryStore, campaign: &Campaign, n: usize) {
        let now = Utc::now();
        let claim = ClaimToken::generate();
        let query = ContactQuery {
            campaign_id: campaign.id,
            predicate: ContactPredicate::FirstEmail,
            limit: n,
            now,
            max_attempts: 3,
            claim: claim.clone(),
            claim_until: now + chrono::Duration::minutes(10),
        };
        let picked = store.select_eligible_contacts(&query).await.unwrap();
        assert_eq!(picked.len(), n);
        for c in picked {
            assert!(store
                .mark_contact_sent(c.id, &claim, None, ContactStatus::Sent)
                .await
                .unwrap());
        }
    }

    #[tokio::test]
    async fn progress_is_the_emailed_share() {
        let (store, mut campaign) = seeded(4, 4).await;
        email(&store, &campaign, 1).await;
        let tracker = CampaignProgressTracker::new(store.clone());

        let update = tracker.update(&mut campaign, 1, Utc::now()).await.unwrap();

        assert_eq!(update.progress, 25.0);
        assert!(!update.completed_now);
        let saved = store.load_campaign(campaign.id).await.unwrap();
        assert_eq!(saved.progress, 25.0);
        assert_eq!(saved.counters.sent, 1);
    }

    #[tokio::test]
    async fn completion_happens_exactly_once() {
        let (store, mut campaign) = seeded(3, 3).await;
        email(&store, &campaign, 3).await;
        let tracker = CampaignProgressTracker::new(store.clone());
        let t1 = Utc::now();

        let first = tracker.update(&mut campaign, 3, t1).await.unwrap();
        assert!(first.completed_now);
        assert_eq!(first.progress, 100.0);
        assert_eq!(campaign.status, CampaignStatus::Completed);
        assert_eq!(campaign.completed_at, Some(t1));
        let saves = store.save_count().await;

        let t2 = t1 + chrono::Duration::minutes(1);
        let second = tracker.update(&mut campaign, 0, t2).await.unwrap();
        assert!(!second.completed_now);
        assert_eq!(campaign.completed_at, Some(t1));
        assert_eq!(store.save_count().await, saves);
    }

    #[tokio::test]
    async fn progress_never_decreases() {
        let (store, mut campaign) = seeded(10, 2).await;
        campaign.progress = 40.0;
        let tracker = CampaignProgressTracker::new(store.clone());

        let update = tracker.update(&mut campaign, 0, Utc::now()).await.unwrap();

        assert_eq!(update.progress, 40.0);
        assert_eq!(store.save_count().await, 0);
    }

    #[tokio::test]
    async fn zero_target_never_completes() {
        let (store, mut campaign) = seeded(0, 1).await;
        email(&store, &campaign, 1).await;
        let tracker = CampaignProgressTracker::new(store.clone());

        let update = tracker.update(&mut campaign, 0, Utc::now()).await.unwrap();

        assert_eq!(update.progress, 0.0);
        assert!(!update.completed_now);
        assert_eq!(campaign.status, CampaignStatus::Active);
    }

    #[tokio::test]
    async fn pause_during_the_pass_is_kept() {
        let (store, mut campaign) = seeded(2, 2).await;
        email(&store, &campaign, 2).await;
        let mut paused = store.load_campaign(campaign.id).await.unwrap();
        paused.transition(CampaignStatus::Paused, Utc::now()).unwrap();
        store.save_campaign(&paused).await.unwrap();
        let tracker = CampaignProgressTracker::new(store.clone());

        let update = tracker.update(&mut campaign, 2, Utc::now()).await.unwrap();

        assert!(!update.completed_now);
        let saved = store.load_campaign(campaign.id).await.unwrap();
        assert_eq!(saved.status, CampaignStatus::Paused);
        assert_eq!(saved.completed_at, None);
        assert_eq!(saved.counters.sent, 2);
    }

    #[tokio::test]
    async fn stale_copies_do_not_lose_sent_counts() {
        let (store, campaign) = seeded(100, 0).await;
        let tracker = CampaignProgressTracker::new(store.clone());
        let mut first = campaign.clone();
        let mut second = campaign;

        tracker.update(&mut first, 2, Utc::now()).await.unwrap();
        tracker.update(&mut second, 3, Utc::now()).await.unwrap();

        let saved = store.load_campaign(first.id).await.unwrap();
        assert_eq!(saved.counters.sent, 5);
    }
}
