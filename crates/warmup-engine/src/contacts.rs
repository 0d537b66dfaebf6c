// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Eligible-contact selection with pass-local claims.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use warmup_config::model::SchedulerConfig;
use warmup_core::types::{CampaignId, ClaimToken, Contact, ContactPredicate, ContactQuery};
use warmup_core::{WarmupError, WarmupStore};

/// Selects the next contacts to email, in ascending id order.
///
/// Every selection claims what it returns, so a contact handed out once is
/// not offered again, in this pass or an overlapping one, until its claim is
/// cleared or the lease runs out.
#[derive(Clone)]
pub struct ContactSelector {
    store: Arc<dyn WarmupStore>,
    max_attempts: u32,
    lease: chrono::Duration,
}

impl ContactSelector {
    pub fn new(store: Arc<dyn WarmupStore>, config: &SchedulerConfig) -> Self {
        Self {
            store,
            max_attempts: config.max_send_attempts,
            lease: chrono::Duration::seconds(i64::try_from(config.claim_lease_secs).unwrap_or(i64::MAX / 1_000)),
        }
    }

    /// Claim up to `limit` contacts of `campaign` matching `predicate`.
    ///
    /// Returns fewer than `limit` when the pool runs dry.
    pub async fn select(
        &self,
        campaign: CampaignId,
        predicate: ContactPredicate,
        limit: usize,
        now: DateTime<Utc>,
        claim: &ClaimToken,
    ) -> Result<Vec<Contact>, WarmupError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let query = ContactQuery {
            campaign_id: campaign,
            predicate,
            limit,
            now,
            max_attempts: self.max_attempts,
            claim: claim.clone(),
            claim_until: now + self.lease,
        };
        let contacts = self.store.select_eligible_contacts(&query).await?;
        debug!(
            campaign_id = %campaign,
            %predicate,
            requested = limit,
            selected = contacts.len(),
            "contacts claimed"
        );
        Ok(contacts)
    }

    /// Push the lease of every contact still held under `claim` to `now + lease`.
    ///
    /// Called before each dispatch so a batch that runs longer than one lease
    /// keeps its unsent contacts out of overlapping selections.
    pub async fn renew(&self, claim: &ClaimToken, now: DateTime<Utc>) -> Result<u64, WarmupError> {
        self.store.renew_contact_claims(claim, now + self.lease).await
    }

    /// Release every contact still held under `claim`.
    pub async fn release(&self, claim: &ClaimToken) -> Result<u64, WarmupError> {
        self.store.release_contact_claims(claim).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warmup_core::types::ContactStatus;
    use warmup_test_utils::{contact, CampaignBuilder, MemoryStore};

    async fn seeded(n: usize) -> (Arc<MemoryStore>, CampaignId) {
        let store = Arc::new(MemoryStore::new());
        let id = store
            .insert_campaign(&CampaignBuilder::new("c").build())
            .await
            .unwrap();
        for i in 0..n {
            store
                .insert_contact(&contact(id, &format!("user{i}@example.com")))
                .await
                .unwrap();
        }
        (store, id)
    }

    fn selector(store: Arc<MemoryStore>) -> ContactSelector {
        ContactSelector::new(store, &SchedulerConfig::default())
    }

    #[tokio::test]
    async fn returns_ascending_ids_up_to_limit() {
        let (store, campaign) = seeded(5).await;
        let selector = selector(store);
        let claim = ClaimToken::generate();
        let got = selector
            .select(campaign, ContactPredicate::FirstEmail, 3, Utc::now(), &claim)
            .await
            .unwrap();
        let ids: Vec<i64> = got.iter().map(|c| c.id.0).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn claimed_contacts_are_not_offered_twice() {
        let (store, campaign) = seeded(4).await;
        let selector = selector(store);
        let now = Utc::now();
        let first = selector
            .select(campaign, ContactPredicate::FirstEmail, 3, now, &ClaimToken::generate())
            .await
            .unwrap();
        let second = selector
            .select(campaign, ContactPredicate::FirstEmail, 3, now, &ClaimToken::generate())
            .await
            .unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 1);
        assert!(second.iter().all(|c| first.iter().all(|f| f.id != c.id)));
    }

    #[tokio::test]
    async fn released_claims_become_selectable() {
        let (store, campaign) = seeded(2).await;
        let selector = selector(store);
        let now = Utc::now();
        let claim = ClaimToken::generate();
        selector
            .select(campaign, ContactPredicate::FirstEmail, 2, now, &claim)
            .await
            .unwrap();
        assert_eq!(selector.release(&claim).await.unwrap(), 2);
        let again = selector
            .select(campaign, ContactPredicate::FirstEmail, 2, now, &ClaimToken::generate())
            .await
            .unwrap();
        assert_eq!(again.len(), 2);
    }

    #[tokio::test]
    async fn expired_lease_frees_contacts() {
        let (store, campaign) = seeded(1).await;
        let selector = selector(store);
        let now = Utc::now();
        selector
            .select(campaign, ContactPredicate::FirstEmail, 1, now, &ClaimToken::generate())
            .await
            .unwrap();
        let later = now + chrono::Duration::seconds(601);
        let again = selector
            .select(campaign, ContactPredicate::FirstEmail, 1, later, &ClaimToken::generate())
            .await
            .unwrap();
        assert_eq!(again.len(), 1);
    }

    #[tokio::test]
    async fn unsubscribed_and_inactive_contacts_are_never_selected() {
        let store = Arc::new(MemoryStore::new());
        let campaign = store
            .insert_campaign(&CampaignBuilder::new("c").build())
            .await
            .unwrap();
        let mut gone = contact(campaign, "gone@example.com");
        gone.unsubscribed = true;
        gone.status = ContactStatus::Unsubscribed;
        let mut idle = contact(campaign, "idle@example.com");
        idle.active = false;
        let mut due = contact(campaign, "due@example.com");
        due.unsubscribed = true;
        due.emails_sent = 1;
        due.status = ContactStatus::Scheduled;
        due.next_send_at = Some(Utc::now() - chrono::Duration::hours(1));
        for c in [&gone, &idle, &due] {
            store.insert_contact(c).await.unwrap();
        }

        let selector = selector(store);
        for predicate in [ContactPredicate::FirstEmail, ContactPredicate::FollowUp] {
            let got = selector
                .select(campaign, predicate, 10, Utc::now(), &ClaimToken::generate())
                .await
                .unwrap();
            assert!(got.is_empty(), "{predicate} returned {got:?}");
        }
    }

    #[tokio::test]
    async fn renewal_outlasts_the_original_lease() {
        let (store, campaign) = seeded(2).await;
        let selector = selector(store);
        let now = Utc::now();
        let claim = ClaimToken::generate();
        selector
            .select(campaign, ContactPredicate::FirstEmail, 2, now, &claim)
            .await
            .unwrap();

        let renewed_at = now + chrono::Duration::seconds(500);
        assert_eq!(selector.renew(&claim, renewed_at).await.unwrap(), 2);

        let after_first_lease = now + chrono::Duration::seconds(700);
        let other = selector
            .select(
                campaign,
                ContactPredicate::FirstEmail,
                2,
                after_first_lease,
                &ClaimToken::generate(),
            )
            .await
            .unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn zero_limit_is_a_no_op() {
        let (store, campaign) = seeded(2).await;
        let selector = selector(store);
        let got = selector
            .select(campaign, ContactPredicate::FirstEmail, 0, Utc::now(), &ClaimToken::generate())
            .await
            .unwrap();
        assert!(got.is_empty());
    }
}
