// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for campaign, domain, contact, and log persistence.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::WarmupError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Campaign, CampaignId, ClaimToken, Contact, ContactId, ContactQuery, ContactStatus, Domain,
    DomainId, SentLogEntry,
};

/// Persistence collaborator of the scheduling engine.
///
/// Two operations carry the engine's concurrency guarantees and must be
/// atomic in every implementation:
/// - [`increment_domain_counter`](WarmupStore::increment_domain_counter) is a
///   conditional check-and-increment against the domain's daily limit.
/// - [`select_eligible_contacts`](WarmupStore::select_eligible_contacts)
///   selects and claims in one unit of work, so no contact is returned twice
///   while its claim is live.
#[async_trait]
pub trait WarmupStore: PluginAdapter {
    /// Campaigns with status `active`, ordered by id.
    async fn load_active_campaigns(&self) -> Result<Vec<Campaign>, WarmupError>;

    /// Ids of campaigns with status `active`, ascending.
    async fn active_campaign_ids(&self) -> Result<Vec<CampaignId>, WarmupError>;

    /// Load a single campaign.
    async fn load_campaign(&self, id: CampaignId) -> Result<Campaign, WarmupError>;

    /// Persist status, progress, counters, and completion time of a campaign.
    ///
    /// This is the whole-row write used by hosts (pausing, resuming). The
    /// scheduler itself only uses the targeted writes below, so an operator
    /// change made during a pass is never overwritten.
    async fn save_campaign(&self, campaign: &Campaign) -> Result<(), WarmupError>;

    /// Add `sent_delta` to the campaign's sent counter and raise its progress
    /// to `progress` if the campaign is still active.
    async fn record_campaign_progress(
        &self,
        id: CampaignId,
        sent_delta: u64,
        progress: f64,
    ) -> Result<(), WarmupError>;

    /// Transition the campaign from active to completed, stamping `at` as the
    /// completion time unless one is already recorded.
    ///
    /// Returns `false` without changing anything when the stored campaign is
    /// not active.
    async fn complete_campaign(&self, id: CampaignId, at: DateTime<Utc>)
    -> Result<bool, WarmupError>;

    /// Insert a campaign; the `id` field is ignored and the assigned id returned.
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<CampaignId, WarmupError>;

    /// Load a single domain.
    async fn load_domain(&self, id: DomainId) -> Result<Domain, WarmupError>;

    /// All domains, ordered by id.
    async fn list_domains(&self) -> Result<Vec<Domain>, WarmupError>;

    /// Insert a domain; the `id` field is ignored and the assigned id returned.
    async fn insert_domain(&self, domain: &Domain) -> Result<DomainId, WarmupError>;

    /// Atomically add `delta` to the domain's counter if the daily limit allows it.
    ///
    /// Returns `false` without changing anything when the limit would be exceeded.
    async fn increment_domain_counter(&self, id: DomainId, delta: u32)
    -> Result<bool, WarmupError>;

    /// Return `delta` unused sends to the domain's counter (floored at zero).
    async fn release_domain_counter(&self, id: DomainId, delta: u32) -> Result<(), WarmupError>;

    /// Zero the domain's counter for local date `today`.
    ///
    /// Returns `false` if the domain was already reset for `today` or later.
    async fn reset_domain_counter(&self, id: DomainId, today: NaiveDate)
    -> Result<bool, WarmupError>;

    /// Insert a contact; the `id` field is ignored and the assigned id returned.
    async fn insert_contact(&self, contact: &Contact) -> Result<ContactId, WarmupError>;

    /// Load a single contact.
    async fn load_contact(&self, id: ContactId) -> Result<Contact, WarmupError>;

    /// Select up to `query.limit` contacts matching the query, ascending by id,
    /// and claim them under `query.claim` until `query.claim_until`.
    async fn select_eligible_contacts(
        &self,
        query: &ContactQuery,
    ) -> Result<Vec<Contact>, WarmupError>;

    /// Clear every claim held under `claim` without touching contact state.
    async fn release_contact_claims(&self, claim: &ClaimToken) -> Result<u64, WarmupError>;

    /// Extend every claim still held under `claim` to expire at `until`.
    /// Returns how many contacts are still held.
    async fn renew_contact_claims(
        &self,
        claim: &ClaimToken,
        until: DateTime<Utc>,
    ) -> Result<u64, WarmupError>;

    /// Record a successful send: bump `emails_sent`, reset attempts, set the
    /// next send time and status, and clear the claim.
    ///
    /// Applies only while the contact is held under `claim`. Returns `false`
    /// and changes nothing if the claim was lost to another selection.
    async fn mark_contact_sent(
        &self,
        id: ContactId,
        claim: &ClaimToken,
        next_send_at: Option<DateTime<Utc>>,
        status: ContactStatus,
    ) -> Result<bool, WarmupError>;

    /// Record a failed send: bump `send_attempts` and clear the claim.
    async fn record_failed_attempt(&self, id: ContactId) -> Result<(), WarmupError>;

    /// Append an immutable sent log entry.
    async fn append_sent_log(&self, entry: &SentLogEntry) -> Result<(), WarmupError>;

    /// Number of the campaign's contacts that have received at least one email.
    async fn count_contacts_with_emails(&self, campaign: CampaignId) -> Result<u64, WarmupError>;

    /// Number of successful sends logged for the campaign at or after `since`.
    async fn count_sent_since(
        &self,
        campaign: CampaignId,
        since: DateTime<Utc>,
    ) -> Result<u64, WarmupError>;
}
