// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage adapter for deterministic testing.
//!
//! `MemoryStore` implements `WarmupStore` behind a single `tokio::sync::Mutex`,
//! so the conditional counter increment and the claiming contact selection
//! are atomic exactly like their SQL counterparts.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use warmup_core::traits::adapter::PluginAdapter;
use warmup_core::traits::storage::WarmupStore;
use warmup_core::types::{
    AdapterType, Campaign, CampaignId, CampaignStatus, ClaimToken, Contact, ContactId,
    ContactQuery, ContactStatus, Domain, DomainId, HealthStatus, SendOutcome, SentLogEntry,
};
use warmup_core::WarmupError;

struct StoredContact {
    contact: Contact,
    claim: Option<(ClaimToken, DateTime<Utc>)>,
}

struct State {
    next_id: i64,
    campaigns: BTreeMap<CampaignId, Campaign>,
    domains: BTreeMap<DomainId, Domain>,
    contacts: BTreeMap<ContactId, StoredContact>,
    sent_log: Vec<SentLogEntry>,
    health: HealthStatus,
    failing_loads: HashSet<CampaignId>,
    saves: usize,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn domain_mut(&mut self, id: DomainId) -> Result<&mut Domain, WarmupError> {
        self.domains.get_mut(&id).ok_or_else(|| not_found("domain", id))
    }

    fn contact_mut(&mut self, id: ContactId) -> Result<&mut StoredContact, WarmupError> {
        self.contacts.get_mut(&id).ok_or_else(|| not_found("contact", id))
    }
}

fn not_found(entity: &'static str, id: impl ToString) -> WarmupError {
    WarmupError::NotFound {
        entity,
        id: id.to_string(),
    }
}

/// A mutex-guarded in-memory store with failure injection.
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 0,
                campaigns: BTreeMap::new(),
                domains: BTreeMap::new(),
                contacts: BTreeMap::new(),
                sent_log: Vec::new(),
                health: HealthStatus::Healthy,
                failing_loads: HashSet::new(),
                saves: 0,
            }),
        }
    }

    /// Status returned by subsequent health checks.
    pub async fn set_health(&self, health: HealthStatus) {
        self.state.lock().await.health = health;
    }

    /// Make every later `load_campaign(id)` fail with a storage error.
    pub async fn fail_loads_for(&self, id: CampaignId) {
        self.state.lock().await.failing_loads.insert(id);
    }

    /// All contacts of `campaign`, ascending by id.
    pub async fn contacts(&self, campaign: CampaignId) -> Vec<Contact> {
        self.state
            .lock()
            .await
            .contacts
            .values()
            .filter(|c| c.contact.campaign_id == campaign)
            .map(|c| c.contact.clone())
            .collect()
    }

    /// Contacts of `campaign` that still carry a claim, expired or not.
    pub async fn claimed_count(&self, campaign: CampaignId) -> usize {
        self.state
            .lock()
            .await
            .contacts
            .values()
            .filter(|c| c.contact.campaign_id == campaign && c.claim.is_some())
            .count()
    }

    pub async fn sent_log(&self) -> Vec<SentLogEntry> {
        self.state.lock().await.sent_log.clone()
    }

    /// Number of campaign writes so far (whole-row saves, progress records,
    /// and completions that applied).
    pub async fn save_count(&self) -> usize {
        self.state.lock().await.saves
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, WarmupError> {
        Ok(self.state.lock().await.health.clone())
    }

    async fn shutdown(&self) -> Result<(), WarmupError> {
        Ok(())
    }
}

#[async_trait]
impl WarmupStore for MemoryStore {
    async fn load_active_campaigns(&self) -> Result<Vec<Campaign>, WarmupError> {
        Ok(self
            .state
            .lock()
            .await
            .campaigns
            .values()
            .filter(|c| c.status == CampaignStatus::Active)
            .cloned()
            .collect())
    }

    async fn active_campaign_ids(&self) -> Result<Vec<CampaignId>, WarmupError> {
        Ok(self
            .state
            .lock()
            .await
            .campaigns
            .values()
            .filter(|c| c.status == CampaignStatus::Active)
            .map(|c| c.id)
            .collect())
    }

    async fn load_campaign(&self, id: CampaignId) -> Result<Campaign, WarmupError> {
        let state = self.state.lock().await;
        if state.failing_loads.contains(&id) {
            return Err(WarmupError::Storage {
                source: format!("injected load failure for campaign {id}").into(),
            });
        }
        state
            .campaigns
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("campaign", id))
    }

    async fn save_campaign(&self, campaign: &Campaign) -> Result<(), WarmupError> {
        let mut state = self.state.lock().await;
        let stored = state
            .campaigns
            .get_mut(&campaign.id)
            .ok_or_else(|| not_found("campaign", campaign.id))?;
        stored.status = campaign.status;
        stored.progress = campaign.progress;
        stored.counters = campaign.counters;
        stored.completed_at = campaign.completed_at;
        state.saves += 1;
        Ok(())
    }

    async fn record_campaign_progress(
        &self,
        id: CampaignId,
        sent_delta: u64,
        progress: f64,
    ) -> Result<(), WarmupError> {
        let mut state = self.state.lock().await;
        let stored = state
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| not_found("campaign", id))?;
        stored.counters.sent += sent_delta;
        if stored.status == CampaignStatus::Active {
            stored.progress = stored.progress.max(progress);
        }
        state.saves += 1;
        Ok(())
    }

    async fn complete_campaign(
        &self,
        id: CampaignId,
        at: DateTime<Utc>,
    ) -> Result<bool, WarmupError> {
        let mut state = self.state.lock().await;
        let stored = state
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| not_found("campaign", id))?;
        if stored.status != CampaignStatus::Active {
            return Ok(false);
        }
        stored.status = CampaignStatus::Completed;
        stored.progress = 100.0;
        stored.completed_at.get_or_insert(at);
        state.saves += 1;
        Ok(true)
    }

    async fn insert_campaign(&self, campaign: &Campaign) -> Result<CampaignId, WarmupError> {
        let mut state = self.state.lock().await;
        let id = CampaignId(state.next_id());
        let mut campaign = campaign.clone();
        campaign.id = id;
        state.campaigns.insert(id, campaign);
        Ok(id)
    }

    async fn load_domain(&self, id: DomainId) -> Result<Domain, WarmupError> {
        self.state
            .lock()
            .await
            .domains
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("domain", id))
    }

    async fn list_domains(&self) -> Result<Vec<Domain>, WarmupError> {
        Ok(self.state.lock().await.domains.values().cloned().collect())
    }

    async fn insert_domain(&self, domain: &Domain) -> Result<DomainId, WarmupError> {
        let mut state = self.state.lock().await;
        let id = DomainId(state.next_id());
        let mut domain = domain.clone();
        domain.id = id;
        state.domains.insert(id, domain);
        Ok(id)
    }

    async fn increment_domain_counter(
        &self,
        id: DomainId,
        delta: u32,
    ) -> Result<bool, WarmupError> {
        let mut state = self.state.lock().await;
        let domain = state.domain_mut(id)?;
        match domain.sent_today.checked_add(delta) {
            Some(total) if total <= domain.daily_limit => {
                domain.sent_today = total;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_domain_counter(&self, id: DomainId, delta: u32) -> Result<(), WarmupError> {
        let mut state = self.state.lock().await;
        let domain = state.domain_mut(id)?;
        domain.sent_today = domain.sent_today.saturating_sub(delta);
        Ok(())
    }

    async fn reset_domain_counter(
        &self,
        id: DomainId,
        today: NaiveDate,
    ) -> Result<bool, WarmupError> {
        let mut state = self.state.lock().await;
        let domain = state.domain_mut(id)?;
        if domain.last_reset_on.is_some_and(|last| last >= today) {
            return Ok(false);
        }
        domain.sent_today = 0;
        domain.last_reset_on = Some(today);
        Ok(true)
    }

    async fn insert_contact(&self, contact: &Contact) -> Result<ContactId, WarmupError> {
        let mut state = self.state.lock().await;
        let duplicate = state
            .contacts
            .values()
            .any(|c| c.contact.campaign_id == contact.campaign_id && c.contact.email == contact.email);
        if duplicate {
            return Err(WarmupError::Storage {
                source: format!(
                    "contact {} already enrolled in campaign {}",
                    contact.email, contact.campaign_id
                )
                .into(),
            });
        }
        let id = ContactId(state.next_id());
        let mut contact = contact.clone();
        contact.id = id;
        state.contacts.insert(
            id,
            StoredContact {
                contact,
                claim: None,
            },
        );
        Ok(id)
    }

    async fn load_contact(&self, id: ContactId) -> Result<Contact, WarmupError> {
        self.state
            .lock()
            .await
            .contacts
            .get(&id)
            .map(|c| c.contact.clone())
            .ok_or_else(|| not_found("contact", id))
    }

    async fn select_eligible_contacts(
        &self,
        query: &ContactQuery,
    ) -> Result<Vec<Contact>, WarmupError> {
        let mut state = self.state.lock().await;
        let mut selected = Vec::new();
        for stored in state.contacts.values_mut() {
            if selected.len() >= query.limit {
                break;
            }
            let claimed = stored
                .claim
                .as_ref()
                .is_some_and(|(_, until)| *until > query.now);
            if claimed || !query.matches(&stored.contact) {
                continue;
            }
            stored.claim = Some((query.claim.clone(), query.claim_until));
            selected.push(stored.contact.clone());
        }
        Ok(selected)
    }

    async fn release_contact_claims(&self, claim: &ClaimToken) -> Result<u64, WarmupError> {
        let mut state = self.state.lock().await;
        let mut released = 0;
        for stored in state.contacts.values_mut() {
            if stored.claim.as_ref().is_some_and(|(token, _)| token == claim) {
                stored.claim = None;
                released += 1;
            }
        }
        Ok(released)
    }

    async fn renew_contact_claims(
        &self,
        claim: &ClaimToken,
        until: DateTime<Utc>,
    ) -> Result<u64, WarmupError> {
        let mut state = self.state.lock().await;
        let mut renewed = 0;
        for stored in state.contacts.values_mut() {
            if let Some((token, expiry)) = stored.claim.as_mut() {
                if token == claim {
                    *expiry = until;
                    renewed += 1;
                }
            }
        }
        Ok(renewed)
    }

    async fn mark_contact_sent(
        &self,
        id: ContactId,
        claim: &ClaimToken,
        next_send_at: Option<DateTime<Utc>>,
        status: ContactStatus,
    ) -> Result<bool, WarmupError> {
        let mut state = self.state.lock().await;
        let stored = state.contact_mut(id)?;
        if !stored.claim.as_ref().is_some_and(|(token, _)| token == claim) {
            return Ok(false);
        }
        stored.contact.emails_sent += 1;
        stored.contact.send_attempts = 0;
        stored.contact.next_send_at = next_send_at;
        stored.contact.status = status;
        stored.claim = None;
        Ok(true)
    }

    async fn record_failed_attempt(&self, id: ContactId) -> Result<(), WarmupError> {
        let mut state = self.state.lock().await;
        let stored = state.contact_mut(id)?;
        stored.contact.send_attempts += 1;
        stored.claim = None;
        Ok(())
    }

    async fn append_sent_log(&self, entry: &SentLogEntry) -> Result<(), WarmupError> {
        self.state.lock().await.sent_log.push(entry.clone());
        Ok(())
    }

    async fn count_contacts_with_emails(&self, campaign: CampaignId) -> Result<u64, WarmupError> {
        Ok(self
            .state
            .lock()
            .await
            .contacts
            .values()
            .filter(|c| c.contact.campaign_id == campaign && c.contact.emails_sent > 0)
            .count() as u64)
    }

    async fn count_sent_since(
        &self,
        campaign: CampaignId,
        since: DateTime<Utc>,
    ) -> Result<u64, WarmupError> {
        Ok(self
            .state
            .lock()
            .await
            .sent_log
            .iter()
            .filter(|e| {
                e.campaign_id == campaign && e.outcome == SendOutcome::Sent && e.sent_at >= since
            })
            .count() as u64)
    }
}
