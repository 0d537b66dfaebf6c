// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-campaign distribution: quota, pacing, contact selection, domain
//! allocation, and dispatch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use warmup_config::model::SchedulerConfig;
use warmup_core::types::{
    Campaign, ClaimToken, Contact, ContactPredicate, ContactStatus, Domain, DomainRotation,
    ResolvedContent, SendOutcome, SentLogEntry,
};
use warmup_core::{Clock, ContentRenderer, MailTransport, WarmupError, WarmupStore};

use crate::calendar::CampaignCalendar;
use crate::capacity::CapacityLedger;
use crate::contacts::ContactSelector;
use crate::growth;
use crate::render::TokenRenderer;
use crate::report::{DispatchSummary, PlanOutcome, SkipReason};
use crate::sequence;

/// Turns one campaign's quota for today into dispatched emails.
///
/// A planner invocation never holds a domain reservation without attempting a
/// dispatch for it, and always releases the contact claims it did not use,
/// whether it finishes, fails, or is cancelled. The batch lease is renewed
/// before every dispatch, so a slow batch keeps its contacts.
pub struct DistributionPlanner {
    store: Arc<dyn WarmupStore>,
    transport: Arc<dyn MailTransport>,
    clock: Arc<dyn Clock>,
    renderer: Arc<dyn ContentRenderer>,
    ledger: CapacityLedger,
    contacts: ContactSelector,
    calendar: CampaignCalendar,
    max_batch_size: u32,
    dispatch_timeout: Duration,
}

/// Mutable state of one dispatch loop.
struct DispatchState {
    summary: DispatchSummary,
    cursor: usize,
}

impl DistributionPlanner {
    pub fn new(
        config: &SchedulerConfig,
        calendar: CampaignCalendar,
        store: Arc<dyn WarmupStore>,
        transport: Arc<dyn MailTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger: CapacityLedger::new(store.clone()),
            contacts: ContactSelector::new(store.clone(), config),
            store,
            transport,
            clock,
            renderer: Arc::new(TokenRenderer),
            calendar,
            max_batch_size: config.max_batch_size,
            dispatch_timeout: Duration::from_secs(config.dispatch_timeout_secs),
        }
    }

    /// Replace the default [`TokenRenderer`].
    pub fn with_renderer(mut self, renderer: Arc<dyn ContentRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Plan and dispatch today's sends of `campaign`.
    pub async fn plan(
        &self,
        campaign: &Campaign,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<PlanOutcome, WarmupError> {
        let day = self.calendar.day_index(campaign.start_date, now);
        let skip = |reason: SkipReason| -> Result<PlanOutcome, WarmupError> {
            debug!(campaign_id = %campaign.id, day, %reason, "campaign skipped");
            Ok(PlanOutcome::Skipped { day, reason })
        };

        let domains = self.usable_domains(campaign).await?;
        if domains.is_empty() {
            return skip(SkipReason::DomainUnavailable);
        }
        if day <= 0 {
            return skip(SkipReason::NotStarted);
        }

        let quota = growth::daily_quota(day, &campaign.growth);
        if quota == 0 {
            return skip(SkipReason::ZeroQuota);
        }

        let target = match campaign.send_window {
            Some(window) => match self.calendar.window_progress(window, now) {
                Some(fraction) => paced_target(quota, fraction),
                None => return skip(SkipReason::OutsideSendWindow),
            },
            None => quota,
        };
        let midnight = self.calendar.start_of_day(self.calendar.local_date(now));
        let sent_today = self.store.count_sent_since(campaign.id, midnight).await?;
        let remaining = u64::from(target)
            .saturating_sub(sent_today)
            .min(u64::from(self.max_batch_size));
        if remaining == 0 {
            return skip(SkipReason::QuotaReached);
        }
        // Bounded by max_batch_size, which is a u32.
        let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);

        let content = sequence::select(day, &campaign.sequences, &campaign.fallback);
        let claim = ClaimToken::generate();

        let result = self
            .select_and_dispatch(
                campaign, day, &domains, &content, &claim, remaining, now, cancel,
            )
            .await;

        match self.contacts.release(&claim).await {
            Ok(released) if released > 0 => {
                debug!(campaign_id = %campaign.id, released, "unused contact claims released");
            }
            Ok(_) => {}
            Err(e) => warn!(campaign_id = %campaign.id, error = %e, "failed to release contact claims"),
        }

        let Some(mut summary) = result? else {
            return skip(SkipReason::NoEligibleContacts);
        };
        summary.day = day;
        summary.quota = quota;
        info!(
            campaign_id = %campaign.id,
            day,
            quota,
            sequence_day = content.sequence_day,
            match_kind = %content.match_kind,
            dispatched = summary.dispatched,
            failed = summary.failed,
            deferred = summary.deferred,
            cancelled = summary.cancelled,
            "campaign dispatch finished"
        );
        Ok(PlanOutcome::Dispatched(summary))
    }

    /// Assigned domains that are active and verified, in priority order.
    async fn usable_domains(&self, campaign: &Campaign) -> Result<Vec<Domain>, WarmupError> {
        let mut domains = Vec::with_capacity(campaign.domain_ids.len());
        for id in &campaign.domain_ids {
            let domain = self.store.load_domain(*id).await?;
            if domain.is_usable() {
                domains.push(domain);
            } else {
                debug!(campaign_id = %campaign.id, domain_id = %id, "domain not usable");
            }
        }
        Ok(domains)
    }

    /// Returns `None` when no contact was eligible.
    #[allow(clippy::too_many_arguments)]
    async fn select_and_dispatch(
        &self,
        campaign: &Campaign,
        day: i64,
        domains: &[Domain],
        content: &ResolvedContent,
        claim: &ClaimToken,
        limit: usize,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Option<DispatchSummary>, WarmupError> {
        let mut batch = self
            .contacts
            .select(campaign.id, ContactPredicate::FollowUp, limit, now, claim)
            .await?;
        let first = self
            .contacts
            .select(
                campaign.id,
                ContactPredicate::FirstEmail,
                limit - batch.len(),
                now,
                claim,
            )
            .await?;
        batch.extend(first);
        if batch.is_empty() {
            return Ok(None);
        }

        let mut state = DispatchState {
            summary: DispatchSummary {
                day: 0,
                quota: 0,
                match_kind: content.match_kind,
                dispatched: 0,
                failed: 0,
                deferred: 0,
                cancelled: false,
            },
            cursor: 0,
        };

        for (index, contact) in batch.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(campaign_id = %campaign.id, "dispatch cancelled");
                state.summary.cancelled = true;
                break;
            }
            self.contacts.renew(claim, self.clock.now()).await?;
            let Some(domain) = self.allocate(campaign.rotation, domains, &mut state).await? else {
                let deferred = batch.len() - index;
                debug!(campaign_id = %campaign.id, deferred, "all domains at capacity");
                state.summary.deferred = u32::try_from(deferred).unwrap_or(u32::MAX);
                break;
            };
            let rendered = self.renderer.render(content, contact, campaign, day);
            self.dispatch(campaign, domain, contact, claim, &rendered, now, &mut state.summary)
                .await?;
        }

        Ok(Some(state.summary))
    }

    /// Reserve one send on the first domain with headroom, starting at the cursor.
    async fn allocate<'a>(
        &self,
        rotation: DomainRotation,
        domains: &'a [Domain],
        state: &mut DispatchState,
    ) -> Result<Option<&'a Domain>, WarmupError> {
        let count = domains.len();
        for offset in 0..count {
            let index = (state.cursor + offset) % count;
            let domain = &domains[index];
            if self.ledger.reserve(domain.id, 1).await? {
                if rotation == DomainRotation::RoundRobin {
                    state.cursor = (index + 1) % count;
                }
                return Ok(Some(domain));
            }
        }
        Ok(None)
    }

    /// Send one message and record the attempt. The reservation is spent either way.
    #[allow(clippy::too_many_arguments)]
    async fn dispatch(
        &self,
        campaign: &Campaign,
        domain: &Domain,
        contact: &Contact,
        claim: &ClaimToken,
        content: &ResolvedContent,
        now: DateTime<Utc>,
        summary: &mut DispatchSummary,
    ) -> Result<(), WarmupError> {
        let sent = match tokio::time::timeout(
            self.dispatch_timeout,
            self.transport.send(domain, contact, content),
        )
        .await
        {
            Ok(result) => result,
            Err(_elapsed) => Err(WarmupError::Timeout {
                duration: self.dispatch_timeout,
            }),
        };
        let sent_at = self.clock.now();

        let mut entry = SentLogEntry {
            domain_id: domain.id,
            campaign_id: campaign.id,
            contact_id: contact.id,
            sequence_day: content.sequence_day,
            subject: content.subject.clone(),
            body: content.body.clone(),
            sent_at,
            outcome: SendOutcome::Sent,
            message_id: None,
            error: None,
        };

        match sent {
            Ok(message_id) => {
                let next_send_at = self.next_send_at(campaign, now);
                let status = if next_send_at.is_some() {
                    ContactStatus::Scheduled
                } else {
                    ContactStatus::Sent
                };
                let recorded = self
                    .store
                    .mark_contact_sent(contact.id, claim, next_send_at, status)
                    .await?;
                if !recorded {
                    // The message went out; only the contact row stays as it was.
                    warn!(
                        campaign_id = %campaign.id,
                        contact_id = %contact.id,
                        "claim lost before the send was recorded"
                    );
                }
                entry.message_id = Some(message_id);
                self.store.append_sent_log(&entry).await?;
                summary.dispatched += 1;
            }
            Err(e) => {
                warn!(
                    campaign_id = %campaign.id,
                    contact_id = %contact.id,
                    domain_id = %domain.id,
                    attempts = contact.send_attempts + 1,
                    error = %e,
                    "dispatch failed"
                );
                self.store.record_failed_attempt(contact.id).await?;
                entry.outcome = SendOutcome::Failed;
                entry.error = Some(e.to_string());
                self.store.append_sent_log(&entry).await?;
                summary.failed += 1;
            }
        }
        Ok(())
    }

    /// Local midnight of the next configured sequence day after today.
    fn next_send_at(&self, campaign: &Campaign, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let day = self.calendar.day_index(campaign.start_date, now);
        let next = sequence::next_sequence_day(day, &campaign.sequences)?;
        let date = self.calendar.date_of_day(campaign.start_date, next)?;
        Some(self.calendar.start_of_day(date))
    }
}

/// Share of `quota` allowed once `fraction` of the send window has elapsed.
fn paced_target(quota: u32, fraction: f64) -> u32 {
    let paced = (f64::from(quota) * fraction.clamp(0.0, 1.0)).ceil() as u32;
    paced.clamp(1, quota)
}
