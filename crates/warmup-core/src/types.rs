// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the engine, the storage adapters, and the transports.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::WarmupError;

/// Identifier of a warmup campaign.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CampaignId(pub i64);

/// Identifier of a sending domain.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DomainId(pub i64);

/// Identifier of a contact. Ascending ids follow insertion order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ContactId(pub i64);

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pass-local lease on a set of contacts.
///
/// Contacts selected under a claim are invisible to every other selection
/// until the claim is cleared or its lease expires.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimToken(pub String);

impl ClaimToken {
    /// Generate a fresh random claim token.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ClaimToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Transport,
}

/// Lifecycle status of a campaign.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
}

impl CampaignStatus {
    /// Whether a campaign in this status may move to `to`.
    ///
    /// Allowed: draft -> active, active -> paused, active -> completed,
    /// paused -> active. Nothing leaves completed.
    pub fn can_transition_to(self, to: CampaignStatus) -> bool {
        use CampaignStatus::*;
        matches!(
            (self, to),
            (Draft, Active) | (Active, Paused) | (Active, Completed) | (Paused, Active)
        )
    }
}

/// Lifecycle status of a contact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    Pending,
    /// At least one email went out and a follow-up is due later.
    Scheduled,
    Sent,
    Opened,
    Clicked,
    Bounced,
    Unsubscribed,
}

/// Coarse warmup stage of a domain, independent of any campaign's growth curve.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WarmupPhase {
    Initial,
    Ramping,
    Established,
}

/// How the planner walks a campaign's assigned domains.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DomainRotation {
    /// Always start from the first (highest-priority) domain.
    #[default]
    Priority,
    /// Start from the domain after the one that took the previous send.
    RoundRobin,
}

/// Outcome recorded in a sent log entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SendOutcome {
    Sent,
    Failed,
}

/// How the sequence selector arrived at its choice.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// The campaign has no sequences; fallback content was used.
    NoneConfigured,
    /// A sequence is configured for exactly this day.
    ExactMatch,
    /// No sequence for this day; the list was indexed with wrap-around.
    Wrapped,
}

/// One piece of email content bound to a campaign day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    /// 1-based campaign day this content targets.
    pub day: i64,
    /// Subject template; tokens are substituted per contact.
    pub subject: String,
    /// Body template; tokens are substituted per contact.
    pub body: String,
}

/// Subject and body used when a campaign has no sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// Subject template.
    pub subject: String,
    /// Body template.
    pub body: String,
}

/// Content chosen for a campaign day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedContent {
    /// Subject, before or after rendering.
    pub subject: String,
    /// Body, before or after rendering.
    pub body: String,
    /// The sequence day the content belongs to (the requested day for fallback content).
    pub sequence_day: i64,
    /// How the content was chosen for the requested day.
    pub match_kind: MatchKind,
}

/// Explicit volume for a single campaign day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Campaign day the entry applies to, matched by value rather than
    /// by position in the list.
    pub day: i64,
    /// Emails to send that day, before the daily cap.
    pub email_count: u32,
}

/// Shape of a campaign's growth curve.
///
/// Decoded and validated once when the campaign is loaded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrowthMode {
    /// `start + (day - 1) * increment`.
    #[default]
    Arithmetic,
    /// `start` every day.
    Flat,
    /// `start * multiplier^(day - 1)`.
    Geometric {
        /// Day-over-day growth factor, at least 1.0.
        multiplier: f64,
    },
    /// Linear ramp from `start` on day 1 to the daily cap on the last day.
    Progressive,
    /// Arithmetic with a deterministic per-day jitter of up to `jitter_percent`.
    Randomized {
        /// Largest deviation from the arithmetic volume, in percent (0-100).
        jitter_percent: u8,
        /// Seed mixed with the day index so every day's jitter is reproducible.
        seed: u64,
    },
    /// Verbatim per-day volumes; days without an entry fall back to arithmetic.
    ExplicitPlan {
        /// Per-day volumes; at most one entry per day.
        entries: Vec<PlanEntry>,
    },
}

/// Numeric parameters shared by every growth mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrowthParams {
    /// Volume of campaign day 1.
    pub start_volume: u32,
    /// Length of the ramp in days; the daily cap divides the target by it.
    pub duration_days: u32,
    /// Volume added per day by the arithmetic and randomized modes.
    pub daily_increment: u32,
    /// Number of contacts the campaign aims to reach.
    pub total_contacts: u32,
}

/// Complete growth configuration of a campaign.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GrowthPlan {
    pub params: GrowthParams,
    /// Curve applied to `params`.
    pub mode: GrowthMode,
}

impl GrowthPlan {
    /// Check the mode-specific fields.
    ///
    /// Zero duration or zero contacts are accepted; such campaigns simply never
    /// get a quota.
    pub fn validate(&self) -> Result<(), String> {
        match &self.mode {
            GrowthMode::Geometric { multiplier } => {
                if !multiplier.is_finite() || *multiplier < 1.0 {
                    return Err(format!(
                        "geometric multiplier must be a finite value >= 1.0, got {multiplier}"
                    ));
                }
            }
            GrowthMode::Randomized { jitter_percent, .. } => {
                if *jitter_percent > 100 {
                    return Err(format!(
                        "jitter_percent must be at most 100, got {jitter_percent}"
                    ));
                }
            }
            GrowthMode::ExplicitPlan { entries } => {
                let mut seen = HashSet::new();
                for entry in entries {
                    if entry.day < 1 {
                        return Err(format!("plan entry day must be >= 1, got {}", entry.day));
                    }
                    if !seen.insert(entry.day) {
                        return Err(format!("duplicate plan entry for day {}", entry.day));
                    }
                }
            }
            GrowthMode::Arithmetic | GrowthMode::Flat | GrowthMode::Progressive => {}
        }
        Ok(())
    }
}

/// Daily window (local hours) in which a campaign may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendWindow {
    /// First hour of the window, inclusive (0-23).
    pub start_hour: u8,
    /// Hour the window closes, exclusive (1-24).
    pub end_hour: u8,
}

/// Cumulative delivery counters of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CampaignCounters {
    /// Successful dispatches, incremented in place by each pass.
    pub sent: u64,
    pub delivered: u64,
    pub opened: u64,
    pub clicked: u64,
    pub bounced: u64,
}

/// A warmup campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    /// Display name, also available to templates as `{campaign}`.
    pub name: String,
    /// Only active campaigns are processed by a pass.
    pub status: CampaignStatus,
    /// Local calendar date of campaign day 1.
    pub start_date: NaiveDate,
    /// Daily volume curve.
    pub growth: GrowthPlan,
    /// Day-bound content, in the order used for wrap-around.
    pub sequences: Vec<Sequence>,
    /// Content used when `sequences` is empty.
    pub fallback: Content,
    /// Assigned sending domains in priority order.
    pub domain_ids: Vec<DomainId>,
    /// How sends are spread over `domain_ids`.
    pub rotation: DomainRotation,
    /// Pacing window; `None` allows the whole quota at any hour.
    pub send_window: Option<SendWindow>,
    pub counters: CampaignCounters,
    /// Completion percentage in `[0, 100]`.
    pub progress: f64,
    /// Set on the first transition to completed and never changed after.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Campaign {
    /// Target number of contacts for the campaign.
    pub fn total_contacts(&self) -> u32 {
        self.growth.params.total_contacts
    }

    /// Move the campaign to `to`, stamping the completion time on first completion.
    ///
    /// Transitioning to the current status is a no-op.
    pub fn transition(&mut self, to: CampaignStatus, at: DateTime<Utc>) -> Result<(), WarmupError> {
        if self.status == to {
            return Ok(());
        }
        if !self.status.can_transition_to(to) {
            return Err(WarmupError::InvalidCampaign {
                id: self.id.to_string(),
                reason: format!("cannot transition from {} to {}", self.status, to),
            });
        }
        if to == CampaignStatus::Completed && self.completed_at.is_none() {
            self.completed_at = Some(at);
        }
        tracing::debug!(campaign_id = %self.id, from = %self.status, to = %to, "campaign status transition");
        self.status = to;
        Ok(())
    }

    /// Validate the decoded configuration of the campaign.
    pub fn validate(&self) -> Result<(), WarmupError> {
        let invalid = |reason: String| WarmupError::InvalidCampaign {
            id: self.id.to_string(),
            reason,
        };

        self.growth.validate().map_err(invalid)?;

        if let Some(sequence) = self.sequences.iter().find(|s| s.day < 1) {
            return Err(invalid(format!(
                "sequence day must be >= 1, got {}",
                sequence.day
            )));
        }

        if let Some(window) = self.send_window {
            if window.start_hour >= window.end_hour || window.end_hour > 24 {
                return Err(invalid(format!(
                    "send window {}..{} is not a valid hour range",
                    window.start_hour, window.end_hour
                )));
            }
        }

        if !(0.0..=100.0).contains(&self.progress) {
            return Err(invalid(format!(
                "progress must be within [0, 100], got {}",
                self.progress
            )));
        }

        Ok(())
    }
}

/// A sending domain with its daily budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: DomainId,
    /// Host used for the sender address and the Message-ID.
    pub hostname: String,
    /// Most sends allowed per local day.
    pub daily_limit: u32,
    /// Sends reserved since the last reset; never above `daily_limit`.
    pub sent_today: u32,
    pub active: bool,
    /// DNS authentication confirmed; unverified domains are never used.
    pub verified: bool,
    pub phase: WarmupPhase,
    /// IANA time zone for the daily reset; `None` uses the scheduler's zone.
    pub timezone: Option<String>,
    /// Local date of the last daily counter reset.
    pub last_reset_on: Option<NaiveDate>,
}

impl Domain {
    /// Whether the domain may be used for sending at all.
    pub fn is_usable(&self) -> bool {
        self.active && self.verified
    }

    /// Remaining sends allowed today.
    pub fn headroom(&self) -> u32 {
        self.daily_limit.saturating_sub(self.sent_today)
    }
}

/// A contact enrolled in a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub campaign_id: CampaignId,
    /// Recipient address.
    pub email: String,
    pub status: ContactStatus,
    /// Successful sends so far; a contact counts as reached once this is positive.
    pub emails_sent: u32,
    /// Failed dispatch attempts since the last successful send.
    pub send_attempts: u32,
    /// When the next follow-up becomes due; `None` when nothing is scheduled.
    pub next_send_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub published: bool,
    pub unsubscribed: bool,
}

impl Contact {
    /// Whether the contact may be emailed at all, regardless of schedule.
    pub fn is_reachable(&self) -> bool {
        self.active && self.published && !self.unsubscribed
    }
}

/// Append-only record of one dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentLogEntry {
    /// Domain whose budget the attempt spent.
    pub domain_id: DomainId,
    pub campaign_id: CampaignId,
    pub contact_id: ContactId,
    /// Sequence day of the content, which may differ from the campaign day.
    pub sequence_day: i64,
    /// Rendered subject as sent.
    pub subject: String,
    /// Rendered body as sent.
    pub body: String,
    /// When the transport returned; used for sent-today counts.
    pub sent_at: DateTime<Utc>,
    pub outcome: SendOutcome,
    /// Message-ID assigned by the transport on success.
    pub message_id: Option<String>,
    /// Transport or timeout error on failure.
    pub error: Option<String>,
}

/// Which eligibility rule a contact selection uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum ContactPredicate {
    /// Pending contacts that have never been emailed.
    FirstEmail,
    /// Contacts already emailed whose next send time has arrived.
    FollowUp,
}

/// Parameters of a claiming contact selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactQuery {
    pub campaign_id: CampaignId,
    /// Eligibility rule to apply.
    pub predicate: ContactPredicate,
    /// Most contacts to claim.
    pub limit: usize,
    /// Time against which follow-ups and existing leases are judged.
    pub now: DateTime<Utc>,
    /// Contacts with this many failed attempts are no longer selected.
    pub max_attempts: u32,
    /// Token written onto every selected contact.
    pub claim: ClaimToken,
    /// Lease expiry of the claim.
    pub claim_until: DateTime<Utc>,
}

impl ContactQuery {
    /// Whether `contact` satisfies the query disregarding claims.
    pub fn matches(&self, contact: &Contact) -> bool {
        if contact.campaign_id != self.campaign_id || !contact.is_reachable() {
            return false;
        }
        if contact.send_attempts >= self.max_attempts {
            return false;
        }
        match self.predicate {
            ContactPredicate::FirstEmail => {
                contact.status == ContactStatus::Pending && contact.emails_sent == 0
            }
            ContactPredicate::FollowUp => {
                matches!(
                    contact.status,
                    ContactStatus::Pending | ContactStatus::Scheduled
                ) && contact.emails_sent > 0
                    && contact.next_send_at.is_some_and(|at| at <= self.now)
            }
        }
    }
}
