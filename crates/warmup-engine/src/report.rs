// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outcome values reported by the planner and the scheduler.

use chrono::{DateTime, Utc};
use strum::Display;
use warmup_core::types::{CampaignId, MatchKind};

/// Why a campaign sent nothing in a pass. These are normal outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// The campaign calendar has not reached day 1.
    NotStarted,
    /// The growth curve allows nothing today.
    ZeroQuota,
    /// Today's allowance has already been sent.
    QuotaReached,
    /// The local time is outside the campaign's send window.
    OutsideSendWindow,
    /// None of the assigned domains is active and verified.
    DomainUnavailable,
    /// Contacts could be sent but none is eligible.
    NoEligibleContacts,
}

/// Counters of one planner invocation that reached dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSummary {
    pub day: i64,
    pub quota: u32,
    pub match_kind: MatchKind,
    /// Successful sends.
    pub dispatched: u32,
    /// Attempts that failed or timed out.
    pub failed: u32,
    /// Claimed contacts returned to the pool because no domain had headroom.
    pub deferred: u32,
    /// The pass was cancelled before every claimed contact was handled.
    pub cancelled: bool,
}

impl DispatchSummary {
    /// Number of dispatch attempts, successful or not.
    pub fn attempted(&self) -> u32 {
        self.dispatched + self.failed
    }
}

/// Result of planning one campaign.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    Skipped { day: i64, reason: SkipReason },
    Dispatched(DispatchSummary),
}

impl PlanOutcome {
    pub fn dispatched(&self) -> u32 {
        match self {
            Self::Skipped { .. } => 0,
            Self::Dispatched(summary) => summary.dispatched,
        }
    }
}

/// Per-campaign status in a pass report.
#[derive(Debug, Clone, PartialEq)]
pub enum CampaignStatusReport {
    Processed(DispatchSummary),
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignOutcome {
    pub campaign_id: CampaignId,
    pub status: CampaignStatusReport,
    /// Progress after the pass; `None` when the campaign failed before tracking.
    pub progress: Option<f64>,
    /// The campaign transitioned to completed during this pass.
    pub completed: bool,
}

/// Summary of one scheduler pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub domains_reset: usize,
    pub outcomes: Vec<CampaignOutcome>,
    pub cancelled: bool,
}

impl PassReport {
    pub fn dispatched(&self) -> u32 {
        self.outcomes
            .iter()
            .map(|o| match &o.status {
                CampaignStatusReport::Processed(s) => s.dispatched,
                _ => 0,
            })
            .sum()
    }

    pub fn failed_campaigns(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, CampaignStatusReport::Failed(_)))
            .count()
    }

    pub fn outcome(&self, id: CampaignId) -> Option<&CampaignOutcome> {
        self.outcomes.iter().find(|o| o.campaign_id == id)
    }
}
