// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Warmup scheduling and distribution engine.
//!
//! Decides, on every scheduler pass, how many emails each active campaign may
//! send today, which content each contact receives, and which sending domain
//! carries each message without exceeding any domain's daily limit.
//!
//! # Components
//!
//! - [`growth`] - daily quota by campaign day
//! - [`sequence`] - content rotation by campaign day
//! - [`CapacityLedger`] - atomic per-domain daily budgets
//! - [`ContactSelector`] - claiming selection of eligible contacts
//! - [`DistributionPlanner`] - per-campaign allocation and dispatch
//! - [`CampaignProgressTracker`] - progress and completion
//! - [`WarmupScheduler`] - the pass and its periodic driver

pub mod calendar;
pub mod capacity;
pub mod contacts;
pub mod growth;
pub mod planner;
pub mod progress;
pub mod render;
pub mod report;
pub mod scheduler;
pub mod sequence;

pub use calendar::CampaignCalendar;
pub use capacity::CapacityLedger;
pub use contacts::ContactSelector;
pub use planner::DistributionPlanner;
pub use progress::{CampaignProgressTracker, ProgressUpdate};
pub use render::TokenRenderer;
pub use report::{
    CampaignOutcome, CampaignStatusReport, DispatchSummary, PassReport, PlanOutcome, SkipReason,
};
pub use scheduler::WarmupScheduler;
