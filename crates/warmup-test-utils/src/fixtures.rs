// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixture builders with workable defaults.

use chrono::NaiveDate;
use warmup_core::types::{
    Campaign, CampaignCounters, CampaignId, CampaignStatus, Contact, ContactId, ContactStatus,
    Content, Domain, DomainId, DomainRotation, GrowthMode, GrowthParams, GrowthPlan, Sequence,
    SendWindow, WarmupPhase,
};

/// Builds an active arithmetic campaign starting 2026-03-01.
pub struct CampaignBuilder {
    campaign: Campaign,
}

impl CampaignBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            campaign: Campaign {
                id: CampaignId(0),
                name: name.to_string(),
                status: CampaignStatus::Active,
                start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap_or_default(),
                growth: GrowthPlan {
                    params: GrowthParams {
                        start_volume: 20,
                        duration_days: 10,
                        daily_increment: 5,
                        total_contacts: 500,
                    },
                    mode: GrowthMode::Arithmetic,
                },
                sequences: Vec::new(),
                fallback: Content {
                    subject: "Hello from {campaign}".into(),
                    body: "Hi {email}".into(),
                },
                domain_ids: Vec::new(),
                rotation: DomainRotation::Priority,
                send_window: None,
                counters: CampaignCounters::default(),
                progress: 0.0,
                completed_at: None,
            },
        }
    }

    pub fn status(mut self, status: CampaignStatus) -> Self {
        self.campaign.status = status;
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.campaign.start_date = date;
        self
    }

    /// Start volume, duration in days, daily increment, total contacts.
    pub fn params(mut self, start: u32, duration: u32, increment: u32, total: u32) -> Self {
        self.campaign.growth.params = GrowthParams {
            start_volume: start,
            duration_days: duration,
            daily_increment: increment,
            total_contacts: total,
        };
        self
    }

    pub fn mode(mut self, mode: GrowthMode) -> Self {
        self.campaign.growth.mode = mode;
        self
    }

    pub fn sequences(mut self, sequences: Vec<Sequence>) -> Self {
        self.campaign.sequences = sequences;
        self
    }

    pub fn fallback(mut self, subject: &str, body: &str) -> Self {
        self.campaign.fallback = Content {
            subject: subject.into(),
            body: body.into(),
        };
        self
    }

    pub fn domains(mut self, ids: Vec<DomainId>) -> Self {
        self.campaign.domain_ids = ids;
        self
    }

    pub fn rotation(mut self, rotation: DomainRotation) -> Self {
        self.campaign.rotation = rotation;
        self
    }

    pub fn window(mut self, window: SendWindow) -> Self {
        self.campaign.send_window = Some(window);
        self
    }

    pub fn progress(mut self, progress: f64) -> Self {
        self.campaign.progress = progress;
        self
    }

    pub fn build(self) -> Campaign {
        self.campaign
    }
}

/// Builds an active, verified domain with a limit of 100 and nothing sent.
pub struct DomainBuilder {
    domain: Domain,
}

impl DomainBuilder {
    pub fn new(hostname: &str) -> Self {
        Self {
            domain: Domain {
                id: DomainId(0),
                hostname: hostname.to_string(),
                daily_limit: 100,
                sent_today: 0,
                active: true,
                verified: true,
                phase: WarmupPhase::Initial,
                timezone: None,
                last_reset_on: None,
            },
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.domain.daily_limit = limit;
        self
    }

    pub fn sent_today(mut self, sent: u32) -> Self {
        self.domain.sent_today = sent;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.domain.active = false;
        self
    }

    pub fn unverified(mut self) -> Self {
        self.domain.verified = false;
        self
    }

    pub fn phase(mut self, phase: WarmupPhase) -> Self {
        self.domain.phase = phase;
        self
    }

    pub fn timezone(mut self, tz: &str) -> Self {
        self.domain.timezone = Some(tz.to_string());
        self
    }

    pub fn last_reset_on(mut self, date: NaiveDate) -> Self {
        self.domain.last_reset_on = Some(date);
        self
    }

    pub fn build(self) -> Domain {
        self.domain
    }
}

/// A reachable, never-emailed contact of `campaign`.
pub fn contact(campaign: CampaignId, email: &str) -> Contact {
    Contact {
        id: ContactId(0),
        campaign_id: campaign,
        email: email.to_string(),
        status: ContactStatus::Pending,
        emails_sent: 0,
        send_attempts: 0,
        next_send_at: None,
        active: true,
        published: true,
        unsubscribed: false,
    }
}
