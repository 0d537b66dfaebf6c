// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Warmup scheduling engine.
//!
//! Defines the domain model (campaigns, domains, contacts, sent logs), the
//! shared error type, and the collaborator traits that storage, transport,
//! clock, and rendering adapters implement.

pub mod error;
pub mod traits;
pub mod types;

pub use error::WarmupError;
pub use types::{
    AdapterType, Campaign, CampaignId, ClaimToken, Contact, ContactId, ContactPredicate,
    ContactQuery, ContactStatus, Domain, DomainId, HealthStatus, ResolvedContent, SentLogEntry,
};

pub use traits::{
    Clock, ContentRenderer, MailTransport, PluginAdapter, SystemClock, WarmupStore,
};
