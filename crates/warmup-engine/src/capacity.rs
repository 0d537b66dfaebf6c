// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-domain daily send budgets.
//!
//! The ledger keeps no state of its own: every counter lives in the store, and
//! [`CapacityLedger::reserve`] goes through the store's atomic
//! check-and-increment, so concurrent campaigns sharing a domain can never
//! collectively exceed its daily limit.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};
use warmup_core::types::{Domain, DomainId};
use warmup_core::{WarmupError, WarmupStore};

/// Reservation front-end over the store's domain counters.
#[derive(Clone)]
pub struct CapacityLedger {
    store: Arc<dyn WarmupStore>,
}

impl CapacityLedger {
    pub fn new(store: Arc<dyn WarmupStore>) -> Self {
        Self { store }
    }

    /// Remaining sends the domain may make today, read fresh from the store.
    pub async fn headroom(&self, id: DomainId) -> Result<u32, WarmupError> {
        Ok(self.store.load_domain(id).await?.headroom())
    }

    /// Try to consume `count` sends from the domain's budget.
    ///
    /// Returns `false` without consuming anything when the domain lacks
    /// headroom; a full domain is a normal outcome, not an error.
    pub async fn reserve(&self, id: DomainId, count: u32) -> Result<bool, WarmupError> {
        if count == 0 {
            return Ok(true);
        }
        let reserved = self.store.increment_domain_counter(id, count).await?;
        if !reserved {
            debug!(domain_id = %id, count, "domain has no headroom");
        }
        Ok(reserved)
    }

    /// Give back sends that were reserved but never attempted.
    pub async fn release(&self, id: DomainId, count: u32) -> Result<(), WarmupError> {
        if count == 0 {
            return Ok(());
        }
        self.store.release_domain_counter(id, count).await
    }

    /// Zero the domain's counter for local date `today`.
    ///
    /// Returns `false` when another run already reset this day.
    pub async fn reset_daily(&self, id: DomainId, today: NaiveDate) -> Result<bool, WarmupError> {
        let reset = self.store.reset_domain_counter(id, today).await?;
        if reset {
            info!(domain_id = %id, %today, "domain daily counter reset");
        }
        Ok(reset)
    }

    /// Whether the domain's local day has rolled past its last reset.
    pub fn needs_reset(domain: &Domain, today: NaiveDate) -> bool {
        match domain.last_reset_on {
            Some(last) => last < today,
            None => true,
        }
    }
}
