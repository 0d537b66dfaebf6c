// SPDX-FileCopyrightText: 2026 Warmup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the `WarmupStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use warmup_config::model::StorageConfig;
use warmup_core::types::{
    AdapterType, Campaign, CampaignId, CampaignStatus, ClaimToken, Contact, ContactId,
    ContactQuery, ContactStatus, Domain, DomainId, HealthStatus, SentLogEntry,
};
use warmup_core::{PluginAdapter, WarmupError, WarmupStore};

use crate::database::{map_tr_err, Database};
use crate::queries;

/// SQLite-backed store.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules. The
/// database is opened by [`SqliteStore::initialize`]; every other operation
/// fails until then.
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// The database is not opened until [`initialize`](Self::initialize) is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create the store and open its database in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, WarmupError> {
        let store = Self::new(config);
        store.initialize().await?;
        Ok(store)
    }

    /// Open the database, applying PRAGMAs and migrations.
    pub async fn initialize(&self) -> Result<(), WarmupError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| WarmupError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite store initialized");
        Ok(())
    }

    fn db(&self) -> Result<&Database, WarmupError> {
        self.db.get().ok_or_else(|| WarmupError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, WarmupError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WarmupError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(map_tr_err)?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl WarmupStore for SqliteStore {
    // --- Campaigns ---

    async fn load_active_campaigns(&self) -> Result<Vec<Campaign>, WarmupError> {
        queries::campaigns::campaigns_with_status(self.db()?, CampaignStatus::Active).await
    }

    async fn active_campaign_ids(&self) -> Result<Vec<CampaignId>, WarmupError> {
        queries::campaigns::campaign_ids_with_status(self.db()?, CampaignStatus::Active).await
    }

    async fn load_campaign(&self, id: CampaignId) -> Result<Campaign, WarmupError> {
        queries::campaigns::load_campaign(self.db()?, id).await
    }

    async fn save_campaign(&self, campaign: &Campaign) -> Result<(), WarmupError> {
        queries::campaigns::save_campaign(self.db()?, campaign).await
    }

    async fn record_campaign_progress(
        &self,
        id: CampaignId,
        sent_delta: u64,
        progress: f64,
    ) -> Result<(), WarmupError> {
        queries::campaigns::record_progress(self.db()?, id, sent_delta, progress).await
    }

    async fn complete_campaign(
        &self,
        id: CampaignId,
        at: DateTime<Utc>,
    ) -> Result<bool, WarmupError> {
        queries::campaigns::complete_campaign(self.db()?, id, at).await
    }

    async fn insert_campaign(&self, campaign: &Campaign) -> Result<CampaignId, WarmupError> {
        queries::campaigns::insert_campaign(self.db()?, campaign).await
    }

    // --- Domains ---

    async fn load_domain(&self, id: DomainId) -> Result<Domain, WarmupError> {
        queries::domains::load_domain(self.db()?, id).await
    }

    async fn list_domains(&self) -> Result<Vec<Domain>, WarmupError> {
        queries::domains::list_domains(self.db()?).await
    }

    async fn insert_domain(&self, domain: &Domain) -> Result<DomainId, WarmupError> {
        queries::domains::insert_domain(self.db()?, domain).await
    }

    async fn increment_domain_counter(
        &self,
        id: DomainId,
        delta: u32,
    ) -> Result<bool, WarmupError> {
        queries::domains::increment_counter(self.db()?, id, delta).await
    }

    async fn release_domain_counter(&self, id: DomainId, delta: u32) -> Result<(), WarmupError> {
        queries::domains::release_counter(self.db()?, id, delta).await
    }

    async fn reset_domain_counter(
        &self,
        id: DomainId,
        today: NaiveDate,
    ) -> Result<bool, WarmupError> {
        queries::domains::reset_counter(self.db()?, id, today).await
    }

    // --- Contacts ---

    async fn insert_contact(&self, contact: &Contact) -> Result<ContactId, WarmupError> {
        queries::contacts::insert_contact(self.db()?, contact).await
    }

    async fn load_contact(&self, id: ContactId) -> Result<Contact, WarmupError> {
        queries::contacts::load_contact(self.db()?, id).await
    }

    async fn select_eligible_contacts(
        &self,
        query: &ContactQuery,
    ) -> Result<Vec<Contact>, WarmupError> {
        queries::contacts::select_and_claim(self.db()?, query).await
    }

    async fn release_contact_claims(&self, claim: &ClaimToken) -> Result<u64, WarmupError> {
        queries::contacts::release_claims(self.db()?, claim).await
    }

    async fn renew_contact_claims(
        &self,
        claim: &ClaimToken,
        until: DateTime<Utc>,
    ) -> Result<u64, WarmupError> {
        queries::contacts::renew_claims(self.db()?, claim, until).await
    }

    async fn mark_contact_sent(
        &self,
        id: ContactId,
        claim: &ClaimToken,
        next_send_at: Option<DateTime<Utc>>,
        status: ContactStatus,
    ) -> Result<bool, WarmupError> {
        queries::contacts::mark_sent(self.db()?, id, claim, next_send_at, status).await
    }

    async fn record_failed_attempt(&self, id: ContactId) -> Result<(), WarmupError> {
        queries::contacts::record_failure(self.db()?, id).await
    }

    async fn count_contacts_with_emails(&self, campaign: CampaignId) -> Result<u64, WarmupError> {
        queries::contacts::count_with_emails(self.db()?, campaign).await
    }

    // --- Sent log ---

    async fn append_sent_log(&self, entry: &SentLogEntry) -> Result<(), WarmupError> {
        queries::sent_log::append(self.db()?, entry).await
    }

    async fn count_sent_since(
        &self,
        campaign: CampaignId,
        since: DateTime<Utc>,
    ) -> Result<u64, WarmupError> {
        queries::sent_log::count_sent_since(self.db()?, campaign, since).await
    }
}
