// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journal entry service.
//!
//! Owns the interaction between the entry store and the read-through cache:
//! - Existence checks for creates always go to the store, never the cache
//! - Every successful write refreshes the cache after the store write
//! - Reads return a cache hit without touching the store
//! - Deletes drop the cache key after the store delete
//!
//! Each public operation returns its result together with the audit event
//! describing it; persisting that event is the caller's job (see
//! [`crate::services::AuditService::commit`]).

use crate::cache::{CacheKey, EntryCache};
use crate::db::EntryStore;
use crate::error::AppError;
use crate::models::{
    AuditEvent, Audited, Entry, EntryFields, EntryPage, RemoveAck, Upserted,
};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on `limit` for entry listings.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Tunables for the entry service.
#[derive(Debug, Clone, Copy)]
pub struct EntrySettings {
    pub cache_ttl: Duration,
    pub default_page_size: u32,
}

impl Default for EntrySettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(crate::config::DEFAULT_CACHE_TTL_SECS),
            default_page_size: crate::config::DEFAULT_PAGE_SIZE,
        }
    }
}

/// Create/read/update/delete for journal entries keyed by `(owner, date)`.
#[derive(Clone)]
pub struct EntryService {
    store: Arc<dyn EntryStore>,
    cache: Arc<dyn EntryCache>,
    settings: EntrySettings,
}

impl EntryService {
    pub fn new(
        store: Arc<dyn EntryStore>,
        cache: Arc<dyn EntryCache>,
        settings: EntrySettings,
    ) -> Self {
        Self {
            store,
            cache,
            settings,
        }
    }

    /// Create the entry for `date`; fails with `Conflict` if one exists.
    pub async fn create(
        &self,
        owner_id: &str,
        date: NaiveDate,
        fields: &EntryFields,
    ) -> Result<Audited<Entry>, AppError> {
        tracing::debug!(owner_id, %date, "Entry create attempt");

        // Authoritative check against the store; a stale cache miss must not
        // let a duplicate through.
        if self.store.find_entry(owner_id, date).await?.is_some() {
            tracing::warn!(owner_id, %date, "Entry creation failed - already exists");
            return Err(conflict(date));
        }

        // The store's uniqueness constraint settles races between concurrent
        // creates that both passed the check above.
        let entry = match self.store.insert_entry(owner_id, date, fields).await {
            Ok(entry) => entry,
            Err(AppError::Conflict(_)) => {
                tracing::warn!(owner_id, %date, "Entry creation lost insert race");
                return Err(conflict(date));
            }
            Err(e) => return Err(e),
        };

        self.cache_entry(&entry).await?;
        tracing::info!(owner_id, %date, "Entry created");

        Ok(Audited::new(
            entry,
            AuditEvent::create_entry(owner_id, date, fields),
        ))
    }

    /// Create the entry for `date`, or merge `fields` into the existing one.
    ///
    /// Never fails with `Conflict`.
    pub async fn create_or_update(
        &self,
        owner_id: &str,
        date: NaiveDate,
        fields: &EntryFields,
    ) -> Result<Audited<Upserted>, AppError> {
        let existing = self.store.find_entry(owner_id, date).await?;

        let (entry, created) = match existing {
            Some(current) => (self.merge_and_save(current, fields).await?, false),
            None => match self.store.insert_entry(owner_id, date, fields).await {
                Ok(entry) => (entry, true),
                Err(AppError::Conflict(_)) => {
                    // Someone else created it between our check and insert.
                    let current = self
                        .store
                        .find_entry(owner_id, date)
                        .await?
                        .ok_or_else(|| not_found(date))?;
                    (self.merge_and_save(current, fields).await?, false)
                }
                Err(e) => return Err(e),
            },
        };

        self.cache_entry(&entry).await?;
        tracing::info!(owner_id, %date, created, "Entry upserted");

        let event = if created {
            AuditEvent::create_entry(owner_id, date, fields)
        } else {
            AuditEvent::update_entry(owner_id, date, fields)
        };

        Ok(Audited::new(Upserted { entry, created }, event))
    }

    /// Fetch the entry for `date`, serving from cache when possible.
    pub async fn find_one(
        &self,
        owner_id: &str,
        date: NaiveDate,
    ) -> Result<Audited<Entry>, AppError> {
        let entry = self.lookup(owner_id, date).await?;
        Ok(Audited::new(entry, AuditEvent::view_entry(owner_id, date)))
    }

    /// List entries newest first. Bypasses the cache.
    pub async fn find_all(
        &self,
        owner_id: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Audited<EntryPage>, AppError> {
        let limit = limit.unwrap_or(self.settings.default_page_size);
        let offset = offset.unwrap_or(0);

        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let (entries, total) = self.store.list_entries(owner_id, limit, offset).await?;

        tracing::debug!(owner_id, limit, offset, total, "Entries listed");

        let event = AuditEvent::view_entries(owner_id, limit, offset, entries.len());
        Ok(Audited::new(EntryPage { entries, total }, event))
    }

    /// Merge `changes` into the existing entry for `date`.
    pub async fn update(
        &self,
        owner_id: &str,
        date: NaiveDate,
        changes: &EntryFields,
    ) -> Result<Audited<Entry>, AppError> {
        let current = self.lookup(owner_id, date).await?;
        let entry = self.merge_and_save(current, changes).await?;
        self.cache_entry(&entry).await?;

        tracing::info!(owner_id, %date, "Entry updated");

        Ok(Audited::new(
            entry,
            AuditEvent::update_entry(owner_id, date, changes),
        ))
    }

    /// Delete the entry for `date` and drop it from the cache.
    pub async fn remove(
        &self,
        owner_id: &str,
        date: NaiveDate,
    ) -> Result<Audited<RemoveAck>, AppError> {
        self.lookup(owner_id, date).await?;

        self.store.delete_entry(owner_id, date).await?;

        let key = CacheKey::new(owner_id, date);
        self.cache.delete(&key).await?;
        tracing::debug!(key = %key, "Entry cache delete");
        tracing::info!(owner_id, %date, "Entry deleted");

        Ok(Audited::new(
            RemoveAck { success: true },
            AuditEvent::delete_entry(owner_id, date),
        ))
    }

    // ─── Helpers ─────────────────────────────────────────────────

    /// Cache-first read shared by `find_one`, `update` and `remove`.
    async fn lookup(&self, owner_id: &str, date: NaiveDate) -> Result<Entry, AppError> {
        let key = CacheKey::new(owner_id, date);

        if let Some(entry) = self.cache.get(&key).await? {
            tracing::debug!(key = %key, hit = true, "Entry cache hit");
            return Ok(entry);
        }
        tracing::debug!(key = %key, hit = false, "Entry cache miss");

        let entry = match self.store.find_entry(owner_id, date).await? {
            Some(entry) => entry,
            None => {
                tracing::warn!(owner_id, %date, "Entry not found");
                return Err(not_found(date));
            }
        };

        self.cache_entry(&entry).await?;
        Ok(entry)
    }

    async fn merge_and_save(
        &self,
        mut current: Entry,
        changes: &EntryFields,
    ) -> Result<Entry, AppError> {
        changes.merge_into(&mut current);
        self.store.save_entry(&current).await
    }

    async fn cache_entry(&self, entry: &Entry) -> Result<(), AppError> {
        let key = CacheKey::new(&entry.owner_id, entry.date);
        self.cache
            .set(&key, entry, self.settings.cache_ttl)
            .await?;
        tracing::debug!(key = %key, "Entry cache set");
        Ok(())
    }
}

fn conflict(date: NaiveDate) -> AppError {
    AppError::Conflict(format!("An entry already exists for date {}", date))
}

fn not_found(date: NaiveDate) -> AppError {
    AppError::NotFound(format!("Entry for date {} not found", date))
}
