// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store for local development and tests.
//!
//! Mirrors the Firestore backend's semantics, including the create-only
//! insert that rejects a second entry for the same owner and date.

use crate::db::{new_record_id, AuditStore, EntryStore, UserStore};
use crate::error::AppError;
use crate::models::{AuditLogEntry, Entry, EntryFields, ExternalProfile, User};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use std::sync::Mutex;

type EntryKey = (String, NaiveDate);

/// DashMap-backed store implementing every storage trait.
#[derive(Default)]
pub struct MemoryDb {
    entries: DashMap<EntryKey, Entry>,
    users: DashMap<String, User>,
    audit_logs: Mutex<Vec<AuditLogEntry>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded audit trail, oldest first.
    pub fn audit_logs(&self) -> Vec<AuditLogEntry> {
        self.audit_logs
            .lock()
            .map(|logs| logs.clone())
            .unwrap_or_default()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl EntryStore for MemoryDb {
    async fn find_entry(
        &self,
        owner_id: &str,
        date: NaiveDate,
    ) -> Result<Option<Entry>, AppError> {
        Ok(self
            .entries
            .get(&(owner_id.to_string(), date))
            .map(|e| e.value().clone()))
    }

    async fn insert_entry(
        &self,
        owner_id: &str,
        date: NaiveDate,
        fields: &EntryFields,
    ) -> Result<Entry, AppError> {
        match self.entries.entry((owner_id.to_string(), date)) {
            MapEntry::Occupied(_) => Err(AppError::Conflict(format!(
                "An entry already exists for date {}",
                date
            ))),
            MapEntry::Vacant(slot) => {
                let entry = Entry::new(new_record_id(), owner_id, date, fields);
                slot.insert(entry.clone());
                Ok(entry)
            }
        }
    }

    async fn save_entry(&self, entry: &Entry) -> Result<Entry, AppError> {
        let mut entry = entry.clone();
        entry.updated_at = Utc::now();
        self.entries
            .insert((entry.owner_id.clone(), entry.date), entry.clone());
        Ok(entry)
    }

    async fn delete_entry(&self, owner_id: &str, date: NaiveDate) -> Result<(), AppError> {
        self.entries.remove(&(owner_id.to_string(), date));
        Ok(())
    }

    async fn list_entries(
        &self,
        owner_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<Entry>, u64), AppError> {
        let mut owned: Vec<Entry> = self
            .entries
            .iter()
            .filter(|e| e.key().0 == owner_id)
            .map(|e| e.value().clone())
            .collect();
        owned.sort_by(|a, b| b.date.cmp(&a.date));

        let total = owned.len() as u64;
        let page = owned
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok((page, total))
    }
}

#[async_trait]
impl UserStore for MemoryDb {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(user_id).map(|u| u.value().clone()))
    }

    async fn find_user_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.external_id == external_id)
            .map(|u| u.value().clone()))
    }

    async fn insert_user(&self, profile: &ExternalProfile) -> Result<User, AppError> {
        let now = Utc::now();
        let user = User {
            id: new_record_id(),
            external_id: profile.external_id.clone(),
            email: profile.email.clone(),
            name: profile.name.clone(),
            avatar_url: profile.avatar_url.clone(),
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn save_user(&self, user: &User) -> Result<(), AppError> {
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }
}

#[async_trait]
impl AuditStore for MemoryDb {
    async fn append_audit_log(&self, entry: &AuditLogEntry) -> Result<(), AppError> {
        self.audit_logs
            .lock()
            .map_err(|_| AppError::Database("Audit log lock poisoned".to_string()))?
            .push(entry.clone());
        Ok(())
    }
}
