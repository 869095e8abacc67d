// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Services talk to storage through the traits below so the backend
//! (Firestore in production, in-memory for development and tests) is chosen
//! at startup.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{AuditLogEntry, Entry, EntryFields, ExternalProfile, User};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const ENTRIES: &str = "entries";
    pub const AUDIT_LOGS: &str = "audit_logs";
}

/// Durable per-user, per-date journal entries.
///
/// Implementations enforce at most one entry per `(owner_id, date)`.
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn find_entry(&self, owner_id: &str, date: NaiveDate)
        -> Result<Option<Entry>, AppError>;

    /// Insert a new entry, assigning its ID and timestamps.
    ///
    /// Returns [`AppError::Conflict`] if an entry already exists for the pair.
    async fn insert_entry(
        &self,
        owner_id: &str,
        date: NaiveDate,
        fields: &EntryFields,
    ) -> Result<Entry, AppError>;

    /// Persist changes to an existing entry, refreshing `updated_at`.
    async fn save_entry(&self, entry: &Entry) -> Result<Entry, AppError>;

    async fn delete_entry(&self, owner_id: &str, date: NaiveDate) -> Result<(), AppError>;

    /// Entries for an owner, newest date first, plus the unpaginated total.
    async fn list_entries(
        &self,
        owner_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<Entry>, u64), AppError>;
}

/// Durable user records keyed by external identity.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_external_id(&self, external_id: &str)
        -> Result<Option<User>, AppError>;

    /// Create a user for a first-time login, assigning its ID.
    async fn insert_user(&self, profile: &ExternalProfile) -> Result<User, AppError>;

    async fn save_user(&self, user: &User) -> Result<(), AppError>;
}

/// Append-only audit trail.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append_audit_log(&self, entry: &AuditLogEntry) -> Result<(), AppError>;
}

/// Document ID for an entry; the pair is unique so the ID is too.
pub fn entry_document_id(owner_id: &str, date: NaiveDate) -> String {
    format!("{}_{}", owner_id, date)
}

/// Fresh time-ordered identifier for stored records.
pub fn new_record_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
