// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage, looked up by Google subject)
//! - Entries (one document per owner and date)
//! - Audit logs (append-only)

use crate::db::{
    collections, entry_document_id, new_record_id, AuditStore, EntryStore, UserStore,
};
use crate::error::AppError;
use crate::models::{AuditLogEntry, Entry, EntryFields, ExternalProfile, User};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use firestore::errors::FirestoreError;
use serde::Deserialize;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }
}

// ─── Entry Operations ────────────────────────────────────────

#[async_trait]
impl EntryStore for FirestoreDb {
    async fn find_entry(
        &self,
        owner_id: &str,
        date: NaiveDate,
    ) -> Result<Option<Entry>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::ENTRIES)
            .obj()
            .one(&entry_document_id(owner_id, date))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert with create-only semantics: Firestore rejects the write if the
    /// `{owner}_{date}` document already exists, which is the uniqueness
    /// guarantee for concurrent creates.
    async fn insert_entry(
        &self,
        owner_id: &str,
        date: NaiveDate,
        fields: &EntryFields,
    ) -> Result<Entry, AppError> {
        let entry = Entry::new(new_record_id(), owner_id, date, fields);

        let result: Result<Entry, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::ENTRIES)
            .document_id(entry_document_id(owner_id, date))
            .object(&entry)
            .execute()
            .await;

        match result {
            Ok(stored) => Ok(stored),
            Err(FirestoreError::DataConflictError(_)) => Err(AppError::Conflict(format!(
                "An entry already exists for date {}",
                date
            ))),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn save_entry(&self, entry: &Entry) -> Result<Entry, AppError> {
        let mut entry = entry.clone();
        entry.updated_at = Utc::now();

        let saved: Entry = self
            .client
            .fluent()
            .update()
            .in_col(collections::ENTRIES)
            .document_id(entry_document_id(&entry.owner_id, entry.date))
            .object(&entry)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(saved)
    }

    async fn delete_entry(&self, owner_id: &str, date: NaiveDate) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collections::ENTRIES)
            .document_id(entry_document_id(owner_id, date))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn list_entries(
        &self,
        owner_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<Entry>, u64), AppError> {
        let owner = owner_id.to_string();
        let page: Vec<Entry> = self
            .client
            .fluent()
            .select()
            .from(collections::ENTRIES)
            .filter(move |q| q.field("ownerId").eq(owner.clone()))
            .order_by([("date", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .offset(offset)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let owner = owner_id.to_string();
        let counts: Vec<EntryCount> = self
            .client
            .fluent()
            .select()
            .from(collections::ENTRIES)
            .filter(move |q| q.field("ownerId").eq(owner.clone()))
            .aggregate(|a| a.fields([a.field("count").count()]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let total = counts.first().map_or(0, |c| c.count);

        Ok((page, total))
    }
}

/// Result row of the per-owner count aggregation.
#[derive(Debug, Deserialize)]
struct EntryCount {
    count: u64,
}

// ─── User Operations ─────────────────────────────────────────

#[async_trait]
impl UserStore for FirestoreDb {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_user_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<User>, AppError> {
        let external_id = external_id.to_string();
        let users: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("externalId").eq(external_id.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
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

        let stored: User = self
            .client
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(stored)
    }

    async fn save_user(&self, user: &User) -> Result<(), AppError> {
        let _: User = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

// ─── Audit Operations ────────────────────────────────────────

#[async_trait]
impl AuditStore for FirestoreDb {
    async fn append_audit_log(&self, entry: &AuditLogEntry) -> Result<(), AppError> {
        let _: AuditLogEntry = self
            .client
            .fluent()
            .insert()
            .into(collections::AUDIT_LOGS)
            .document_id(&entry.id)
            .object(entry)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
