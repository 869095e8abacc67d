// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rose-Bud-Thorn: a daily reflection journal.
//!
//! This crate provides the backend API: Google sign-in, one journal entry
//! per user per calendar date with a read-through cache, and an append-only
//! audit trail of every login and entry operation.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use cache::{EntryCache, MemoryCache};
use config::Config;
use db::{AuditStore, EntryStore, MemoryDb, UserStore};
use error::AppError;
use services::{AuditService, EntryService, EntrySettings, GoogleOAuthClient, IdentityService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub entries: EntryService,
    pub identity: IdentityService,
    pub audit: AuditService,
    pub google: GoogleOAuthClient,
}

impl AppState {
    /// Build state on a single backend implementing every store.
    pub fn new<D>(config: Config, db: Arc<D>, cache: Arc<dyn EntryCache>) -> Result<Self, AppError>
    where
        D: EntryStore + UserStore + AuditStore + 'static,
    {
        Self::with_stores(config, db.clone(), db.clone(), db, cache)
    }

    /// Build state from individually supplied stores.
    pub fn with_stores(
        config: Config,
        entry_store: Arc<dyn EntryStore>,
        user_store: Arc<dyn UserStore>,
        audit_store: Arc<dyn AuditStore>,
        cache: Arc<dyn EntryCache>,
    ) -> Result<Self, AppError> {
        let entries = EntryService::new(
            entry_store,
            cache,
            EntrySettings {
                cache_ttl: config.cache_ttl,
                default_page_size: config.default_page_size,
            },
        );
        let identity = IdentityService::new(
            user_store,
            config.jwt_signing_key.clone(),
            config.session_ttl,
        );
        let audit = AuditService::new(audit_store, config.audit_policy);
        let google = GoogleOAuthClient::new(
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            config.google_callback_url.clone(),
        )?;

        Ok(Self {
            config,
            entries,
            identity,
            audit,
            google,
        })
    }

    /// State backed entirely by process memory.
    pub fn in_memory(config: Config) -> Result<Self, AppError> {
        let cache = Arc::new(MemoryCache::new(config.cache_max_entries));
        Self::new(config, Arc::new(MemoryDb::new()), cache)
    }
}
