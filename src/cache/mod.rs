// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-through cache in front of the entry store.
//!
//! The cache is never the system of record: values are written only after a
//! successful store write and may be stale for at most their TTL.

pub mod memory;

pub use memory::MemoryCache;

use crate::error::AppError;
use crate::models::Entry;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt;
use std::time::Duration;

/// Cache key for one owner's entry on one date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub owner_id: String,
    pub date: NaiveDate,
}

impl CacheKey {
    pub fn new(owner_id: &str, date: NaiveDate) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            date,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry:{}:{}", self.owner_id, self.date)
    }
}

/// Key/value cache for entry snapshots.
#[async_trait]
pub trait EntryCache: Send + Sync {
    /// Return the cached entry if present and not expired.
    async fn get(&self, key: &CacheKey) -> Result<Option<Entry>, AppError>;

    /// Store an entry snapshot for `ttl`, replacing any previous value.
    async fn set(&self, key: &CacheKey, entry: &Entry, ttl: Duration) -> Result<(), AppError>;

    async fn delete(&self, key: &CacheKey) -> Result<(), AppError>;
}
