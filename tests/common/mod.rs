// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::NaiveDate;
use rose_bud_thorn::cache::{EntryCache, MemoryCache};
use rose_bud_thorn::config::Config;
use rose_bud_thorn::db::{AuditStore, EntryStore, FirestoreDb, MemoryDb};
use rose_bud_thorn::error::AppError;
use rose_bud_thorn::models::{AuditLogEntry, Entry, EntryFields, ExternalProfile, User};
use rose_bud_thorn::routes::create_router;
use rose_bud_thorn::AppState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

#[allow(dead_code)]
pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

#[allow(dead_code)]
pub fn fields(rose: Option<&str>, thorn: Option<&str>, bud: Option<&str>) -> EntryFields {
    EntryFields {
        rose: rose.map(str::to_string),
        thorn: thorn.map(str::to_string),
        bud: bud.map(str::to_string),
    }
}

/// Entry store wrapper that counts calls to the inner store.
pub struct CountingStore {
    inner: Arc<MemoryDb>,
    pub finds: AtomicUsize,
    pub inserts: AtomicUsize,
    pub saves: AtomicUsize,
    pub deletes: AtomicUsize,
    pub lists: AtomicUsize,
    /// Number of upcoming `find_entry` calls that report "absent" regardless
    /// of contents, to simulate a concurrent create slipping in.
    hidden_finds: AtomicUsize,
}

#[allow(dead_code)]
impl CountingStore {
    pub fn new(inner: Arc<MemoryDb>) -> Self {
        Self {
            inner,
            finds: AtomicUsize::new(0),
            inserts: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            lists: AtomicUsize::new(0),
            hidden_finds: AtomicUsize::new(0),
        }
    }

    /// Total number of store calls of any kind.
    pub fn calls(&self) -> usize {
        [
            &self.finds,
            &self.inserts,
            &self.saves,
            &self.deletes,
            &self.lists,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }

    pub fn reset(&self) {
        for counter in [
            &self.finds,
            &self.inserts,
            &self.saves,
            &self.deletes,
            &self.lists,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
    }

    pub fn hide_next_finds(&self, count: usize) {
        self.hidden_finds.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl EntryStore for CountingStore {
    async fn find_entry(&self, owner_id: &str, date: NaiveDate) -> Result<Option<Entry>, AppError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        let hidden = self
            .hidden_finds
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if hidden {
            return Ok(None);
        }
        self.inner.find_entry(owner_id, date).await
    }

    async fn insert_entry(
        &self,
        owner_id: &str,
        date: NaiveDate,
        fields: &EntryFields,
    ) -> Result<Entry, AppError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_entry(owner_id, date, fields).await
    }

    async fn save_entry(&self, entry: &Entry) -> Result<Entry, AppError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save_entry(entry).await
    }

    async fn delete_entry(&self, owner_id: &str, date: NaiveDate) -> Result<(), AppError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_entry(owner_id, date).await
    }

    async fn list_entries(
        &self,
        owner_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<Entry>, u64), AppError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list_entries(owner_id, limit, offset).await
    }
}

/// Audit store whose writes always fail.
pub struct FailingAuditStore;

#[async_trait]
impl AuditStore for FailingAuditStore {
    async fn append_audit_log(&self, _entry: &AuditLogEntry) -> Result<(), AppError> {
        Err(AppError::Database("audit store offline".to_string()))
    }
}

/// Test application with handles on its in-memory backends.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub db: Arc<MemoryDb>,
    pub store: Arc<CountingStore>,
    pub cache: Arc<MemoryCache>,
}

/// Create a test app on in-memory backends with the default test config.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with(Config::default(), None)
}

/// Create a test app, optionally replacing the audit store.
#[allow(dead_code)]
pub fn create_test_app_with(config: Config, audit_store: Option<Arc<dyn AuditStore>>) -> TestApp {
    let db = Arc::new(MemoryDb::new());
    let store = Arc::new(CountingStore::new(db.clone()));
    let cache = Arc::new(MemoryCache::new(config.cache_max_entries));
    let audit_store = audit_store.unwrap_or_else(|| db.clone() as Arc<dyn AuditStore>);

    let state = Arc::new(
        AppState::with_stores(
            config,
            store.clone(),
            db.clone(),
            audit_store,
            cache.clone() as Arc<dyn EntryCache>,
        )
        .expect("Failed to build test state"),
    );

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
        store,
        cache,
    }
}

/// Create a user through the identity service and sign a session for them.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, external_id: &str) -> (User, String) {
    let user = state
        .identity
        .find_or_create(&ExternalProfile {
            external_id: external_id.to_string(),
            email: format!("{}@example.com", external_id),
            name: format!("User {}", external_id),
            avatar_url: None,
        })
        .await
        .unwrap();
    let session = state.identity.issue_session(&user).unwrap();
    (user, session.access_token)
}
