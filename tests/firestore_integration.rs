// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running, with
//! FIRESTORE_EMULATOR_HOST pointing at it.

use chrono::Utc;
use rose_bud_thorn::db::{AuditStore, EntryStore, UserStore};
use rose_bud_thorn::error::AppError;
use rose_bud_thorn::models::{AuditEvent, AuditLogEntry, ExternalProfile};

mod common;
use common::{date, fields, test_db};

/// Generate a unique owner ID for test isolation.
fn unique_owner() -> String {
    format!("owner-{}", uuid::Uuid::now_v7())
}

#[tokio::test]
async fn test_entry_insert_is_unique_per_owner_and_date() {
    require_emulator!();
    let db = test_db().await;
    let owner = unique_owner();
    let day = date("2025-07-18");

    let entry = db
        .insert_entry(&owner, day, &fields(Some("A"), None, None))
        .await
        .unwrap();
    assert_eq!(entry.owner_id, owner);

    let err = db
        .insert_entry(&owner, day, &fields(Some("B"), None, None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let stored = db.find_entry(&owner, day).await.unwrap().unwrap();
    assert_eq!(stored.rose.as_deref(), Some("A"));
}

#[tokio::test]
async fn test_entry_save_list_delete() {
    require_emulator!();
    let db = test_db().await;
    let owner = unique_owner();

    for day in ["2025-07-01", "2025-07-03", "2025-07-02"] {
        db.insert_entry(&owner, date(day), &fields(None, Some("t"), None))
            .await
            .unwrap();
    }

    let mut entry = db.find_entry(&owner, date("2025-07-02")).await.unwrap().unwrap();
    entry.bud = Some("tomorrow".to_string());
    let saved = db.save_entry(&entry).await.unwrap();
    assert_eq!(saved.bud.as_deref(), Some("tomorrow"));
    assert!(saved.updated_at >= entry.updated_at);

    let (page, total) = db.list_entries(&owner, 2, 0).await.unwrap();
    assert_eq!(total, 3);
    let dates: Vec<_> = page.iter().map(|e| e.date).collect();
    assert_eq!(dates, vec![date("2025-07-03"), date("2025-07-02")]);

    let (page, total) = db.list_entries(&owner, 2, 2).await.unwrap();
    assert_eq!(total, 3);
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].date, date("2025-07-01"));

    let (page, total) = db.list_entries(&owner, 2, 10).await.unwrap();
    assert!(page.is_empty());
    assert_eq!(total, 3);

    db.delete_entry(&owner, date("2025-07-03")).await.unwrap();
    assert!(db
        .find_entry(&owner, date("2025-07-03"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_user_lookup_by_external_id() {
    require_emulator!();
    let db = test_db().await;
    let external_id = unique_owner();

    let user = db
        .insert_user(&ExternalProfile {
            external_id: external_id.clone(),
            email: "it@example.com".to_string(),
            name: "Integration".to_string(),
            avatar_url: None,
        })
        .await
        .unwrap();

    let found = db
        .find_user_by_external_id(&external_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, user.id);

    let by_id = db.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, "it@example.com");
}

#[tokio::test]
async fn test_audit_log_append() {
    require_emulator!();
    let db = test_db().await;
    let event = AuditEvent::view_entry("user-1", date("2025-07-18"));

    let log = AuditLogEntry {
        id: uuid::Uuid::now_v7().to_string(),
        actor_user_id: event.actor_user_id.clone(),
        action: event.action(),
        timestamp: Utc::now(),
        source_ip: "127.0.0.1".to_string(),
        user_agent: None,
        resource_id: event.details.resource_id(),
        details: event.details,
    };

    db.append_audit_log(&log).await.unwrap();
}
