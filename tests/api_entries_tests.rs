// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Entry API tests through the full router.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use rose_bud_thorn::models::AuditAction;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{create_test_app, seed_user, TestApp};

async fn send(app: &TestApp, method: &str, uri: &str, token: &str, body: Option<Value>) -> Response {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header("x-forwarded-for", "198.51.100.20")
        .header(header::USER_AGENT, "entries-test");

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.router.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_create_returns_201_then_409() {
    let app = create_test_app();
    let (_, token) = seed_user(&app.state, "g-1").await;

    let body = json!({ "date": "2025-07-18", "rose": "sunny walk" });
    let response = send(&app, "POST", "/api/entries", &token, Some(body.clone())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let entry = json_body(response).await;
    assert_eq!(entry["date"], "2025-07-18");
    assert_eq!(entry["rose"], "sunny walk");
    assert!(entry["thorn"].is_null());

    let response = send(&app, "POST", "/api/entries", &token, Some(body)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error = json_body(response).await;
    assert_eq!(error["error"], "conflict");
    assert_eq!(error["details"], "An entry already exists for date 2025-07-18");
}

#[tokio::test]
async fn test_create_validation_errors() {
    let app = create_test_app();
    let (_, token) = seed_user(&app.state, "g-1").await;

    let cases = [
        json!({ "date": "2025-07-18", "rose": "   " }),
        json!({ "date": "2025-07-18" }),
        json!({ "date": "18-07-2025", "rose": "x" }),
        json!({ "date": "2025-07-18", "rose": "x", "mood": "great" }),
        json!({ "date": "2025-07-18", "rose": 7 }),
    ];

    for body in cases {
        let response = send(&app, "POST", "/api/entries", &token, Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(json_body(response).await["error"], "bad_request");
    }

    assert_eq!(app.db.entry_count(), 0);
    assert!(app.db.audit_logs().is_empty());
}

#[tokio::test]
async fn test_empty_entry_message() {
    let app = create_test_app();
    let (_, token) = seed_user(&app.state, "g-1").await;

    let response = send(
        &app,
        "POST",
        "/api/entries/upsert",
        &token,
        Some(json!({ "rose": "", "thorn": " " })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["details"],
        "At least one field (rose, thorn, or bud) must have a value"
    );
}

#[tokio::test]
async fn test_upsert_status_reflects_creation() {
    let app = create_test_app();
    let (_, token) = seed_user(&app.state, "g-1").await;

    let response = send(
        &app,
        "POST",
        "/api/entries/upsert",
        &token,
        Some(json!({ "date": "2025-07-19", "rose": "A" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        &app,
        "POST",
        "/api/entries/upsert",
        &token,
        Some(json!({ "date": "2025-07-19", "bud": "C" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let entry = json_body(response).await;
    assert_eq!(entry["rose"], "A");
    assert_eq!(entry["bud"], "C");
}

#[tokio::test]
async fn test_get_patch_delete_lifecycle() {
    let app = create_test_app();
    let (user, token) = seed_user(&app.state, "g-1").await;

    send(
        &app,
        "POST",
        "/api/entries",
        &token,
        Some(json!({ "date": "2025-07-20", "rose": "a", "thorn": "b", "bud": "c" })),
    )
    .await;

    let response = send(&app, "GET", "/api/entries/2025-07-20", &token, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["ownerId"], user.id);

    let response = send(
        &app,
        "PATCH",
        "/api/entries/2025-07-20",
        &token,
        Some(json!({ "rose": "x" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let entry = json_body(response).await;
    assert_eq!(entry["rose"], "x");
    assert_eq!(entry["thorn"], "b");
    assert_eq!(entry["bud"], "c");

    let response = send(&app, "DELETE", "/api/entries/2025-07-20", &token, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "success": true }));

    let response = send(&app, "GET", "/api/entries/2025-07-20", &token, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(response).await["details"],
        "Entry for date 2025-07-20 not found"
    );

    let actions: Vec<AuditAction> = app.db.audit_logs().iter().map(|l| l.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::CreateEntry,
            AuditAction::ViewEntry,
            AuditAction::UpdateEntry,
            AuditAction::DeleteEntry,
        ]
    );
}

#[tokio::test]
async fn test_audit_rows_carry_actor_resource_and_client() {
    let app = create_test_app();
    let (user, token) = seed_user(&app.state, "g-1").await;

    send(
        &app,
        "POST",
        "/api/entries",
        &token,
        Some(json!({ "date": "2025-07-21", "thorn": "rain" })),
    )
    .await;

    let logs = app.db.audit_logs();
    assert_eq!(logs.len(), 1);
    let log = &logs[0];
    assert_eq!(log.action, AuditAction::CreateEntry);
    assert_eq!(log.actor_user_id.as_deref(), Some(user.id.as_str()));
    assert_eq!(log.resource_id.as_deref(), Some("2025-07-21"));
    assert_eq!(log.source_ip, "198.51.100.20");
    assert_eq!(log.user_agent.as_deref(), Some("entries-test"));

    let details = serde_json::to_value(&log.details).unwrap();
    assert_eq!(details["entryDate"], "2025-07-21");
    assert_eq!(
        details["fields"],
        json!({ "rose": false, "thorn": true, "bud": false })
    );
}

#[tokio::test]
async fn test_patch_rules() {
    let app = create_test_app();
    let (_, token) = seed_user(&app.state, "g-1").await;

    let response = send(
        &app,
        "PATCH",
        "/api/entries/2025-07-22",
        &token,
        Some(json!({ "rose": "x" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    send(
        &app,
        "POST",
        "/api/entries",
        &token,
        Some(json!({ "date": "2025-07-22", "rose": "a" })),
    )
    .await;

    let response = send(
        &app,
        "PATCH",
        "/api/entries/2025-07-22",
        &token,
        Some(json!({ "rose": "" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "PATCH",
        "/api/entries/not-a-date",
        &token,
        Some(json!({ "rose": "x" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_pagination_and_total_header() {
    let app = create_test_app();
    let (_, token) = seed_user(&app.state, "g-1").await;

    for day in 1..=15 {
        let response = send(
            &app,
            "POST",
            "/api/entries",
            &token,
            Some(json!({ "date": format!("2025-05-{:02}", day), "bud": "hope" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = send(&app, "GET", "/api/entries", &token, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-total-count").unwrap(), "15");
    let page = json_body(response).await;
    assert_eq!(page["total"], 15);
    assert_eq!(page["entries"].as_array().unwrap().len(), 10);
    assert_eq!(page["entries"][0]["date"], "2025-05-15");

    let response = send(&app, "GET", "/api/entries?limit=10&offset=10", &token, None).await;
    let page = json_body(response).await;
    assert_eq!(page["entries"].as_array().unwrap().len(), 5);
    assert_eq!(page["entries"][4]["date"], "2025-05-01");

    let last = app.db.audit_logs().pop().unwrap();
    assert_eq!(last.action, AuditAction::ViewEntries);
    assert_eq!(
        serde_json::to_value(&last.details).unwrap()["totalReturned"],
        5
    );
}

#[tokio::test]
async fn test_list_rejects_bad_pagination() {
    let app = create_test_app();
    let (_, token) = seed_user(&app.state, "g-1").await;

    for query in ["limit=0", "limit=101", "limit=abc", "offset=-1"] {
        let response = send(&app, "GET", &format!("/api/entries?{}", query), &token, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "query: {query}");
    }
}

#[tokio::test]
async fn test_entries_are_private_to_their_owner() {
    let app = create_test_app();
    let (_, alice) = seed_user(&app.state, "alice").await;
    let (_, bob) = seed_user(&app.state, "bob").await;

    send(
        &app,
        "POST",
        "/api/entries",
        &alice,
        Some(json!({ "date": "2025-07-23", "rose": "mine" })),
    )
    .await;

    let response = send(&app, "GET", "/api/entries/2025-07-23", &bob, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Bob may create his own entry for the same date
    let response = send(
        &app,
        "POST",
        "/api/entries",
        &bob,
        Some(json!({ "date": "2025-07-23", "rose": "also mine" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_field_length_limit() {
    let app = create_test_app();
    let (_, token) = seed_user(&app.state, "g-1").await;

    let too_long = "x".repeat(10_001);
    let response = send(
        &app,
        "POST",
        "/api/entries",
        &token,
        Some(json!({ "date": "2025-07-24", "rose": too_long })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "bad_request");
    assert_eq!(app.db.entry_count(), 0);

    let at_limit = "x".repeat(10_000);
    let response = send(
        &app,
        "POST",
        "/api/entries",
        &token,
        Some(json!({ "date": "2025-07-24", "rose": at_limit })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        json_body(response).await["rose"].as_str().map(str::len),
        Some(10_000)
    );

    let response = send(
        &app,
        "PATCH",
        "/api/entries/2025-07-24",
        &token,
        Some(json!({ "bud": "y".repeat(10_001) })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "bad_request");
}
