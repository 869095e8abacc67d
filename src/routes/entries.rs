// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journal entry routes for authenticated users.

use crate::error::Result;
use crate::middleware::{AuthUser, ClientInfo};
use crate::models::{Entry, EntryFields, EntryPage, RemoveAck};
use crate::routes::extract::{ValidatedJson, ValidatedQuery};
use crate::services::MAX_PAGE_SIZE;
use crate::time_utils::{parse_calendar_date, today_local};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderName, HeaderValue, StatusCode},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::borrow::Cow;
use std::sync::Arc;
use validator::{Validate, ValidationError};

/// Response header carrying the unpaginated entry count.
pub const TOTAL_COUNT_HEADER: HeaderName = HeaderName::from_static("x-total-count");

/// Upper bound on the length of each free-text field.
pub const MAX_FIELD_CHARS: u64 = 10_000;

const EMPTY_ENTRY_MESSAGE: &str = "At least one field (rose, thorn, or bud) must have a value";

/// Entry routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/entries", post(create_entry).get(list_entries))
        .route("/api/entries/upsert", post(upsert_entry))
        .route(
            "/api/entries/{date}",
            get(get_entry).patch(update_entry).delete(delete_entry),
        )
}

// ─── Request Bodies ──────────────────────────────────────────

/// Body for create and upsert. `date` defaults to today.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_entry_request"))]
pub struct EntryRequest {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    #[validate(length(max = MAX_FIELD_CHARS))]
    pub rose: Option<String>,
    #[serde(default)]
    #[validate(length(max = MAX_FIELD_CHARS))]
    pub thorn: Option<String>,
    #[serde(default)]
    #[validate(length(max = MAX_FIELD_CHARS))]
    pub bud: Option<String>,
}

impl EntryRequest {
    fn fields(&self) -> EntryFields {
        EntryFields {
            rose: self.rose.clone(),
            thorn: self.thorn.clone(),
            bud: self.bud.clone(),
        }
    }

    fn date(&self) -> Result<chrono::NaiveDate> {
        match self.date.as_deref() {
            Some(raw) => parse_calendar_date(raw),
            None => Ok(today_local()),
        }
    }
}

/// Body for PATCH; absent fields are left untouched.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_update_request"))]
pub struct UpdateEntryRequest {
    #[serde(default)]
    #[validate(length(max = MAX_FIELD_CHARS))]
    pub rose: Option<String>,
    #[serde(default)]
    #[validate(length(max = MAX_FIELD_CHARS))]
    pub thorn: Option<String>,
    #[serde(default)]
    #[validate(length(max = MAX_FIELD_CHARS))]
    pub bud: Option<String>,
}

impl UpdateEntryRequest {
    fn fields(&self) -> EntryFields {
        EntryFields {
            rose: self.rose.clone(),
            thorn: self.thorn.clone(),
            bud: self.bud.clone(),
        }
    }
}

fn empty_entry_error() -> ValidationError {
    ValidationError::new("at_least_one_field").with_message(Cow::Borrowed(EMPTY_ENTRY_MESSAGE))
}

fn validate_entry_request(req: &EntryRequest) -> std::result::Result<(), ValidationError> {
    if req.fields().has_content() {
        Ok(())
    } else {
        Err(empty_entry_error())
    }
}

fn validate_update_request(req: &UpdateEntryRequest) -> std::result::Result<(), ValidationError> {
    if req.fields().has_content() {
        Ok(())
    } else {
        Err(empty_entry_error())
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListParams {
    #[validate(range(min = 1, max = MAX_PAGE_SIZE))]
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

// ─── Handlers ────────────────────────────────────────────────

async fn create_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    client: ClientInfo,
    ValidatedJson(body): ValidatedJson<EntryRequest>,
) -> Result<(StatusCode, Json<Entry>)> {
    let date = body.date()?;
    let audited = state
        .entries
        .create(&user.user_id, date, &body.fields())
        .await?;
    let entry = state.audit.commit(audited, &client).await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

async fn upsert_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    client: ClientInfo,
    ValidatedJson(body): ValidatedJson<EntryRequest>,
) -> Result<(StatusCode, Json<Entry>)> {
    let date = body.date()?;
    let audited = state
        .entries
        .create_or_update(&user.user_id, date, &body.fields())
        .await?;
    let upserted = state.audit.commit(audited, &client).await?;

    let status = if upserted.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(upserted.entry)))
}

async fn list_entries(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    client: ClientInfo,
    ValidatedQuery(params): ValidatedQuery<ListParams>,
) -> Result<([(HeaderName, HeaderValue); 1], Json<EntryPage>)> {
    let audited = state
        .entries
        .find_all(&user.user_id, params.limit, params.offset)
        .await?;
    let page = state.audit.commit(audited, &client).await?;

    Ok((
        [(TOTAL_COUNT_HEADER, HeaderValue::from(page.total))],
        Json(page),
    ))
}

async fn get_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    client: ClientInfo,
    Path(date): Path<String>,
) -> Result<Json<Entry>> {
    let date = parse_calendar_date(&date)?;
    let audited = state.entries.find_one(&user.user_id, date).await?;
    Ok(Json(state.audit.commit(audited, &client).await?))
}

async fn update_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    client: ClientInfo,
    Path(date): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateEntryRequest>,
) -> Result<Json<Entry>> {
    let date = parse_calendar_date(&date)?;
    let audited = state
        .entries
        .update(&user.user_id, date, &body.fields())
        .await?;
    Ok(Json(state.audit.commit(audited, &client).await?))
}

async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    client: ClientInfo,
    Path(date): Path<String>,
) -> Result<Json<RemoveAck>> {
    let date = parse_calendar_date(&date)?;
    let audited = state.entries.remove(&user.user_id, date).await?;
    Ok(Json(state.audit.commit(audited, &client).await?))
}
