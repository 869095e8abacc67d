// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Audit trail model.
//!
//! Every audited action is described by an [`AuditEvent`]: who did it and an
//! [`AuditDetails`] payload whose variant fixes both the action and the shape
//! of the recorded details. The HTTP boundary adds client information and
//! persists the result as an [`AuditLogEntry`].

use super::entry::{EntryFields, FieldPresence};
use super::user::User;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Audited action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Login,
    LoginFailed,
    Logout,
    CreateEntry,
    UpdateEntry,
    DeleteEntry,
    ViewEntry,
    ViewEntries,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "LOGIN",
            AuditAction::LoginFailed => "LOGIN_FAILED",
            AuditAction::Logout => "LOGOUT",
            AuditAction::CreateEntry => "CREATE_ENTRY",
            AuditAction::UpdateEntry => "UPDATE_ENTRY",
            AuditAction::DeleteEntry => "DELETE_ENTRY",
            AuditAction::ViewEntry => "VIEW_ENTRY",
            AuditAction::ViewEntries => "VIEW_ENTRIES",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action-specific details, one variant per action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditDetails {
    #[serde(rename_all = "camelCase")]
    Login { email: String, name: String },
    #[serde(rename_all = "camelCase")]
    LoginFailed {
        email: Option<String>,
        reason: String,
    },
    Logout,
    #[serde(rename_all = "camelCase")]
    CreateEntry {
        entry_date: NaiveDate,
        fields: FieldPresence,
    },
    /// `changes` is the delta as requested, not the merged result.
    #[serde(rename_all = "camelCase")]
    UpdateEntry {
        entry_date: NaiveDate,
        changes: EntryFields,
    },
    #[serde(rename_all = "camelCase")]
    DeleteEntry { entry_date: NaiveDate },
    #[serde(rename_all = "camelCase")]
    ViewEntry { entry_date: NaiveDate },
    #[serde(rename_all = "camelCase")]
    ViewEntries {
        limit: u32,
        offset: u32,
        total_returned: usize,
    },
}

impl AuditDetails {
    pub fn action(&self) -> AuditAction {
        match self {
            AuditDetails::Login { .. } => AuditAction::Login,
            AuditDetails::LoginFailed { .. } => AuditAction::LoginFailed,
            AuditDetails::Logout => AuditAction::Logout,
            AuditDetails::CreateEntry { .. } => AuditAction::CreateEntry,
            AuditDetails::UpdateEntry { .. } => AuditAction::UpdateEntry,
            AuditDetails::DeleteEntry { .. } => AuditAction::DeleteEntry,
            AuditDetails::ViewEntry { .. } => AuditAction::ViewEntry,
            AuditDetails::ViewEntries { .. } => AuditAction::ViewEntries,
        }
    }

    /// Entry actions are keyed by their date string.
    pub fn resource_id(&self) -> Option<String> {
        match self {
            AuditDetails::CreateEntry { entry_date, .. }
            | AuditDetails::UpdateEntry { entry_date, .. }
            | AuditDetails::DeleteEntry { entry_date }
            | AuditDetails::ViewEntry { entry_date } => Some(entry_date.to_string()),
            _ => None,
        }
    }
}

/// What happened, by whom. Client information is added when persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    /// Absent for failed logins against unknown identities
    pub actor_user_id: Option<String>,
    pub details: AuditDetails,
}

impl AuditEvent {
    pub fn login(user: &User) -> Self {
        Self {
            actor_user_id: Some(user.id.clone()),
            details: AuditDetails::Login {
                email: user.email.clone(),
                name: user.name.clone(),
            },
        }
    }

    pub fn login_failed(email: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            actor_user_id: None,
            details: AuditDetails::LoginFailed {
                email: email.map(str::to_string),
                reason: reason.into(),
            },
        }
    }

    pub fn logout(user_id: &str) -> Self {
        Self::by(user_id, AuditDetails::Logout)
    }

    pub fn create_entry(user_id: &str, entry_date: NaiveDate, fields: &EntryFields) -> Self {
        Self::by(
            user_id,
            AuditDetails::CreateEntry {
                entry_date,
                fields: fields.presence(),
            },
        )
    }

    pub fn update_entry(user_id: &str, entry_date: NaiveDate, changes: &EntryFields) -> Self {
        Self::by(
            user_id,
            AuditDetails::UpdateEntry {
                entry_date,
                changes: changes.clone(),
            },
        )
    }

    pub fn delete_entry(user_id: &str, entry_date: NaiveDate) -> Self {
        Self::by(user_id, AuditDetails::DeleteEntry { entry_date })
    }

    pub fn view_entry(user_id: &str, entry_date: NaiveDate) -> Self {
        Self::by(user_id, AuditDetails::ViewEntry { entry_date })
    }

    pub fn view_entries(user_id: &str, limit: u32, offset: u32, total_returned: usize) -> Self {
        Self::by(
            user_id,
            AuditDetails::ViewEntries {
                limit,
                offset,
                total_returned,
            },
        )
    }

    fn by(user_id: &str, details: AuditDetails) -> Self {
        Self {
            actor_user_id: Some(user_id.to_string()),
            details,
        }
    }

    pub fn action(&self) -> AuditAction {
        self.details.action()
    }
}

/// A result paired with the audit event describing how it was produced.
#[derive(Debug, Clone)]
pub struct Audited<T> {
    pub value: T,
    pub event: AuditEvent,
}

impl<T> Audited<T> {
    pub fn new(value: T, event: AuditEvent) -> Self {
        Self { value, event }
    }
}

/// Durable, append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: String,
    pub actor_user_id: Option<String>,
    pub action: AuditAction,
    pub timestamp: DateTime<Utc>,
    pub source_ip: String,
    pub user_agent: Option<String>,
    pub resource_id: Option<String>,
    pub details: AuditDetails,
}
