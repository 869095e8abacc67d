// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod audit;
pub mod entry;
pub mod user;

pub use audit::{AuditAction, AuditDetails, AuditEvent, AuditLogEntry, Audited};
pub use entry::{Entry, EntryFields, EntryPage, FieldPresence, RemoveAck, Upserted};
pub use user::{ExternalProfile, PublicUser, User};
