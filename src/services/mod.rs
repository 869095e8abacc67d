// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod audit;
pub mod entry;
pub mod google_oauth;
pub mod identity;

pub use audit::AuditService;
pub use entry::{EntryService, EntrySettings, MAX_PAGE_SIZE};
pub use google_oauth::GoogleOAuthClient;
pub use identity::{IdentityService, Session};
