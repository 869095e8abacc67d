// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Audit trail persistence.

use crate::config::AuditPolicy;
use crate::db::{new_record_id, AuditStore};
use crate::error::AppError;
use crate::middleware::ClientInfo;
use crate::models::{AuditEvent, AuditLogEntry, Audited};
use chrono::Utc;
use std::sync::Arc;

/// Writes audit events to the append-only audit store.
#[derive(Clone)]
pub struct AuditService {
    store: Arc<dyn AuditStore>,
    policy: AuditPolicy,
}

impl AuditService {
    pub fn new(store: Arc<dyn AuditStore>, policy: AuditPolicy) -> Self {
        Self { store, policy }
    }

    /// Persist one event. Always propagates store failures.
    pub async fn record(
        &self,
        event: AuditEvent,
        client: &ClientInfo,
    ) -> Result<AuditLogEntry, AppError> {
        let log = AuditLogEntry {
            id: new_record_id(),
            actor_user_id: event.actor_user_id,
            action: event.details.action(),
            timestamp: Utc::now(),
            source_ip: client.ip.clone(),
            user_agent: client.user_agent.clone(),
            resource_id: event.details.resource_id(),
            details: event.details,
        };

        self.store.append_audit_log(&log).await?;

        tracing::debug!(
            action = %log.action,
            actor = log.actor_user_id.as_deref().unwrap_or("-"),
            resource = log.resource_id.as_deref().unwrap_or("-"),
            "Audit event recorded"
        );

        Ok(log)
    }

    /// Persist an event under the configured policy.
    pub async fn emit(&self, event: AuditEvent, client: &ClientInfo) -> Result<(), AppError> {
        let action = event.action();
        match self.record(event, client).await {
            Ok(_) => Ok(()),
            Err(e) if self.policy == AuditPolicy::BestEffort => {
                tracing::warn!(action = %action, error = %e, "Failed to record audit event");
                Ok(())
            }
            Err(e) => {
                tracing::error!(action = %action, error = %e, "Failed to record audit event");
                Err(e)
            }
        }
    }

    /// Persist the event attached to a service result and hand back the value.
    pub async fn commit<T>(&self, audited: Audited<T>, client: &ClientInfo) -> Result<T, AppError> {
        self.emit(audited.event, client).await?;
        Ok(audited.value)
    }
}
