// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User identity resolution and session issuance.

use crate::db::UserStore;
use crate::error::AppError;
use crate::middleware::auth::create_jwt;
use crate::models::{ExternalProfile, PublicUser, User};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Signed session token plus the user it was issued to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/lib/generated/")
)]
pub struct Session {
    pub access_token: String,
    pub user: PublicUser,
}

#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserStore>,
    jwt_signing_key: Vec<u8>,
    session_ttl: Duration,
}

impl IdentityService {
    pub fn new(users: Arc<dyn UserStore>, jwt_signing_key: Vec<u8>, session_ttl: Duration) -> Self {
        Self {
            users,
            jwt_signing_key,
            session_ttl,
        }
    }

    /// Resolve a provider profile to a local user, creating it on first login.
    ///
    /// Returning users get their email, name and avatar refreshed.
    pub async fn find_or_create(&self, profile: &ExternalProfile) -> Result<User, AppError> {
        match self
            .users
            .find_user_by_external_id(&profile.external_id)
            .await?
        {
            Some(mut user) => {
                user.email = profile.email.clone();
                user.name = profile.name.clone();
                user.avatar_url = profile.avatar_url.clone();
                user.updated_at = Utc::now();
                self.users.save_user(&user).await?;

                tracing::info!(user_id = %user.id, "Returning user profile refreshed");
                Ok(user)
            }
            None => {
                let user = self.users.insert_user(profile).await?;
                tracing::info!(user_id = %user.id, "New user created");
                Ok(user)
            }
        }
    }

    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.users.get_user(user_id).await
    }

    /// Sign a session token for `user`.
    pub fn issue_session(&self, user: &User) -> Result<Session, AppError> {
        let access_token = create_jwt(user, &self.jwt_signing_key, self.session_ttl)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

        Ok(Session {
            access_token,
            user: PublicUser::from(user),
        })
    }
}
