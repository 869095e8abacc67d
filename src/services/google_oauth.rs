// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth 2.0 / OpenID Connect client.
//!
//! Handles:
//! - Building the authorization redirect
//! - Exchanging the authorization code for an access token
//! - Fetching the signed-in user's OpenID profile

use crate::error::AppError;
use crate::models::ExternalProfile;
use serde::Deserialize;
use std::time::Duration;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const SCOPES: &str = "openid email profile";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

/// Token endpoint response; only the access token is used.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// OpenID Connect userinfo response.
#[derive(Debug, Deserialize)]
pub struct GoogleUserInfo {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl GoogleUserInfo {
    /// Convert to a login profile; Google accounts without an email are rejected.
    pub fn into_profile(self) -> Result<ExternalProfile, AppError> {
        let email = self
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::OAuth("Google profile has no email address".to_string()))?;

        let name = match self.name.filter(|n| !n.trim().is_empty()) {
            Some(name) => name,
            None => {
                let joined = [self.given_name, self.family_name]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                if joined.trim().is_empty() {
                    email.clone()
                } else {
                    joined
                }
            }
        };

        Ok(ExternalProfile {
            external_id: self.sub,
            email,
            name,
            avatar_url: self.picture,
        })
    }
}

impl GoogleOAuthClient {
    pub fn new(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            client_id,
            client_secret,
            redirect_uri,
        })
    }

    /// URL of Google's consent screen carrying our signed `state`.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            AUTHORIZE_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::OAuth(format!("Token exchange request failed: {}", e)))?;

        check_response_json(response).await
    }

    /// Fetch the OpenID profile for an access token.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<ExternalProfile, AppError> {
        let response = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::OAuth(format!("Userinfo request failed: {}", e)))?;

        let info: GoogleUserInfo = check_response_json(response).await?;
        info.into_profile()
    }

    /// Full callback exchange: code to profile.
    pub async fn authenticate(&self, code: &str) -> Result<ExternalProfile, AppError> {
        let tokens = self.exchange_code(code).await?;
        self.fetch_profile(&tokens.access_token).await
    }
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, "Google OAuth request rejected");
        return Err(AppError::OAuth(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::OAuth(format!("JSON parse error: {}", e)))
}
