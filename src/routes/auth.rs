// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth authentication routes.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::SESSION_COOKIE;
use crate::middleware::{AuthUser, ClientInfo};
use crate::models::{AuditEvent, User};
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long a signed OAuth state stays valid.
const STATE_MAX_AGE_MS: u128 = 15 * 60 * 1000;

/// Public OAuth routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/google", get(auth_start))
        .route("/auth/google/callback", get(auth_callback))
}

/// Session routes (require authentication via JWT).
pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/profile", get(profile))
        .route("/auth/logout", post(logout))
}

/// Query parameters for starting OAuth flow.
#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Frontend URL to redirect back to after OAuth completes.
    /// Only honored when its origin matches FRONTEND_URL.
    #[serde(default)]
    frontend_url: Option<String>,
}

/// Start OAuth flow - redirect to Google authorization.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthStartParams>,
) -> Result<Redirect> {
    let frontend_url =
        resolve_frontend_url(params.frontend_url.as_deref(), &state.config.frontend_url);

    let timestamp = now_millis()?;
    let oauth_state = sign_state(&frontend_url, timestamp, &state.config.oauth_state_key)?;
    let auth_url = state.google.authorize_url(&oauth_state);

    tracing::info!(
        client_id = %state.config.google_client_id,
        frontend_url = %frontend_url,
        "Starting OAuth flow, redirecting to Google"
    );

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for profile, create session.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    let default_frontend = state.config.frontend_url.clone();
    let now = now_millis()?;

    // Decode and verify frontend URL from state parameter
    let frontend_url = match params
        .state
        .as_deref()
        .and_then(|s| verify_and_decode_state(s, &state.config.oauth_state_key, now))
    {
        Some(url) => resolve_frontend_url(Some(&url), &default_frontend),
        None => {
            tracing::warn!("Invalid, expired or missing OAuth state parameter");
            let redirect = login_failed(&state, &client, &default_frontend, "invalid_state").await?;
            return Ok((jar, redirect));
        }
    };

    // Check for OAuth errors
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        let redirect = login_failed(&state, &client, &frontend_url, &error).await?;
        return Ok((jar, redirect));
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        let redirect = login_failed(&state, &client, &frontend_url, "missing_code").await?;
        return Ok((jar, redirect));
    };

    tracing::info!("Exchanging authorization code for profile");

    let profile = match state.google.authenticate(&code).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(error = %e, "Google code exchange failed");
            let redirect =
                login_failed(&state, &client, &frontend_url, "authentication_failed").await?;
            return Ok((jar, redirect));
        }
    };

    let user = state.identity.find_or_create(&profile).await?;
    let session = state.identity.issue_session(&user)?;
    state.audit.emit(AuditEvent::login(&user), &client).await?;

    tracing::info!(user_id = %user.id, "OAuth successful, session issued");

    let cookie = Cookie::build((SESSION_COOKIE, session.access_token.clone()))
        .path("/")
        .http_only(true)
        .secure(!is_local_url(&frontend_url))
        .same_site(SameSite::Lax)
        .build();

    // Redirect to frontend with token
    let redirect_url = format!(
        "{}/auth/callback?token={}",
        frontend_url, session.access_token
    );

    Ok((jar.add(cookie), Redirect::temporary(&redirect_url)))
}

/// Record a failed login and send the browser back with an error code.
async fn login_failed(
    state: &AppState,
    client: &ClientInfo,
    frontend_url: &str,
    reason: &str,
) -> Result<Redirect> {
    state
        .audit
        .emit(AuditEvent::login_failed(None, reason), client)
        .await?;

    let redirect = format!(
        "{}/auth/callback?error={}",
        frontend_url,
        urlencoding::encode(reason)
    );
    Ok(Redirect::temporary(&redirect))
}

/// Current user's stored profile.
async fn profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>> {
    let profile = state
        .identity
        .find_by_id(&user.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(profile))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "frontend/src/lib/generated/")
)]
pub struct LogoutResponse {
    pub message: String,
}

/// Logout - record the event and clear the session cookie.
///
/// Tokens are stateless; clients holding a bearer token drop it themselves.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    client: ClientInfo,
    jar: CookieJar,
) -> Result<(CookieJar, Json<LogoutResponse>)> {
    state
        .audit
        .emit(AuditEvent::logout(&user.user_id), &client)
        .await?;

    tracing::info!(user_id = %user.user_id, "User logged out");

    Ok((
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Json(LogoutResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

// ─── State Signing ───────────────────────────────────────────

fn now_millis() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

fn state_signature(payload: &str, secret: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    Some(mac.finalize().into_bytes().to_vec())
}

/// Sign `frontend_url|timestamp_hex` into an opaque OAuth state value.
fn sign_state(frontend_url: &str, timestamp_ms: u128, secret: &[u8]) -> Result<String> {
    let payload = format!("{}|{:x}", frontend_url, timestamp_ms);
    let signature = state_signature(&payload, secret)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("HMAC init failed")))?;

    // Combine payload + signature: "payload|signature_hex"
    let signed_state = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed_state.as_bytes()))
}

/// Verify HMAC signature and age, and decode the frontend URL from the state.
fn verify_and_decode_state(state: &str, secret: &[u8], now_ms: u128) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "frontend_url|timestamp_hex|signature_hex"; URLs may not
    // contain '|' unescaped, so split from the right.
    let mut parts = state_str.rsplitn(3, '|');
    let signature_hex = parts.next()?;
    let timestamp_hex = parts.next()?;
    let frontend_url = parts.next()?;

    let payload = format!("{}|{}", frontend_url, timestamp_hex);
    let expected = state_signature(&payload, secret)?;
    let provided = hex::decode(signature_hex).ok()?;

    if !bool::from(provided.ct_eq(&expected)) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued_at = u128::from_str_radix(timestamp_hex, 16).ok()?;
    if now_ms.saturating_sub(issued_at) > STATE_MAX_AGE_MS {
        tracing::warn!("OAuth state expired");
        return None;
    }

    Some(frontend_url.to_string())
}

/// Pick the frontend to return to: the requested URL's origin when it
/// matches the configured frontend origin, else the configured URL.
fn resolve_frontend_url(requested: Option<&str>, configured: &str) -> String {
    let origin_of = |raw: &str| {
        reqwest::Url::parse(raw)
            .ok()
            .map(|url| url.origin().ascii_serialization())
    };

    match (requested.and_then(origin_of), origin_of(configured)) {
        (Some(requested), Some(allowed)) if requested == allowed => requested,
        _ => configured.to_string(),
    }
}

fn is_local_url(url: &str) -> bool {
    url.starts_with("http://localhost") || url.starts_with("http://127.0.0.1")
}
