// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets are injected as environment variables by the deployment and read
//! once at startup.

use crate::services::MAX_PAGE_SIZE;
use std::env;
use std::time::Duration;

/// Default TTL for cached entries (10 minutes).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;
/// Default maximum number of cached entries.
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1000;
/// Default page size for entry listings.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Default session lifetime (7 days).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Which durable store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    /// Process-local store for development; data is lost on restart.
    Memory,
}

/// What to do when an audit write fails after the primary operation succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditPolicy {
    /// Audit is part of the request: a failed write fails the request.
    Mandatory,
    /// Log the failure and return the primary result anyway.
    BestEffort,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// OAuth redirect URI registered with Google
    pub google_callback_url: String,
    /// Frontend URL for OAuth redirects (also the only allowed redirect origin)
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    pub store_backend: StoreBackend,
    /// TTL for the entry read-through cache
    pub cache_ttl: Duration,
    pub cache_max_entries: usize,
    /// Page size used when a listing omits `limit`
    pub default_page_size: u32,
    /// Lifetime of issued session tokens
    pub session_ttl: Duration,
    pub audit_policy: AuditPolicy,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for the OAuth state parameter
    pub oauth_state_key: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            google_client_id: "test_client_id".to_string(),
            google_callback_url: "http://localhost:8080/auth/google/callback".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            default_page_size: DEFAULT_PAGE_SIZE,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            audit_policy: AuditPolicy::Mandatory,
            google_client_secret: "test_secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_signing_key = env::var("JWT_SIGNING_KEY")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
            .into_bytes();
        let oauth_state_key = env::var("OAUTH_STATE_KEY")
            .map(|v| v.trim().as_bytes().to_vec())
            .unwrap_or_else(|_| jwt_signing_key.clone());

        Ok(Self {
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            google_callback_url: env::var("GOOGLE_CALLBACK_URL")
                .unwrap_or_else(|_| "http://localhost:8080/auth/google/callback".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            store_backend: parse_store_backend(env::var("STORE_BACKEND").ok().as_deref())?,
            cache_ttl: Duration::from_secs(env_number(
                "ENTRY_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL_SECS,
            )?),
            cache_max_entries: env_number("ENTRY_CACHE_MAX_ENTRIES", DEFAULT_CACHE_MAX_ENTRIES)?,
            default_page_size: check_page_size(env_number(
                "DEFAULT_PAGE_SIZE",
                DEFAULT_PAGE_SIZE,
            )?)?,
            session_ttl: Duration::from_secs(env_number(
                "SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL_SECS,
            )?),
            audit_policy: parse_audit_policy(env::var("AUDIT_POLICY").ok().as_deref())?,

            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?,
            jwt_signing_key,
            oauth_state_key,
        })
    }
}

fn env_number<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// The default page size must itself be an accepted `limit`.
fn check_page_size(size: u32) -> Result<u32, ConfigError> {
    if (1..=MAX_PAGE_SIZE).contains(&size) {
        Ok(size)
    } else {
        Err(ConfigError::Invalid("DEFAULT_PAGE_SIZE", size.to_string()))
    }
}

fn parse_store_backend(raw: Option<&str>) -> Result<StoreBackend, ConfigError> {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("firestore") => Ok(StoreBackend::Firestore),
        Some("memory") => Ok(StoreBackend::Memory),
        Some(other) => Err(ConfigError::Invalid("STORE_BACKEND", other.to_string())),
    }
}

fn parse_audit_policy(raw: Option<&str>) -> Result<AuditPolicy, ConfigError> {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("mandatory") => Ok(AuditPolicy::Mandatory),
        Some("best_effort") | Some("best-effort") => Ok(AuditPolicy::BestEffort),
        Some(other) => Err(ConfigError::Invalid("AUDIT_POLICY", other.to_string())),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
