// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Security headers middleware.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Content-Security-Policy allowing API calls from the frontend origin.
pub fn content_security_policy(frontend_url: &str) -> String {
    format!(
        "default-src 'self'; connect-src 'self' {}; img-src 'self' data: https:; \
         object-src 'none'; frame-ancestors 'none'; base-uri 'self'",
        frontend_url
    )
}

/// Add security headers to all responses.
pub async fn add_security_headers(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Strict-Transport-Security",
        HeaderValue::from_static("max-age=31536000; includeSubDomains; preload"),
    );
    if let Ok(csp) = HeaderValue::from_str(&content_security_policy(&state.config.frontend_url)) {
        headers.insert("Content-Security-Policy", csp);
    }
    headers.insert(
        "Cross-Origin-Resource-Policy",
        HeaderValue::from_static("cross-origin"),
    );
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("no-referrer"),
    );

    response
}
