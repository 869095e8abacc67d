// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Requesting client's address and user agent, for the audit trail.

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

/// Headers consulted for the client address, most trusted first.
const IP_HEADERS: &[&str] = &[
    "x-forwarded-for",
    "x-real-ip",
    "x-client-ip",
    "cf-connecting-ip",
    "x-cluster-client-ip",
    "x-forwarded",
    "forwarded-for",
    "forwarded",
];

const IPV4_MAPPED_PREFIX: &str = "::ffff:";
const UNKNOWN_IP: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn from_parts(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let ip = client_ip_from_headers(headers)
            .or_else(|| peer.and_then(|addr| parse_ip(&addr.ip().to_string())))
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| UNKNOWN_IP.to_string());

        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self { ip, user_agent }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(Self::from_parts(&parts.headers, peer))
    }
}

/// First header value that holds a valid address; malformed values are skipped.
fn client_ip_from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    IP_HEADERS.iter().find_map(|name| {
        let value = headers.get(*name)?.to_str().ok()?;
        let candidate = if *name == "forwarded" {
            forwarded_for(value)?
        } else {
            value.split(',').next()?.trim()
        };
        parse_ip(candidate)
    })
}

/// Parse an address, tolerating a port and the IPv4-mapped IPv6 prefix.
fn parse_ip(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    let raw = raw.strip_prefix(IPV4_MAPPED_PREFIX).unwrap_or(raw);
    raw.parse::<IpAddr>()
        .or_else(|_| raw.parse::<SocketAddr>().map(|addr| addr.ip()))
        .ok()
}

/// Extract the first `for=` node from an RFC 7239 `Forwarded` header.
fn forwarded_for(value: &str) -> Option<&str> {
    value
        .split(',')
        .next()?
        .split(';')
        .find_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            key.eq_ignore_ascii_case("for").then_some(val)
        })
        .map(|val| val.trim_matches('"'))
}
