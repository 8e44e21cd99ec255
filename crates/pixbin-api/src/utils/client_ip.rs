//! Client identity extraction.
//!
//! Rate limiting and the visit counter key on the client IP. Behind a proxy
//! the socket address is the proxy, so the real client has to come from the
//! X-Forwarded-For chain, validated against the configured number of trusted
//! hops to prevent spoofing.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::state::AppState;

/// Extractor for the rate-limit identity of a request.
///
/// Resolution order: X-Forwarded-For (honoring `trusted_proxy_count`), then
/// X-Real-IP, then the connection's socket address, then "unknown". The
/// extractor never rejects; an unidentifiable client still shares the
/// "unknown" bucket rather than bypassing the limiter.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl FromRequestParts<Arc<AppState>> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let socket_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        let ip = resolve_client_ip(
            &parts.headers,
            socket_addr.as_ref(),
            state.config.trusted_proxy_count,
        );

        Ok(ClientIp(ip))
    }
}

/// Resolve the client IP from headers and the socket address.
///
/// `trusted_proxy_count` is the number of proxies in front of the service
/// whose X-Forwarded-For appends can be trusted.
pub fn resolve_client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trusted_proxy_count: usize,
) -> String {
    if let Some(forwarded_for) = headers.get("x-forwarded-for") {
        if let Ok(header_value) = forwarded_for.to_str() {
            let ip = pick_from_forwarded_chain(header_value, trusted_proxy_count);
            if ip != "unknown" {
                return ip;
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(header_value) = real_ip.to_str() {
            let trimmed = header_value.trim();
            if is_valid_ip(trimmed) {
                return trimmed.to_string();
            }
        }
    }

    if let Some(addr) = socket_addr {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Pick the client IP out of an X-Forwarded-For chain.
///
/// The chain reads `client, proxy1, proxy2, ...` with each proxy appending
/// the address it saw. The last `trusted_proxy_count` entries were written by
/// infrastructure we control; the entry just before them is the client. With
/// zero trusted proxies only the last entry (the peer that connected to us)
/// is believable.
fn pick_from_forwarded_chain(header_value: &str, trusted_proxy_count: usize) -> String {
    let ips: Vec<&str> = header_value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if ips.is_empty() {
        return "unknown".to_string();
    }

    // A chain shorter than the trusted hop count means a proxy was bypassed
    // or misconfigured; fall back to the nearest entry.
    if trusted_proxy_count == 0 || ips.len() <= trusted_proxy_count {
        let last_ip = ips.last().unwrap_or(&"");
        if is_valid_ip(last_ip) {
            return last_ip.to_string();
        }
        return "unknown".to_string();
    }

    let client_pos = ips.len().saturating_sub(trusted_proxy_count + 1);
    let client_ip = ips.get(client_pos).unwrap_or(&"");

    if is_valid_ip(client_ip) {
        return client_ip.to_string();
    }

    "unknown".to_string()
}

fn is_valid_ip(ip_str: &str) -> bool {
    ip_str.parse::<IpAddr>().is_ok()
}
