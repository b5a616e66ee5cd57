//! Client IP extraction from HTTP headers with trust validation
//!
//! The client IP is the visitor identity for unique-visitor counting.
//! Proxy headers are only consulted when the configuration says a proxy
//! sits in front of the service; otherwise the socket peer address is used.

use axum::http::HeaderMap;
use std::net::IpAddr;
use tracing::warn;

use crate::config::{ClientIpConfig, TrustedProxyMode};

/// Extract the client IP address, falling back to `socket_addr` when the
/// trusted headers are absent or unparsable
pub fn extract_client_ip(headers: &HeaderMap, socket_addr: IpAddr, config: &ClientIpConfig) -> IpAddr {
    match config.trusted_proxy_mode {
        TrustedProxyMode::Cloudflare => extract_cloudflare_ip(headers).unwrap_or_else(|| {
            warn!("CF-Connecting-IP header missing in Cloudflare mode, using socket address");
            socket_addr
        }),
        TrustedProxyMode::Standard => extract_standard_ip(headers, config).unwrap_or(socket_addr),
        TrustedProxyMode::None => socket_addr,
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

fn extract_cloudflare_ip(headers: &HeaderMap) -> Option<IpAddr> {
    header_str(headers, "cf-connecting-ip").and_then(|s| s.trim().parse::<IpAddr>().ok())
}

fn extract_standard_ip(headers: &HeaderMap, config: &ClientIpConfig) -> Option<IpAddr> {
    extract_from_forwarded(headers)
        .or_else(|| extract_from_x_forwarded_for(headers, config))
        .or_else(|| header_str(headers, "x-real-ip").and_then(|s| s.trim().parse::<IpAddr>().ok()))
}

/// First `for=` node of an RFC 7239 Forwarded header
fn extract_from_forwarded(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded = header_str(headers, "forwarded")?;

    forwarded
        .split(',')
        .flat_map(|element| element.split(';'))
        .filter_map(|param| {
            let (name, value) = param.trim().split_once('=')?;
            name.eq_ignore_ascii_case("for").then_some(value)
        })
        .find_map(parse_forwarded_node)
}

/// `192.0.2.60`, `"192.0.2.60:4711"`, `"[2001:db8::1]:4711"`
fn parse_forwarded_node(value: &str) -> Option<IpAddr> {
    let value = value.trim().trim_matches('"');

    if let Some(rest) = value.strip_prefix('[') {
        return rest.split(']').next()?.parse().ok();
    }
    if let Ok(ip) = value.parse::<IpAddr>() {
        return Some(ip);
    }
    // IPv4 with port
    let (host, _port) = value.rsplit_once(':')?;
    host.parse().ok()
}

/// X-Forwarded-For, skipping `num_trusted_proxies` hops from the right
fn extract_from_x_forwarded_for(headers: &HeaderMap, config: &ClientIpConfig) -> Option<IpAddr> {
    let xff = header_str(headers, "x-forwarded-for")?;

    let ips: Vec<IpAddr> = xff
        .split(',')
        .filter_map(|s| s.trim().parse::<IpAddr>().ok())
        .collect();

    match config.num_trusted_proxies {
        Some(num_trusted) if ips.len() > num_trusted => Some(ips[ips.len() - num_trusted - 1]),
        // Chain shorter than the proxy count, take the least trusted entry
        Some(_) => ips.first().copied(),
        None => ips.last().copied(),
    }
}
