//! SSRF (Server-Side Request Forgery) protection for pass-through requests.
//!
//! Requests to the worker's own origin are trusted. Anything else the worker
//! forwards must not land on private, internal, or reserved addresses.

use std::net::IpAddr;
use stowaway_core::Error;
use url::{Host, Url};

/// Check if an IP address is private, reserved, or otherwise blocked.
///
/// This covers:
/// - Loopback addresses (127.0.0.0/8, ::1)
/// - RFC 1918 private ranges (10/8, 172.16/12, 192.168/16)
/// - Link-local addresses (169.254/16, fe80::/10), which includes cloud metadata endpoints
/// - Multicast and broadcast addresses
/// - Unspecified addresses (0.0.0.0/8, ::)
/// - IPv6 unique local (fc00::/7) and IPv4-mapped forms of all of the above
pub fn is_private_or_reserved(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_multicast()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || v4.octets()[0] == 0
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_private_or_reserved(IpAddr::V4(v4));
            }
            v6.is_loopback()
                || v6.is_multicast()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Resolve the host of `url` and reject it if any address is private or
/// reserved.
pub async fn validate_public(url: &Url) -> Result<(), Error> {
    let host = url
        .host()
        .ok_or_else(|| Error::InvalidUrl(format!("missing host: {url}")))?;

    let addrs: Vec<IpAddr> = match host {
        Host::Ipv4(ip) => vec![IpAddr::V4(ip)],
        Host::Ipv6(ip) => vec![IpAddr::V6(ip)],
        Host::Domain(domain) => {
            let port = url.port_or_known_default().unwrap_or(80);
            tokio::net::lookup_host((domain, port))
                .await
                .map_err(|e| Error::Network(format!("DNS resolution failed for {domain}: {e}")))?
                .map(|addr| addr.ip())
                .collect()
        }
    };

    match addrs.into_iter().find(|ip| is_private_or_reserved(*ip)) {
        Some(ip) => {
            tracing::warn!("blocked pass-through to {} ({})", url, ip);
            Err(Error::Blocked(format!("{url} resolves to private/reserved address {ip}")))
        }
        None => Ok(()),
    }
}
