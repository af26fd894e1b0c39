//! Host port reservation and public host derivation.

use std::net::{Ipv4Addr, TcpListener};

use crate::error::{ProvisionError, ProvisionResult};

/// Returned when neither configuration nor the request names a host.
pub const LOOPBACK_HOST: &str = "127.0.0.1";

/// Ask the OS for a free TCP port by binding port zero, then release it.
///
/// Nothing holds the port afterwards; the container runtime's own bind
/// is what finally claims it, and a lost race shows up there as a port
/// conflict.
pub fn reserve_port() -> ProvisionResult<u16> {
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(ProvisionError::PortReservation)?;
    let port = listener
        .local_addr()
        .map_err(ProvisionError::PortReservation)?
        .port();
    Ok(port)
}

/// Host clients should connect to.
///
/// A configured public host wins. Otherwise the inbound request's `Host`
/// value is used with any port and IPv6 brackets removed, falling back to
/// loopback when nothing is left.
pub fn derive_host(public_host: Option<&str>, request_host: &str) -> String {
    if let Some(public) = public_host.map(str::trim).filter(|h| !h.is_empty()) {
        return public.to_string();
    }

    let host = strip_port(request_host.trim()).trim_matches(|c| c == '[' || c == ']');
    if host.is_empty() {
        LOOPBACK_HOST.to_string()
    } else {
        host.to_string()
    }
}

/// `host:port`, `[v6]:port` and `[v6]` lose their port; a bare IPv6
/// address (several colons, no brackets) is left alone.
fn strip_port(authority: &str) -> &str {
    if let Some(rest) = authority.strip_prefix('[') {
        return match rest.find(']') {
            Some(end) => &rest[..end],
            None => authority,
        };
    }
    match authority.split_once(':') {
        Some((host, port)) if !port.contains(':') => host,
        _ => authority,
    }
}
