use std::{net::IpAddr, str::FromStr};

use actix_web::HttpRequest;
use donation_engine::AuditContext;
use hmac::{Hmac, Mac};
use log::{debug, trace};
use regex::Regex;
use sha2::Sha256;

use crate::config::ServerOptions;

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    // Collect peer IP from x-forwarded-for, or forwarded headers _if_ `use_nnn` has been set to true
    // in the configuration. Otherwise, use the peer address from the connection info.
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        result =
            req.headers().get("X-Forwarded-For").and_then(|v| v.to_str().ok()).and_then(|s| IpAddr::from_str(s).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        let re = Regex::new(r#"for=(?P<ip>[^;]+)"#).unwrap();
        result = req
            .headers()
            .get("Forwarded")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| re.captures(v))
            .and_then(|caps| caps.name("ip"))
            .map(|m| m.as_str())
            .and_then(|s| IpAddr::from_str(s).ok());
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    // If both use_x_forwarded_for and use_forwarded are set to true, overwrite the result from the Forwarded header
    result.or_else(|| {
        let peer_addr = req.connection_info().peer_addr().map(|a| a.to_string());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr.and_then(|s| IpAddr::from_str(&s).ok())
    })
}

/// Builds the audit context (source IP and user agent) for the current request.
pub fn audit_context(req: &HttpRequest, options: &ServerOptions) -> AuditContext {
    let ip = get_remote_ip(req, options.use_x_forwarded_for, options.use_forwarded).map(|ip| ip.to_string());
    let user_agent =
        req.headers().get("User-Agent").and_then(|v| v.to_str().ok()).map(|s| s.to_string());
    AuditContext { ip, user_agent }
}

/// Calculates the base64-encoded HMAC-SHA256 of `data` under `secret`. This is the signature scheme the
/// gateway applies to webhook bodies.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC can take a key of any size");
    mac.update(data);
    base64::encode(mac.finalize().into_bytes())
}

/// Verifies a base64-encoded HMAC-SHA256 signature over `data` in constant time.
pub fn verify_hmac(secret: &str, data: &[u8], signature: &str) -> bool {
    let Ok(signature) = base64::decode(signature) else {
        return false;
    };
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC can take a key of any size");
    mac.update(data);
    mac.verify_slice(&signature).is_ok()
}
