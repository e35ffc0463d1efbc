//! Public address resolution
//!
//! One HTTPS GET to a checkip echo endpoint, body trimmed and parsed as an
//! IPv4 address. The address has no lifecycle: it is resolved fresh on every
//! run and never cached. A failure here aborts the run before any remote
//! mutation is attempted.

use crate::core::error::{Error, Result};
use std::net::Ipv4Addr;
use tracing::debug;

/// Default echo endpoint; returns the caller's address as plain text.
pub const DEFAULT_CHECKIP_URL: &str = "https://checkip.amazonaws.com";

/// Environment override for networks where the default endpoint is blocked.
pub const CHECKIP_URL_ENV: &str = "SGOPEN_CHECKIP_URL";

/// Returns the endpoint to query: the env override when set, else the default.
pub fn checkip_url() -> String {
    std::env::var(CHECKIP_URL_ENV).unwrap_or_else(|_| DEFAULT_CHECKIP_URL.to_string())
}

/// Fetches the caller's current public IPv4 address from `url`.
pub async fn resolve_public_address(url: &str) -> Result<Ipv4Addr> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| Error::AddressResolution(e.to_string()))?
        .error_for_status()
        .map_err(|e| Error::AddressResolution(e.to_string()))?;
    let body = response
        .text()
        .await
        .map_err(|e| Error::AddressResolution(e.to_string()))?;
    let address = parse_address(&body)?;
    debug!(%address, url, "resolved public address");
    Ok(address)
}

/// Parses an echo endpoint body: whitespace-trimmed dotted quad.
fn parse_address(body: &str) -> Result<Ipv4Addr> {
    let trimmed = body.trim();
    trimmed.parse().map_err(|_| {
        Error::AddressResolution(format!("endpoint returned a non-IPv4 body: {trimmed:?}"))
    })
}
