// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use serde::Serialize;
use std::net::IpAddr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    V4,
    V6,
}

/// One candidate address for a host, valid for a single validation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedAddress {
    pub ip: IpAddr,
    pub family: AddressFamily,
}

impl ResolvedAddress {
    pub fn new(ip: IpAddr) -> Self {
        let family = match ip {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        };
        Self { ip, family }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("no addresses found for {0}")]
    NoAddressesFound(String),

    #[error("resolution of {host} timed out after {timeout:?}")]
    Timeout { host: String, timeout: Duration },

    #[error("lookup of {host} failed: {message}")]
    Lookup { host: String, message: String },
}

#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Resolve a host to its candidate addresses (A and AAAA)
    ///
    /// Literal IP hosts resolve to themselves without touching DNS. An empty
    /// answer is reported as `NoAddressesFound`, never as an empty set.
    async fn resolve(&self, host: &str) -> Result<Vec<ResolvedAddress>, ResolutionError>;
}

/// Parse a host that is already an IP literal, with or without IPv6 brackets
pub fn literal_address(host: &str) -> Option<ResolvedAddress> {
    let trimmed = host.trim_start_matches('[').trim_end_matches(']');
    trimmed.parse::<IpAddr>().ok().map(ResolvedAddress::new)
}
