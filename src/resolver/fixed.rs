// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::resolver::traits::{literal_address, HostResolver, ResolutionError, ResolvedAddress};

/// Resolver answering from a fixed table, without any DNS traffic
///
/// Hosts missing from the table resolve to nothing. Useful for tests that
/// need attacker-chosen address sets and for air-gapped deployments.
#[derive(Default)]
pub struct StaticResolver {
    entries: HashMap<String, Vec<IpAddr>>,
    lookups: AtomicUsize,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: &str, addresses: &[&str]) -> Self {
        let parsed = addresses.iter().filter_map(|a| a.parse().ok()).collect();
        self.entries.insert(host.to_lowercase(), parsed);
        self
    }

    /// Number of non-literal lookups answered so far
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<ResolvedAddress>, ResolutionError> {
        if let Some(address) = literal_address(host) {
            return Ok(vec![address]);
        }

        self.lookups.fetch_add(1, Ordering::SeqCst);

        match self.entries.get(&host.to_lowercase()) {
            Some(addresses) if !addresses.is_empty() => {
                Ok(addresses.iter().copied().map(ResolvedAddress::new).collect())
            }
            _ => Err(ResolutionError::NoAddressesFound(host.to_string())),
        }
    }
}
