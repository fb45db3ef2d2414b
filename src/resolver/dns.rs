// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

use crate::resolver::traits::{literal_address, HostResolver, ResolutionError, ResolvedAddress};

/// Default bound on a single host resolution
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(3);

/// Resolver backed by the system DNS configuration, or an explicit one
pub struct DnsResolver {
    resolver: TokioResolver,
    timeout: Duration,
}

impl DnsResolver {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let resolver = TokioResolver::builder_tokio()?.build();
        Ok(Self { resolver, timeout })
    }

    /// Use the given name servers and options instead of the system configuration
    pub fn with_config(config: ResolverConfig, options: ResolverOpts, timeout: Duration) -> Self {
        let resolver = TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
            .with_options(options)
            .build();
        Self { resolver, timeout }
    }
}

#[async_trait]
impl HostResolver for DnsResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<ResolvedAddress>, ResolutionError> {
        if let Some(address) = literal_address(host) {
            return Ok(vec![address]);
        }

        let lookups = async {
            tokio::join!(
                self.resolver.ipv4_lookup(host),
                self.resolver.ipv6_lookup(host)
            )
        };

        let (v4, v6) = tokio::time::timeout(self.timeout, lookups)
            .await
            .map_err(|_| ResolutionError::Timeout {
                host: host.to_string(),
                timeout: self.timeout,
            })?;

        let mut addresses: Vec<ResolvedAddress> = Vec::new();
        let mut failure = None;

        match v4 {
            Ok(lookup) => addresses.extend(lookup.iter().map(|a| ResolvedAddress::new(IpAddr::V4(a.0)))),
            Err(e) if e.is_no_records_found() => {}
            Err(e) => failure = Some(e.to_string()),
        }
        match v6 {
            Ok(lookup) => addresses.extend(lookup.iter().map(|a| ResolvedAddress::new(IpAddr::V6(a.0)))),
            Err(e) if e.is_no_records_found() => {}
            Err(e) => failure = Some(e.to_string()),
        }

        let mut unique = Vec::with_capacity(addresses.len());
        for address in addresses {
            if !unique.contains(&address) {
                unique.push(address);
            }
        }

        if unique.is_empty() {
            return Err(match failure {
                Some(message) => ResolutionError::Lookup {
                    host: host.to_string(),
                    message,
                },
                None => ResolutionError::NoAddressesFound(host.to_string()),
            });
        }

        debug!(host = %host, count = unique.len(), "Host resolved");
        Ok(unique)
    }
}
