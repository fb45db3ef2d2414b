// SPDX-License-Identifier: GPL-3.0-only
use ipnet::IpNet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::guard::classifier::classify_with_exemptions;
use crate::guard::url_validator::{UrlValidator, MAX_URL_LENGTH};
use crate::guard::verdict::{DenyReason, FetchVerdict, ValidatedTarget};
use crate::resolver::{HostResolver, ResolutionError};

/// Tunables for URL acceptance
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    pub max_url_length: usize,

    /// Ranges allowed even though the classifier would block them
    pub exempt_ranges: Vec<IpNet>,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            max_url_length: MAX_URL_LENGTH,
            exempt_ranges: Vec::new(),
        }
    }
}

/// Decides whether a URL may be fetched, against one snapshot of DNS state
pub struct SsrfGuard {
    validator: UrlValidator,
    resolver: Arc<dyn HostResolver>,
    exempt_ranges: Vec<IpNet>,
}

impl SsrfGuard {
    pub fn new(resolver: Arc<dyn HostResolver>, policy: GuardPolicy) -> Self {
        Self {
            validator: UrlValidator::new(policy.max_url_length),
            resolver,
            exempt_ranges: policy.exempt_ranges,
        }
    }

    /// Validate, resolve and classify `raw`
    ///
    /// A host is denied as a whole when any one of its addresses is in a
    /// disallowed range, so a name that round-robins between a public and a
    /// private address cannot be used to reach the private one.
    pub async fn evaluate(&self, raw: &str) -> FetchVerdict {
        let parsed = match self.validator.validate(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(url = %raw, reason = %e, "URL rejected by validator");
                return FetchVerdict::Denied {
                    reason: DenyReason::Validation(e),
                    parsed_url: None,
                };
            }
        };

        let addresses = match self.resolver.resolve(parsed.host()).await {
            Ok(addresses) if !addresses.is_empty() => addresses,
            Ok(_) => {
                warn!(url = %raw, host = %parsed.host(), "Host resolved to no addresses");
                return FetchVerdict::Denied {
                    reason: DenyReason::Resolution(ResolutionError::NoAddressesFound(
                        parsed.host().to_string(),
                    )),
                    parsed_url: Some(parsed),
                };
            }
            Err(e) => {
                warn!(url = %raw, host = %parsed.host(), error = %e, "Host resolution failed");
                return FetchVerdict::Denied {
                    reason: DenyReason::Resolution(e),
                    parsed_url: Some(parsed),
                };
            }
        };

        for address in &addresses {
            let verdict = classify_with_exemptions(address.ip, &self.exempt_ranges);
            if let Some(range) = verdict.blocked_range {
                warn!(
                    url = %raw,
                    host = %parsed.host(),
                    address = %address.ip,
                    range = %range,
                    "Resolved address in blocked range"
                );
                return FetchVerdict::Denied {
                    reason: DenyReason::BlockedAddress {
                        address: address.ip,
                        range,
                    },
                    parsed_url: Some(parsed),
                };
            }
        }

        debug!(url = %raw, count = addresses.len(), "URL allowed");
        FetchVerdict::Allowed(ValidatedTarget {
            url: parsed,
            addresses,
        })
    }
}
