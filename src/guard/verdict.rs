// SPDX-License-Identifier: GPL-3.0-only
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::guard::classifier::BlockedRange;
use crate::guard::url_validator::{ParsedUrl, ValidationError};
use crate::resolver::{ResolutionError, ResolvedAddress};

/// Message shown to callers for denials that would reveal network layout
pub const GENERIC_DENIAL: &str = "could not fetch";

/// Why a URL was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    Validation(ValidationError),
    Resolution(ResolutionError),
    BlockedAddress { address: IpAddr, range: BlockedRange },
}

impl DenyReason {
    /// Caller-facing text; never names internal addresses or ranges
    pub fn public_message(&self) -> String {
        match self {
            DenyReason::Validation(e) => e.to_string(),
            DenyReason::Resolution(_) | DenyReason::BlockedAddress { .. } => GENERIC_DENIAL.to_string(),
        }
    }

    /// Detail for the audit trail: names the range, never the resolved address
    pub fn audit_detail(&self) -> String {
        match self {
            DenyReason::BlockedAddress { range, .. } => format!("blocked range {}", range),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::Validation(e) => write!(f, "{}", e),
            DenyReason::Resolution(e) => write!(f, "unresolvable or no addresses ({})", e),
            DenyReason::BlockedAddress { address, range } => {
                write!(f, "address {} is in blocked range {}", address, range)
            }
        }
    }
}

/// A URL together with every address it was validated against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTarget {
    pub url: ParsedUrl,
    pub addresses: Vec<ResolvedAddress>,
}

impl ValidatedTarget {
    /// Socket addresses the transport may connect to for this target
    pub fn socket_addrs(&self) -> Vec<SocketAddr> {
        let port = self.url.effective_port();
        self.addresses
            .iter()
            .map(|a| SocketAddr::new(a.ip, port))
            .collect()
    }
}

/// The single allow/deny decision for one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchVerdict {
    /// Every resolved address passed and at least one was resolved
    Allowed(ValidatedTarget),
    Denied {
        reason: DenyReason,
        parsed_url: Option<ParsedUrl>,
    },
}

impl FetchVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, FetchVerdict::Allowed(_))
    }

    pub fn reason(&self) -> Option<&DenyReason> {
        match self {
            FetchVerdict::Allowed(_) => None,
            FetchVerdict::Denied { reason, .. } => Some(reason),
        }
    }

    pub fn parsed_url(&self) -> Option<&ParsedUrl> {
        match self {
            FetchVerdict::Allowed(target) => Some(&target.url),
            FetchVerdict::Denied { parsed_url, .. } => parsed_url.as_ref(),
        }
    }
}
