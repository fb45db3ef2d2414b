// SPDX-License-Identifier: GPL-3.0-only
use crate::audit::AuditOutcome;
use crate::fetcher::{FetchedContent, TransportError};
use crate::guard::DenyReason;

/// Outcome of one `fetch_url` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Success(FetchedContent),
    Denied { reason: DenyReason },
    TransportError { error: TransportError },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success(_))
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, FetchResult::Denied { .. })
    }

    /// A redirect hop refused by the guard counts as a denial
    pub fn outcome(&self) -> AuditOutcome {
        match self {
            FetchResult::Success(_) => AuditOutcome::Succeeded,
            FetchResult::Denied { .. } => AuditOutcome::Denied,
            FetchResult::TransportError {
                error: TransportError::RedirectDenied { .. },
            } => AuditOutcome::Denied,
            FetchResult::TransportError { .. } => AuditOutcome::Failed,
        }
    }

    /// Text safe to hand back to whoever supplied the URL
    pub fn public_message(&self) -> String {
        match self {
            FetchResult::Success(content) => format!("status {}", content.status_code),
            FetchResult::Denied { reason } => reason.public_message(),
            FetchResult::TransportError { error } => error.public_message(),
        }
    }

    pub fn audit_detail(&self) -> String {
        match self {
            FetchResult::Success(content) => {
                let mut detail = format!("status {}, {} bytes", content.status_code, content.body.len());
                if content.truncated {
                    detail.push_str(", truncated");
                }
                if !content.redirects.is_empty() {
                    detail.push_str(&format!(", {} redirects", content.redirects.len()));
                }
                detail
            }
            FetchResult::Denied { reason } => reason.audit_detail(),
            FetchResult::TransportError { error } => error.audit_detail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::ContentKind;
    use crate::guard::{classify, ValidationError, GENERIC_DENIAL};
    use url::Url;

    fn content(truncated: bool) -> FetchedContent {
        FetchedContent {
            status_code: 200,
            content_type: Some("text/plain".to_string()),
            content_kind: ContentKind::Text,
            body: b"hello".to_vec(),
            truncated,
            final_url: Url::parse("https://example.com/").unwrap(),
            redirects: Vec::new(),
        }
    }

    #[test]
    fn test_success_details() {
        let result = FetchResult::Success(content(true));
        assert!(result.is_success());
        assert_eq!(result.outcome(), AuditOutcome::Succeeded);
        assert_eq!(result.audit_detail(), "status 200, 5 bytes, truncated");
    }

    #[test]
    fn test_denied_hides_address() {
        let ip = "10.0.0.5".parse().unwrap();
        let result = FetchResult::Denied {
            reason: DenyReason::BlockedAddress {
                address: ip,
                range: classify(ip).blocked_range.unwrap(),
            },
        };
        assert!(result.is_denied());
        assert_eq!(result.outcome(), AuditOutcome::Denied);
        assert_eq!(result.public_message(), GENERIC_DENIAL);
        assert!(!result.audit_detail().contains("10.0.0.5"));
        assert!(result.audit_detail().contains("10.0.0.0/8"));
    }

    #[test]
    fn test_validation_message_passed_through() {
        let result = FetchResult::Denied {
            reason: DenyReason::Validation(ValidationError::Malformed),
        };
        assert_eq!(result.public_message(), "malformed");
    }

    #[test]
    fn test_transport_outcomes() {
        let failed = FetchResult::TransportError { error: TransportError::Timeout };
        assert_eq!(failed.outcome(), AuditOutcome::Failed);
        assert_eq!(failed.public_message(), "request timed out");

        let redirect = FetchResult::TransportError {
            error: TransportError::RedirectDenied {
                location: "http://127.0.0.1/admin".to_string(),
                reason: DenyReason::Validation(ValidationError::LoopbackHost("127.0.0.1".to_string())),
            },
        };
        assert_eq!(redirect.outcome(), AuditOutcome::Denied);
        assert_eq!(redirect.public_message(), GENERIC_DENIAL);
    }
}
