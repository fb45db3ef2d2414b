// SPDX-License-Identifier: GPL-3.0-only
use std::fmt;
use url::{Host, Url};

/// Maximum allowed URL length
pub const MAX_URL_LENGTH: usize = 2048;

/// Host names rejected before any DNS lookup
const LOOPBACK_LITERALS: &[&str] = &["localhost", "127.0.0.1", "::1", "0.0.0.0", "::"];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed")]
    Malformed,

    #[error("URL exceeds maximum length of {max} characters")]
    TooLong { length: usize, max: usize },

    #[error("scheme '{0}' not allowed (only http and https are allowed)")]
    SchemeNotAllowed(String),

    #[error("credentials in URL are not allowed")]
    CredentialsNotAllowed,

    #[error("host '{0}' is a loopback name")]
    LoopbackHost(String),
}

/// A URL that passed syntactic validation
///
/// Holds the parsed URL exactly as the caller supplied it; the host is kept
/// separately without IPv6 brackets so it can be handed to a resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    url: Url,
    host: String,
}

impl ParsedUrl {
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit port, if the URL carries a non-default one
    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    /// Port the connection will use, defaulting to 80 for http and 443 for https
    pub fn effective_port(&self) -> u16 {
        self.url
            .port_or_known_default()
            .unwrap_or(if self.is_https() { 443 } else { 80 })
    }

    pub fn is_https(&self) -> bool {
        self.url.scheme() == "https"
    }

    /// True when the host is an IP literal rather than a name
    pub fn is_ip_literal(&self) -> bool {
        matches!(self.url.host(), Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)))
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for ParsedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Syntactic URL checks run before any network activity
///
/// Checks:
/// - Rejects empty input and overly long URLs
/// - Only allows http/https schemes
/// - Rejects embedded credentials
/// - Rejects localhost and literal loopback hosts
#[derive(Debug, Clone)]
pub struct UrlValidator {
    max_length: usize,
}

impl UrlValidator {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn validate(&self, raw: &str) -> Result<ParsedUrl, ValidationError> {
        if raw.trim().is_empty() {
            return Err(ValidationError::Malformed);
        }

        if raw.len() > self.max_length {
            return Err(ValidationError::TooLong {
                length: raw.len(),
                max: self.max_length,
            });
        }

        let url = Url::parse(raw).map_err(|_| ValidationError::Malformed)?;

        // The url crate already lower-cases the scheme
        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(ValidationError::SchemeNotAllowed(scheme.to_string())),
        }

        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            _ => return Err(ValidationError::Malformed),
        };

        if host.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError::Malformed);
        }

        if !url.username().is_empty() || url.password().is_some() {
            return Err(ValidationError::CredentialsNotAllowed);
        }

        if is_loopback_name(&host) {
            return Err(ValidationError::LoopbackHost(host));
        }

        Ok(ParsedUrl { url, host })
    }
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self::new(MAX_URL_LENGTH)
    }
}

/// Validate a URL with the default length limit
pub fn validate_url(raw: &str) -> Result<ParsedUrl, ValidationError> {
    UrlValidator::default().validate(raw)
}

/// Check if a hostname is a localhost variant
fn is_loopback_name(host: &str) -> bool {
    let host_lower = host.to_lowercase();
    let host_lower = host_lower.strip_suffix('.').unwrap_or(&host_lower);
    LOOPBACK_LITERALS.contains(&host_lower) || host_lower.ends_with(".localhost")
}
