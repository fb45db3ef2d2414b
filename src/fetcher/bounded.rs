// SPDX-License-Identifier: GPL-3.0-only
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::fetcher::content::ContentKind;
use crate::fetcher::traits::{BodyStream, Transport, TransportError, TransportRequest};
use crate::guard::{FetchVerdict, SsrfGuard, ValidatedTarget};

/// Hard ceiling on followed redirects, whatever the configuration says
pub const MAX_REDIRECT_CAP: u8 = 3;

/// Default response body cap (2 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// What to do with a body larger than the cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OversizePolicy {
    /// Keep the first `max_body_bytes` bytes and flag the result
    Truncate,
    /// Fail the fetch with `BodyTooLarge`
    Reject,
}

impl FromStr for OversizePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "truncate" => Ok(OversizePolicy::Truncate),
            "reject" => Ok(OversizePolicy::Reject),
            other => Err(format!("unknown oversize policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub max_redirects: u8,
    pub max_body_bytes: usize,
    pub oversize: OversizePolicy,
    pub reject_non_success: bool,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_redirects: MAX_REDIRECT_CAP,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            oversize: OversizePolicy::Truncate,
            reject_non_success: false,
        }
    }
}

/// A completed fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    pub status_code: u16,
    pub content_type: Option<String>,
    pub content_kind: ContentKind,
    pub body: Vec<u8>,
    pub truncated: bool,
    pub final_url: Url,
    /// Redirect targets that were followed, in order
    pub redirects: Vec<Url>,
}

impl FetchedContent {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn is_followed_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// Performs the GET for a pre-validated target
///
/// Every redirect hop goes back through the guard before it is followed,
/// and each request connects only to the addresses validated for its hop.
pub struct BoundedFetcher {
    guard: Arc<SsrfGuard>,
    transport: Arc<dyn Transport>,
    policy: FetchPolicy,
}

impl BoundedFetcher {
    pub fn new(guard: Arc<SsrfGuard>, transport: Arc<dyn Transport>, policy: FetchPolicy) -> Self {
        Self {
            guard,
            transport,
            policy,
        }
    }

    pub async fn fetch(&self, target: ValidatedTarget) -> Result<FetchedContent, TransportError> {
        let max_redirects = self.policy.max_redirects.min(MAX_REDIRECT_CAP);
        let mut current = target;
        let mut redirects: Vec<Url> = Vec::new();

        loop {
            let request = TransportRequest {
                url: current.url.as_url().clone(),
                host: current.url.host().to_string(),
                pinned: current.socket_addrs(),
            };

            let response = self.transport.get(request).await?;

            if is_followed_redirect(response.status) {
                let location = response.location.ok_or_else(|| {
                    TransportError::InvalidRedirect(format!(
                        "status {} without Location header",
                        response.status
                    ))
                })?;

                if redirects.len() >= max_redirects as usize {
                    warn!(url = %current.url, max = max_redirects, "Redirect limit reached");
                    return Err(TransportError::TooManyRedirects { max: max_redirects });
                }

                let next = current
                    .url
                    .as_url()
                    .join(&location)
                    .map_err(|_| TransportError::InvalidRedirect(location.clone()))?;

                current = match self.guard.evaluate(next.as_str()).await {
                    FetchVerdict::Allowed(next_target) => next_target,
                    FetchVerdict::Denied { reason, .. } => {
                        warn!(from = %current.url, to = %next, reason = %reason, "Redirect denied");
                        return Err(TransportError::RedirectDenied {
                            location: next.to_string(),
                            reason,
                        });
                    }
                };

                info!(to = %next, hop = redirects.len() + 1, "Following redirect");
                redirects.push(next);
                continue;
            }

            if self.policy.reject_non_success && !(200..300).contains(&response.status) {
                return Err(TransportError::NonSuccessStatus(response.status));
            }

            let (body, truncated) = self.read_body(response.body, response.content_length).await?;

            debug!(
                url = %current.url,
                status = response.status,
                bytes = body.len(),
                truncated,
                "Fetch completed"
            );

            return Ok(FetchedContent {
                status_code: response.status,
                content_kind: ContentKind::from_content_type(response.content_type.as_deref()),
                content_type: response.content_type,
                body,
                truncated,
                final_url: current.url.as_url().clone(),
                redirects,
            });
        }
    }

    /// Read at most `max_body_bytes`; the stream is dropped as soon as the cap is hit
    async fn read_body(
        &self,
        mut stream: BodyStream,
        content_length: Option<u64>,
    ) -> Result<(Vec<u8>, bool), TransportError> {
        let limit = self.policy.max_body_bytes;

        if self.policy.oversize == OversizePolicy::Reject
            && content_length.is_some_and(|len| len > limit as u64)
        {
            return Err(TransportError::BodyTooLarge { limit });
        }

        let initial = content_length.map_or(0, |len| len.min(limit as u64) as usize);
        let mut body = Vec::with_capacity(initial);

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let remaining = limit - body.len();

            if chunk.len() > remaining {
                match self.policy.oversize {
                    OversizePolicy::Reject => return Err(TransportError::BodyTooLarge { limit }),
                    OversizePolicy::Truncate => {
                        body.extend_from_slice(&chunk[..remaining]);
                        warn!(limit, "Response body truncated");
                        return Ok((body, true));
                    }
                }
            }

            body.extend_from_slice(&chunk);
        }

        Ok((body, false))
    }
}
