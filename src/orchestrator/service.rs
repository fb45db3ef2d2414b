// SPDX-License-Identifier: GPL-3.0-only
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::audit::{AuditEvent, AuditSink};
use crate::fetcher::{BoundedFetcher, FetchPolicy, Transport, TransportError};
use crate::guard::{FetchVerdict, GuardPolicy, SsrfGuard};
use crate::orchestrator::models::FetchResult;
use crate::resolver::HostResolver;

pub const DEFAULT_OVERALL_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub guard: GuardPolicy,
    pub fetch: FetchPolicy,

    /// Wall-clock bound on validation, resolution and transfer together
    pub overall_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            guard: GuardPolicy::default(),
            fetch: FetchPolicy::default(),
            overall_timeout: DEFAULT_OVERALL_TIMEOUT,
        }
    }
}

/// Entry point for fetching a caller-supplied URL
///
/// Holds no per-call state, so one instance can serve concurrent calls.
pub struct FetchOrchestrator {
    guard: Arc<SsrfGuard>,
    fetcher: BoundedFetcher,
    audit: Arc<dyn AuditSink>,
    overall_timeout: Duration,
}

impl FetchOrchestrator {
    pub fn new(
        resolver: Arc<dyn HostResolver>,
        transport: Arc<dyn Transport>,
        audit: Arc<dyn AuditSink>,
        settings: FetchSettings,
    ) -> Self {
        let guard = Arc::new(SsrfGuard::new(resolver, settings.guard));
        let fetcher = BoundedFetcher::new(guard.clone(), transport, settings.fetch);

        Self {
            guard,
            fetcher,
            audit,
            overall_timeout: settings.overall_timeout,
        }
    }

    /// Validate and fetch `raw`, recording exactly one audit event
    pub async fn fetch_url(&self, raw: &str) -> FetchResult {
        info!(url = %raw, "Fetch requested");

        let result = match tokio::time::timeout(self.overall_timeout, self.run(raw)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(url = %raw, timeout_secs = self.overall_timeout.as_secs_f64(), "Fetch timed out");
                FetchResult::TransportError {
                    error: TransportError::Timeout,
                }
            }
        };

        self.audit
            .record(AuditEvent::new(raw, result.outcome(), result.audit_detail()))
            .await;

        result
    }

    async fn run(&self, raw: &str) -> FetchResult {
        let target = match self.guard.evaluate(raw).await {
            FetchVerdict::Allowed(target) => target,
            FetchVerdict::Denied { reason, .. } => return FetchResult::Denied { reason },
        };

        match self.fetcher.fetch(target).await {
            Ok(content) => {
                info!(
                    url = %raw,
                    status = content.status_code,
                    bytes = content.body.len(),
                    truncated = content.truncated,
                    "Fetch succeeded"
                );
                FetchResult::Success(content)
            }
            Err(error) => {
                warn!(url = %raw, error = %error, "Fetch failed");
                FetchResult::TransportError { error }
            }
        }
    }
}
