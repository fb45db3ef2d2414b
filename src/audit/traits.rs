// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use crate::audit::models::AuditEvent;

#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record a finished fetch attempt. Must not fail the caller.
    async fn record(&self, event: AuditEvent);
}
