// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;

use crate::audit::models::AuditEvent;
use crate::audit::traits::AuditSink;

/// Forwards events to `tracing` under the `audit` target
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl TracingAuditSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) {
        info!(
            target: "audit",
            id = %event.id,
            timestamp = %event.timestamp.to_rfc3339(),
            url = %event.source_url,
            outcome = event.outcome.as_str(),
            detail = %event.detail,
            "Fetch audited"
        );
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
