// SPDX-License-Identifier: GPL-3.0-only
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Succeeded,
    Denied,
    Failed,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Succeeded => "succeeded",
            AuditOutcome::Denied => "denied",
            AuditOutcome::Failed => "failed",
        }
    }
}

/// One record per fetch attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,

    pub timestamp: DateTime<Utc>,

    /// URL exactly as the caller supplied it
    pub source_url: String,

    pub outcome: AuditOutcome,

    /// Short reason; may name a blocked range but never a resolved address
    pub detail: String,
}

impl AuditEvent {
    pub fn new(source_url: &str, outcome: AuditOutcome, detail: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source_url: source_url.to_string(),
            outcome,
            detail,
        }
    }
}
