// SPDX-License-Identifier: GPL-3.0-only
pub mod models;
pub mod sinks;
pub mod traits;

pub use models::{AuditEvent, AuditOutcome};
pub use sinks::{MemoryAuditSink, TracingAuditSink};
pub use traits::AuditSink;
