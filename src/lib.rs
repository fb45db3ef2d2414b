// SPDX-License-Identifier: GPL-3.0-only
//! Fetching caller-supplied URLs without letting them reach internal networks.
//!
//! A URL is validated, its host resolved and every resolved address checked
//! against a table of disallowed ranges before any connection is opened. The
//! transfer itself is pinned to the validated addresses, re-checks every
//! redirect hop and never reads more than a configured number of bytes.

pub mod api;
pub mod audit;
pub mod config;
pub mod fetcher;
pub mod guard;
pub mod logging;
pub mod orchestrator;
pub mod resolver;

#[cfg(test)]
mod test_helpers;

pub use audit::{AuditEvent, AuditOutcome, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use fetcher::{FetchPolicy, FetchedContent, HttpClient, OversizePolicy, Transport, TransportError};
pub use guard::{DenyReason, FetchVerdict, GuardPolicy, SsrfGuard};
pub use orchestrator::{FetchOrchestrator, FetchResult, FetchSettings};
pub use resolver::{DnsResolver, HostResolver, StaticResolver};
