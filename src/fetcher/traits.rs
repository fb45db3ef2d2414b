// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use std::net::SocketAddr;
use url::Url;

use crate::guard::{DenyReason, GENERIC_DENIAL};

pub type BodyStream = BoxStream<'static, Result<Bytes, TransportError>>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectFailed(String),

    #[error("request timed out")]
    Timeout,

    #[error("too many redirects (max {max})")]
    TooManyRedirects { max: u8 },

    #[error("redirect to {location} denied: {reason}")]
    RedirectDenied { location: String, reason: DenyReason },

    #[error("invalid redirect: {0}")]
    InvalidRedirect(String),

    #[error("non-success status {0}")]
    NonSuccessStatus(u16),

    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl TransportError {
    /// Caller-facing text
    pub fn public_message(&self) -> String {
        match self {
            TransportError::ConnectFailed(_)
            | TransportError::RedirectDenied { .. }
            | TransportError::Body(_)
            | TransportError::Client(_) => GENERIC_DENIAL.to_string(),
            other => other.to_string(),
        }
    }

    /// Detail for the audit trail; a denied redirect names the range only
    pub fn audit_detail(&self) -> String {
        match self {
            TransportError::RedirectDenied { location, reason } => {
                format!("redirect to {} denied: {}", location, reason.audit_detail())
            }
            other => other.to_string(),
        }
    }
}

/// One GET request, pinned to the addresses validated for its host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub url: Url,
    pub host: String,
    pub pinned: Vec<SocketAddr>,
}

pub struct TransportResponse {
    pub status: u16,
    pub location: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub body: BodyStream,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a single GET without following redirects
    async fn get(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}
