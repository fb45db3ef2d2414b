// SPDX-License-Identifier: GPL-3.0-only
use axum::http::StatusCode;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::fetcher::{ContentKind, FetchedContent, TransportError};
use crate::orchestrator::{FetchOrchestrator, FetchResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// How `FetchedPayload::body` is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    Utf8,
    Base64,
}

/// Fetched content as returned over the API
#[derive(Debug, Serialize)]
pub struct FetchedPayload {
    pub status_code: u16,
    pub content_type: Option<String>,
    pub content_kind: ContentKind,
    pub bytes: usize,
    /// Text bodies as UTF-8 (lossy for textual kinds), anything else that
    /// is not valid UTF-8 as base64
    pub body: String,
    pub body_encoding: BodyEncoding,
    pub truncated: bool,
    pub final_url: String,
    pub redirects: Vec<String>,
}

impl From<FetchedContent> for FetchedPayload {
    fn from(content: FetchedContent) -> Self {
        let (body, body_encoding) = encode_body(&content);
        Self {
            status_code: content.status_code,
            body,
            body_encoding,
            bytes: content.body.len(),
            content_type: content.content_type,
            content_kind: content.content_kind,
            truncated: content.truncated,
            final_url: content.final_url.to_string(),
            redirects: content.redirects.iter().map(|u| u.to_string()).collect(),
        }
    }
}

fn encode_body(content: &FetchedContent) -> (String, BodyEncoding) {
    // A truncated text body may end mid-character; keep it readable anyway
    if content.content_kind.is_textual() {
        return (content.text(), BodyEncoding::Utf8);
    }
    match std::str::from_utf8(&content.body) {
        Ok(text) => (text.to_string(), BodyEncoding::Utf8),
        Err(_) => (BASE64.encode(&content.body), BodyEncoding::Base64),
    }
}

pub struct ApiHandlers {
    orchestrator: Arc<FetchOrchestrator>,
}

impl ApiHandlers {
    pub fn new(orchestrator: Arc<FetchOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

impl ApiHandlers {
    pub async fn health() -> Json<ApiResponse<&'static str>> {
        Json(ApiResponse::success("ok"))
    }

    /// Denials answer 403, upstream failures 502 (504 on timeout)
    pub async fn fetch(
        &self,
        Json(request): Json<FetchRequest>,
    ) -> (StatusCode, Json<ApiResponse<FetchedPayload>>) {
        info!(url = %request.url, "Fetch request received");

        let result = self.orchestrator.fetch_url(&request.url).await;
        let message = result.public_message();

        match result {
            FetchResult::Success(content) => {
                (StatusCode::OK, Json(ApiResponse::success(content.into())))
            }
            FetchResult::Denied { .. } => (StatusCode::FORBIDDEN, Json(ApiResponse::error(message))),
            FetchResult::TransportError {
                error: TransportError::RedirectDenied { .. },
            } => (StatusCode::FORBIDDEN, Json(ApiResponse::error(message))),
            FetchResult::TransportError {
                error: TransportError::Timeout,
            } => (StatusCode::GATEWAY_TIMEOUT, Json(ApiResponse::error(message))),
            FetchResult::TransportError { .. } => {
                (StatusCode::BAD_GATEWAY, Json(ApiResponse::error(message)))
            }
        }
    }
}
