// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderName, CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy as RedirectPolicy;
use reqwest::Client;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};

use crate::fetcher::traits::{Transport, TransportError, TransportRequest, TransportResponse};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_USER_AGENT: &str = concat!("fetchguard/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed transport
///
/// Redirects are never followed here and proxies are ignored, so the only
/// peers ever contacted are the pinned addresses of the request.
pub struct HttpClient {
    connect_timeout: Duration,
    request_timeout: Duration,
    user_agent: String,
}

impl HttpClient {
    pub fn new(connect_timeout: Duration, request_timeout: Duration, user_agent: &str) -> Self {
        Self {
            connect_timeout,
            request_timeout,
            user_agent: user_agent.to_string(),
        }
    }

    // Address overrides are per client, so every request gets its own. This
    // costs a fresh TLS connector and connection pool per hop; a shared client
    // would also share its pool, and a pooled connection keyed by host name
    // could outlive the addresses validated for a later request.
    fn build_client(&self, request: &TransportRequest) -> Result<Client, TransportError> {
        let mut builder = Client::builder()
            .redirect(RedirectPolicy::none())
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .user_agent(&self.user_agent)
            .no_proxy();

        if request.host.parse::<IpAddr>().is_err() && !request.pinned.is_empty() {
            builder = builder.resolve_to_addrs(&request.host, &request.pinned);
        }

        builder
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT)
    }
}

fn header_value(response: &reqwest::Response, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Location decoded as UTF-8; a redirect whose Location is not UTF-8 is invalid
fn location_header(response: &reqwest::Response) -> Result<Option<String>, TransportError> {
    let Some(value) = response.headers().get(LOCATION) else {
        return Ok(None);
    };

    match std::str::from_utf8(value.as_bytes()) {
        Ok(location) => Ok(Some(location.to_string())),
        Err(_) if response.status().is_redirection() => Err(TransportError::InvalidRedirect(
            "Location header is not valid UTF-8".to_string(),
        )),
        Err(_) => Ok(None),
    }
}

fn map_send_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::ConnectFailed(e.to_string())
    }
}

fn map_body_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Body(e.to_string())
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let client = self.build_client(&request)?;

        debug!(url = %request.url, pinned = request.pinned.len(), "Sending request");

        let response = client
            .get(request.url.clone())
            .send()
            .await
            .map_err(|e| {
                warn!(url = %request.url, error = %e, "Request failed");
                map_send_error(e)
            })?;

        let location = location_header(&response)?;
        let content_type = header_value(&response, CONTENT_TYPE);

        Ok(TransportResponse {
            status: response.status().as_u16(),
            location,
            content_type,
            content_length: response.content_length(),
            body: response.bytes_stream().map(|chunk| chunk.map_err(map_body_error)).boxed(),
        })
    }
}
