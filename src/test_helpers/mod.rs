// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, StreamExt};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::Config;
use crate::fetcher::{BodyStream, Transport, TransportError, TransportRequest, TransportResponse};
use crate::guard::GuardPolicy;
use crate::orchestrator::FetchSettings;
use crate::resolver::{HostResolver, ResolutionError, ResolvedAddress, StaticResolver};

static FILLER: [u8; 8192] = [b'x'; 8192];

/// Socket address a mockito server listens on
pub fn mock_server_addr(server: &mockito::ServerGuard) -> SocketAddr {
    server
        .host_with_port()
        .parse()
        .expect("mockito address should be a socket address")
}

/// Resolver mapping `origin.test` to the mock server
pub fn origin_resolver(server: &mockito::ServerGuard) -> Arc<StaticResolver> {
    let ip = mock_server_addr(server).ip().to_string();
    Arc::new(StaticResolver::new().with_host("origin.test", &[ip.as_str()]))
}

/// URL on `origin.test` served by the mock server
pub fn origin_url(server: &mockito::ServerGuard, path: &str) -> String {
    format!("http://origin.test:{}{}", mock_server_addr(server).port(), path)
}

/// Fetch settings that let the loopback mock server through the guard
pub fn create_test_settings() -> FetchSettings {
    FetchSettings {
        guard: GuardPolicy {
            exempt_ranges: vec!["127.0.0.1/32".parse().expect("valid CIDR")],
            ..GuardPolicy::default()
        },
        overall_timeout: Duration::from_secs(5),
        ..FetchSettings::default()
    }
}

/// Create a test configuration
pub fn create_test_config() -> Config {
    Config {
        listen_addr: "127.0.0.1:0".parse().expect("valid socket address"), // Use port 0 to auto-assign
        log_level: "error".to_string(), // Reduce log noise in tests
        exempt_cidrs: vec!["127.0.0.1/32".to_string()],
        overall_timeout_secs: 5,
        ..Config::default()
    }
}

#[derive(Debug, Clone)]
enum CannedBody {
    Chunks(Vec<Bytes>),
    Endless,
}

/// A response replayed by [`ScriptedTransport`]
#[derive(Debug, Clone)]
pub struct CannedResponse {
    status: u16,
    location: Option<String>,
    content_type: Option<String>,
    declared_length: Option<u64>,
    body: CannedBody,
}

impl CannedResponse {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            location: None,
            content_type: None,
            declared_length: None,
            body: CannedBody::Chunks(Vec::new()),
        }
    }

    pub fn ok(body: &str) -> Self {
        Self::chunks(&[body.as_bytes()])
    }

    pub fn chunks(chunks: &[&[u8]]) -> Self {
        Self {
            body: CannedBody::Chunks(chunks.iter().map(|c| Bytes::copy_from_slice(c)).collect()),
            ..Self::status(200)
        }
    }

    pub fn redirect(location: &str) -> Self {
        Self {
            location: Some(location.to_string()),
            ..Self::status(302)
        }
    }

    /// A 200 whose body never ends
    pub fn endless() -> Self {
        Self {
            body: CannedBody::Endless,
            ..Self::status(200)
        }
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn with_declared_length(mut self, length: u64) -> Self {
        self.declared_length = Some(length);
        self
    }

    fn to_response(&self) -> TransportResponse {
        let body: BodyStream = match &self.body {
            CannedBody::Chunks(chunks) => {
                stream::iter(chunks.clone().into_iter().map(Ok)).boxed()
            }
            CannedBody::Endless => stream::repeat(Ok(Bytes::from_static(&FILLER))).boxed(),
        };

        let content_length = match &self.body {
            CannedBody::Chunks(chunks) => self
                .declared_length
                .or(Some(chunks.iter().map(|c| c.len() as u64).sum())),
            CannedBody::Endless => self.declared_length,
        };

        TransportResponse {
            status: self.status,
            location: self.location.clone(),
            content_type: self.content_type.clone(),
            content_length,
            body,
        }
    }
}

/// In-memory transport answering from a URL table and recording every request
///
/// Unknown URLs fail with `ConnectFailed`.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: HashMap<String, CannedResponse>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, response: CannedResponse) -> Self {
        self.routes.insert(url.to_string(), response);
        self
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let response = self.routes.get(request.url.as_str()).map(CannedResponse::to_response);
        let url = request.url.to_string();
        self.requests.lock().unwrap().push(request);
        response.ok_or_else(|| TransportError::ConnectFailed(format!("no route for {}", url)))
    }
}

/// Resolver that answers every lookup with the same error after a delay
pub struct FailingResolver {
    error: ResolutionError,
    delay: Duration,
    lookups: AtomicUsize,
}

impl FailingResolver {
    /// Stalls for `delay`, then reports that resolution timed out after it
    pub fn timing_out(delay: Duration) -> Self {
        Self {
            error: ResolutionError::Timeout {
                host: String::new(),
                timeout: delay,
            },
            delay,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookup_failure(message: &str) -> Self {
        Self {
            error: ResolutionError::Lookup {
                host: String::new(),
                message: message.to_string(),
            },
            delay: Duration::ZERO,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostResolver for FailingResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<ResolvedAddress>, ResolutionError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Err(match &self.error {
            ResolutionError::Timeout { timeout, .. } => ResolutionError::Timeout {
                host: host.to_string(),
                timeout: *timeout,
            },
            ResolutionError::Lookup { message, .. } => ResolutionError::Lookup {
                host: host.to_string(),
                message: message.clone(),
            },
            ResolutionError::NoAddressesFound(_) => ResolutionError::NoAddressesFound(host.to_string()),
        })
    }
}
