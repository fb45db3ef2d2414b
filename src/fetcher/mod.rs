// SPDX-License-Identifier: GPL-3.0-only
pub mod traits;
pub mod client;
pub mod content;
pub mod bounded;

pub use traits::{BodyStream, Transport, TransportError, TransportRequest, TransportResponse};
pub use client::HttpClient;
pub use content::ContentKind;
pub use bounded::{BoundedFetcher, FetchPolicy, FetchedContent, OversizePolicy, MAX_REDIRECT_CAP};
