// SPDX-License-Identifier: GPL-3.0-only
pub mod handlers;
pub mod http;

pub use handlers::{ApiHandlers, ApiResponse, BodyEncoding, FetchRequest, FetchedPayload};
pub use http::HttpServer;
