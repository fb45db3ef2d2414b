// SPDX-License-Identifier: GPL-3.0-only
pub mod models;
pub mod service;

pub use models::FetchResult;
pub use service::{FetchOrchestrator, FetchSettings, DEFAULT_OVERALL_TIMEOUT};
