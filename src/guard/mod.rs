// SPDX-License-Identifier: GPL-3.0-only
pub mod classifier;
pub mod ssrf;
pub mod url_validator;
pub mod verdict;

pub use classifier::{classify, AddressVerdict, BlockedRange};
pub use ssrf::{GuardPolicy, SsrfGuard};
pub use url_validator::{validate_url, ParsedUrl, UrlValidator, ValidationError};
pub use verdict::{DenyReason, FetchVerdict, ValidatedTarget, GENERIC_DENIAL};
