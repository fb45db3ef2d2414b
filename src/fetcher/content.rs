// SPDX-License-Identifier: GPL-3.0-only
use serde::Serialize;

/// Closed set of content kinds a fetch can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Html,
    Xml,
    Json,
    Text,
    Image,
    Other,
}

impl ContentKind {
    /// Map a Content-Type header value, ignoring parameters such as charset
    pub fn from_content_type(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return ContentKind::Other;
        };

        let essence = value
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "text/html" | "application/xhtml+xml" => ContentKind::Html,
            "application/json" => ContentKind::Json,
            "application/xml" | "text/xml" => ContentKind::Xml,
            e if e.ends_with("+json") => ContentKind::Json,
            e if e.ends_with("+xml") => ContentKind::Xml,
            e if e.starts_with("text/") => ContentKind::Text,
            e if e.starts_with("image/") => ContentKind::Image,
            _ => ContentKind::Other,
        }
    }

    /// Whether bodies of this kind are meant to be read as text
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            ContentKind::Html | ContentKind::Xml | ContentKind::Json | ContentKind::Text
        )
    }
}
