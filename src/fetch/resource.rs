//! A fetched upstream response.

use std::borrow::Cow;

use axum::body::Bytes;
use url::Url;

/// Coarse classification of a response by its declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Css,
    Other,
}

impl ContentKind {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return Self::Other;
        };
        let content_type = content_type.to_ascii_lowercase();
        if content_type.contains("text/css") {
            Self::Css
        } else if content_type.contains("text/html") || content_type.contains("application/xhtml+xml") {
            Self::Html
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Css => "css",
            Self::Other => "other",
        }
    }
}

/// Upstream response carried as opaque bytes until a consumer needs text.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub url: Url,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchedResource {
    pub fn kind(&self) -> ContentKind {
        ContentKind::from_content_type(self.content_type.as_deref())
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
