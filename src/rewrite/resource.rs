//! Resource reference rewriting.
//!
//! Images, stylesheet links and scripts are pointed at the same-origin
//! `/proxy-resource` endpoint so the client loads every asset through us.
//! The rewriter also carries the [`ColorRewriter`] used for inline `style`
//! attributes and `<style>` bodies met during the same document walk.

use lol_html::html_content::Element;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::rewrite::color::ColorRewriter;

/// Path of the sub-resource endpoint.
pub const PROXY_RESOURCE_PATH: &str = "/proxy-resource";

/// Characters `encodeURIComponent` leaves alone.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// CSS selector for every element carrying a proxied reference.
pub const RESOURCE_SELECTOR: &str = r#"img, script, link[rel~="stylesheet"]"#;

/// Elements whose reference is routed through the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Image,
    Script,
    Stylesheet,
}

impl ResourceKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "img" => Some(Self::Image),
            "script" => Some(Self::Script),
            "link" => Some(Self::Stylesheet),
            _ => None,
        }
    }

    /// Attributes read, in order of preference.
    pub fn source_attributes(&self) -> &'static [&'static str] {
        match self {
            Self::Image | Self::Script => &["src"],
            Self::Stylesheet => &["src", "href"],
        }
    }

    /// Attribute the proxy reference is written to.
    pub fn target_attribute(&self) -> &'static str {
        match self {
            Self::Image | Self::Script => "src",
            Self::Stylesheet => "href",
        }
    }
}

/// A same-origin `/proxy-resource?url=...` reference to an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyReference(String);

impl ProxyReference {
    pub fn new(absolute: &Url) -> Self {
        let encoded = utf8_percent_encode(absolute.as_str(), COMPONENT);
        Self(format!("{PROXY_RESOURCE_PATH}?url={encoded}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Scheme + host (+ port) of `url`, with an empty path.
///
/// Fails for URLs with an opaque origin such as `data:`.
pub fn base_origin(url: &Url) -> Result<Url, url::ParseError> {
    Url::parse(&url.origin().ascii_serialization())
}

/// Outcome of rewriting one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewritten {
    /// The reference was replaced with a proxy reference.
    Proxied(ProxyReference),
    /// No reference attribute, or a scheme that is not proxied.
    Skipped,
    /// The reference could not be resolved against the base origin.
    Unresolvable(String),
}

#[derive(Debug, Clone)]
pub struct ResourceRewriter {
    base: Url,
    colors: ColorRewriter,
}

impl ResourceRewriter {
    pub fn new(base: Url, colors: ColorRewriter) -> Self {
        Self { base, colors }
    }

    /// Resolve `reference` against the base origin and wrap it.
    ///
    /// `Ok(None)` for references that must not be proxied: non-http(s)
    /// schemes and references already pointing at the proxy.
    pub fn proxy_reference(&self, reference: &str) -> Result<Option<ProxyReference>, url::ParseError> {
        let reference = reference.trim();
        if reference.starts_with(PROXY_RESOURCE_PATH) {
            return Ok(None);
        }
        let absolute = self.base.join(reference)?;
        match absolute.scheme() {
            "http" | "https" => Ok(Some(ProxyReference::new(&absolute))),
            _ => Ok(None),
        }
    }

    /// Rewrite the reference attribute of an image, script or stylesheet link.
    ///
    /// Attribute values arrive as source text, so character references
    /// (`&amp;` and friends) are decoded before resolution.
    pub fn rewrite_element(&self, el: &mut Element<'_, '_>) -> Rewritten {
        let Some(kind) = ResourceKind::from_tag(&el.tag_name()) else {
            return Rewritten::Skipped;
        };
        let Some(reference) = kind
            .source_attributes()
            .iter()
            .find_map(|name| el.get_attribute(name))
            .filter(|value| !value.trim().is_empty())
            .map(|value| html_escape::decode_html_entities(&value).into_owned())
        else {
            return Rewritten::Skipped;
        };

        match self.proxy_reference(&reference) {
            Ok(Some(proxied)) => match el.set_attribute(kind.target_attribute(), proxied.as_str()) {
                Ok(()) => Rewritten::Proxied(proxied),
                Err(e) => {
                    tracing::warn!(reference = %reference, error = %e, "Could not write proxy reference");
                    Rewritten::Unresolvable(reference)
                }
            },
            Ok(None) => {
                tracing::debug!(reference = %reference, "Reference left unproxied");
                Rewritten::Skipped
            }
            Err(e) => {
                tracing::warn!(
                    reference = %reference,
                    base = %self.base,
                    error = %e,
                    "Skipping unresolvable resource reference"
                );
                Rewritten::Unresolvable(reference)
            }
        }
    }

    /// Rewrite colors in a non-empty inline `style` attribute.
    pub fn rewrite_inline_style(&self, el: &mut Element<'_, '_>) {
        let Some(style) = el.get_attribute("style").filter(|s| !s.is_empty()) else {
            return;
        };
        let rewritten = self.colors.rewrite(&style);
        if rewritten != style {
            if let Err(e) = el.set_attribute("style", &rewritten) {
                tracing::warn!(error = %e, "Could not rewrite inline style");
            }
        }
    }

    /// Rewrite colors in the body of a `<style>` element.
    pub fn rewrite_style_block(&self, css: &str) -> String {
        self.colors.rewrite(css)
    }
}
