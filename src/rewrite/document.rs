//! Whole-document transformation.
//!
//! A single streaming pass over the fetched HTML:
//! - resource references are routed through `/proxy-resource`
//! - inline `style` attributes and `<style>` bodies get color rewriting
//! - ordinary text gets the configured literal substitutions
//! - the first `<title>` is captured
//! - the patch script is appended to `<body>` (or the document end)
//!
//! Every call owns its rewriter state; nothing is shared between requests.

use std::cell::{Cell, RefCell};

use lol_html::errors::RewritingError;
use lol_html::html_content::{ContentType, TextType};
use lol_html::{doc_text, element, end, rewrite_str, text, Settings};
use serde::Serialize;
use url::Url;

use crate::rewrite::color::ColorRewriter;
use crate::rewrite::patch;
use crate::rewrite::resource::{base_origin, ResourceRewriter, Rewritten, RESOURCE_SELECTOR};
use crate::rewrite::text::TextRewriter;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("cannot derive base origin from {url}")]
    BaseOrigin {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to rewrite document: {0}")]
    Rewrite(#[from] RewritingError),
}

/// Serialized output of [`DocumentTransformer::transform`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transformed {
    pub content: String,
    pub title: String,
}

/// Which rewrite a buffered text node receives.
#[derive(Clone, Copy)]
enum Surface {
    StyleBlock,
    Text,
}

#[derive(Debug, Clone)]
pub struct DocumentTransformer {
    colors: ColorRewriter,
    text: TextRewriter,
    patch_script: bool,
}

impl DocumentTransformer {
    pub fn new(colors: ColorRewriter, text: TextRewriter) -> Self {
        Self {
            colors,
            text,
            patch_script: true,
        }
    }

    /// Toggle appending the client-side patch script.
    pub fn with_patch_script(mut self, enabled: bool) -> Self {
        self.patch_script = enabled;
        self
    }

    pub fn colors(&self) -> &ColorRewriter {
        &self.colors
    }

    pub fn transform(&self, html: &str, target_url: &Url) -> Result<Transformed, TransformError> {
        let base = base_origin(target_url).map_err(|source| TransformError::BaseOrigin {
            url: target_url.to_string(),
            source,
        })?;
        let resources = ResourceRewriter::new(base, self.colors.clone());
        let script = self
            .patch_script
            .then(|| patch::script_element(self.colors.target()));
        let closes_body = html
            .as_bytes()
            .windows(b"</body".len())
            .any(|w| w.eq_ignore_ascii_case(b"</body"));

        let raw_title = RefCell::new(String::new());
        let titles = Cell::new(0usize);
        let pending = RefCell::new(String::new());
        let script_placed = Cell::new(false);
        let proxied = Cell::new(0usize);
        let skipped = Cell::new(0usize);

        let settings = Settings {
            element_content_handlers: vec![
                element!(RESOURCE_SELECTOR, |el| {
                    match resources.rewrite_element(el) {
                        Rewritten::Proxied(reference) => {
                            tracing::trace!(reference = reference.as_str(), "Resource proxied");
                            proxied.set(proxied.get() + 1);
                        }
                        Rewritten::Unresolvable(_) => skipped.set(skipped.get() + 1),
                        Rewritten::Skipped => {}
                    }
                    Ok(())
                }),
                element!("[style]", |el| {
                    resources.rewrite_inline_style(el);
                    Ok(())
                }),
                element!("title", |_| {
                    titles.set(titles.get() + 1);
                    Ok(())
                }),
                text!("title", |t| {
                    if titles.get() == 1 {
                        raw_title.borrow_mut().push_str(t.as_str());
                    }
                    Ok(())
                }),
                element!("body", |el| {
                    if let (Some(script), true, false) = (&script, closes_body, script_placed.get()) {
                        el.append(script, ContentType::Html);
                        script_placed.set(true);
                    }
                    Ok(())
                }),
            ],
            document_content_handlers: vec![
                doc_text!(|t| {
                    let surface = match t.text_type() {
                        TextType::RawText => Surface::StyleBlock,
                        TextType::Data | TextType::RCData if !self.text.is_empty() => Surface::Text,
                        _ => return Ok(()),
                    };

                    pending.borrow_mut().push_str(t.as_str());
                    if !t.last_in_text_node() {
                        t.remove();
                        return Ok(());
                    }

                    let original = std::mem::take(&mut *pending.borrow_mut());
                    let rewritten = match surface {
                        Surface::StyleBlock => resources.rewrite_style_block(&original),
                        Surface::Text => self.text.rewrite_markup(&original),
                    };
                    t.replace(&rewritten, ContentType::Html);
                    Ok(())
                }),
                end!(|end| {
                    if let (Some(script), false) = (&script, script_placed.get()) {
                        end.append(script, ContentType::Html);
                        script_placed.set(true);
                    }
                    Ok(())
                }),
            ],
            ..Settings::default()
        };

        let content = rewrite_str(html, settings)?;
        let raw_title = raw_title.into_inner();
        let title = self.text.rewrite(&html_escape::decode_html_entities(&raw_title));

        tracing::debug!(
            url = %target_url,
            proxied = proxied.get(),
            skipped = skipped.get(),
            title = %title,
            "Document transformed"
        );

        Ok(Transformed { content, title })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::color::{Rgb, TargetColor};
    use crate::rewrite::text::TextRule;

    fn transformer(rules: Vec<TextRule>) -> DocumentTransformer {
        let colors = ColorRewriter::new(TargetColor::new(Rgb::new(0, 53, 107), Rgb::new(165, 28, 48))).unwrap();
        DocumentTransformer::new(colors, TextRewriter::new(rules))
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_text_substitution_scenario() {
        let html = r#"<html><head><title>Yale University</title></head><body><h1>Welcome to Yale</h1><a href="https://yale.edu">link</a></body></html>"#;
        let out = transformer(vec![TextRule::new("Yale", "Fale")])
            .transform(html, &url("https://example.com/"))
            .unwrap();

        assert_eq!(out.title, "Fale University");
        assert!(out.content.contains("<title>Fale University</title>"));
        assert!(out.content.contains("<h1>Welcome to Fale</h1>"));
        assert!(out.content.contains(r#"<a href="https://yale.edu">link</a>"#));
    }

    #[test]
    fn test_resources_proxied() {
        let html = r#"<html><head>
<link rel="stylesheet" href="/css/site.css">
<link rel="icon" href="/favicon.ico">
<script src="https://cdn.example.org/app.js"></script>
</head><body><img src="/a.png"><img alt="no source"></body></html>"#;
        let out = transformer(vec![])
            .transform(html, &url("https://example.com/some/page.html"))
            .unwrap();

        assert!(out.content.contains(r#"href="/proxy-resource?url=https%3A%2F%2Fexample.com%2Fcss%2Fsite.css""#));
        assert!(out.content.contains(r#"<link rel="icon" href="/favicon.ico">"#));
        assert!(out.content.contains(r#"src="/proxy-resource?url=https%3A%2F%2Fcdn.example.org%2Fapp.js""#));
        assert!(out.content.contains(r#"<img src="/proxy-resource?url=https%3A%2F%2Fexample.com%2Fa.png">"#));
        assert!(out.content.contains(r#"<img alt="no source">"#));
    }

    #[test]
    fn test_entity_encoded_reference() {
        let out = transformer(vec![])
            .transform(r#"<img src="/img?a=1&amp;b=2">"#, &url("https://example.com/"))
            .unwrap();
        assert!(
            out.content.contains(r#"src="/proxy-resource?url=https%3A%2F%2Fexample.com%2Fimg%3Fa%3D1%26b%3D2""#),
            "{}",
            out.content
        );
    }

    #[test]
    fn test_bad_reference_does_not_abort() {
        let html = r#"<body><img src="http://[::1"><img src="/ok.png"></body>"#;
        let out = transformer(vec![]).transform(html, &url("https://example.com/")).unwrap();
        assert!(out.content.contains(r#"<img src="http://[::1">"#));
        assert!(out.content.contains("/proxy-resource?url=https%3A%2F%2Fexample.com%2Fok.png"));
    }

    #[test]
    fn test_inline_and_embedded_styles() {
        let html = r#"<html><head><style>h1 { color: #00356b; background: rgba(0, 53, 107, .5) }</style></head>
<body><div style="color: rgb(0, 53, 107); border-color: #123456">x</div></body></html>"#;
        let out = transformer(vec![]).transform(html, &url("https://example.com/")).unwrap();

        assert!(out.content.contains("h1 { color: #A51C30; background: rgba(165, 28, 48, .5) }"));
        assert!(out.content.contains(r#"style="color: rgb(165, 28, 48); border-color: #123456""#));
    }

    #[test]
    fn test_scripts_and_styles_skip_text_rules() {
        let html = r#"<html><head><style>.Yale { color: red }</style></head><body><script>var Yale = 1;</script><p>Yale</p></body></html>"#;
        let out = transformer(vec![TextRule::new("Yale", "Fale")])
            .transform(html, &url("https://example.com/"))
            .unwrap();
        assert!(out.content.contains(".Yale { color: red }"));
        assert!(out.content.contains("var Yale = 1;"));
        assert!(out.content.contains("<p>Fale</p>"));
    }

    #[test]
    fn test_patch_script_appended_to_body() {
        let html = "<html><head><title>t</title></head><body><p>hi</p></body></html>";
        let out = transformer(vec![]).transform(html, &url("https://example.com/")).unwrap();
        let script_at = out.content.find("<script>").unwrap();
        let body_end = out.content.find("</body>").unwrap();
        assert!(script_at < body_end);
        assert!(out.content.contains("MutationObserver"));
        assert_eq!(out.content.matches("<script>").count(), 1);
    }

    #[test]
    fn test_patch_script_without_body() {
        let out = transformer(vec![]).transform("<p>fragment</p>", &url("https://example.com/")).unwrap();
        assert!(out.content.starts_with("<p>fragment</p>"));
        assert!(out.content.trim_end().ends_with("</script>"));
    }

    #[test]
    fn test_patch_script_disabled() {
        let out = transformer(vec![])
            .with_patch_script(false)
            .transform("<body><p>x</p></body>", &url("https://example.com/"))
            .unwrap();
        assert_eq!(out.content, "<body><p>x</p></body>");
    }

    #[test]
    fn test_missing_title_is_empty() {
        let out = transformer(vec![]).transform("<body></body>", &url("https://example.com/")).unwrap();
        assert_eq!(out.title, "");
    }

    #[test]
    fn test_title_entities_decoded() {
        let html = "<head><title>Q&amp;A &mdash; Help</title></head><body></body>";
        let out = transformer(vec![]).transform(html, &url("https://example.com/")).unwrap();
        assert_eq!(out.title, "Q&A \u{2014} Help");
        assert!(out.content.contains("<title>Q&amp;A &mdash; Help</title>"));
    }

    #[test]
    fn test_text_rule_replacement_is_not_markup() {
        let html = "<html><head><title>Yale</title></head><body><p>Yale</p></body></html>";
        let out = transformer(vec![TextRule::new("Yale", "<b>Fale</b> & co")])
            .with_patch_script(false)
            .transform(html, &url("https://example.com/"))
            .unwrap();
        assert!(out.content.contains("<p>&lt;b&gt;Fale&lt;/b&gt; &amp; co</p>"), "{}", out.content);
        assert!(!out.content.contains("<b>"));
        assert_eq!(out.title, "<b>Fale</b> & co");
    }

    #[test]
    fn test_body_close_tag_any_case() {
        let out = transformer(vec![])
            .transform("<BODY><p>x</p></BODY>", &url("https://example.com/"))
            .unwrap();
        let script_at = out.content.find("<script>").unwrap();
        assert!(script_at < out.content.find("</BODY>").unwrap());
        assert_eq!(out.content.matches("<script>").count(), 1);
    }

    #[test]
    fn test_first_title_only() {
        let html = "<head><title>Page</title></head><body><svg><title>Icon</title></svg></body>";
        let out = transformer(vec![]).transform(html, &url("https://example.com/")).unwrap();
        assert_eq!(out.title, "Page");
    }

    #[test]
    fn test_title_stable_across_passes() {
        let html = "<html><head><title>Plain Page</title></head><body><p>Nothing to recolor</p></body></html>";
        let t = transformer(vec![]).with_patch_script(false);
        let once = t.transform(html, &url("https://example.com/")).unwrap();
        let twice = t.transform(&once.content, &url("https://example.com/")).unwrap();
        assert_eq!(once.title, twice.title);
        assert_eq!(once.content, twice.content);
    }

    #[test]
    fn test_opaque_origin_rejected() {
        let err = transformer(vec![])
            .transform("<p></p>", &url("data:text/html,hi"))
            .unwrap_err();
        assert!(matches!(err, TransformError::BaseOrigin { .. }));
    }
}
