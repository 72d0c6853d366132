//! Literal substitution over document text content.

use serde::{Deserialize, Serialize};

/// A single case-sensitive `find` -> `replace` rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TextRule {
    pub find: String,
    pub replace: String,
}

impl TextRule {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
        }
    }
}

/// Ordered set of [`TextRule`]s. Empty by default, in which case text passes
/// through untouched.
#[derive(Debug, Clone, Default)]
pub struct TextRewriter {
    rules: Vec<TextRule>,
    /// The same rules with both sides HTML-escaped, for source text.
    markup: Vec<TextRule>,
}

impl TextRewriter {
    pub fn new(rules: Vec<TextRule>) -> Self {
        let rules: Vec<TextRule> = rules.into_iter().filter(|r| !r.find.is_empty()).collect();
        let markup = rules
            .iter()
            .map(|r| TextRule::new(html_escape::encode_text(&r.find), html_escape::encode_text(&r.replace)))
            .collect();
        Self { rules, markup }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply the rules to decoded text.
    pub fn rewrite(&self, text: &str) -> String {
        apply(&self.rules, text)
    }

    /// Apply the rules to escaped document text; replacements never
    /// introduce markup.
    pub fn rewrite_markup(&self, source: &str) -> String {
        apply(&self.markup, source)
    }
}

fn apply(rules: &[TextRule], text: &str) -> String {
    rules
        .iter()
        .fold(text.to_string(), |acc, rule| acc.replace(&rule.find, &rule.replace))
}
