//! Client-side patch script.
//!
//! Static rewriting cannot see colors that come from the cascade or from
//! page scripts. The generated script re-checks computed styles in the
//! browser after load and on every DOM mutation batch.

use crate::rewrite::color::TargetColor;

const TEMPLATE: &str = include_str!("patch.js");

/// Render the patch script body for `target`.
pub fn generate(target: TargetColor) -> String {
    TEMPLATE
        .replace("__SOURCE_HEX__", &target.source.hex())
        .replace("__SOURCE_RGB__", &target.source.rgb())
        .replace("__REPLACEMENT_HEX__", &target.replacement.hex())
}

/// The patch script wrapped in a `<script>` element.
pub fn script_element(target: TargetColor) -> String {
    format!("<script>\n{}</script>", generate(target))
}
