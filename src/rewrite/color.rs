//! Color substitution over CSS-bearing text.
//!
//! One matcher serves every CSS surface the proxy touches: fetched
//! stylesheets, inline `style` attributes and `<style>` block bodies.
//! Matching is purely textual and case-insensitive; a source color is
//! recognised as `#RRGGBB`, `rgb(r, g, b)` or `rgba(r, g, b, a)`.

use std::fmt;
use std::str::FromStr;

use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when a color string is not `#RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}: expected #RRGGBB")]
pub struct ColorParseError(pub String);

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Uppercase `#RRGGBB` form.
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// `rgb(r, g, b)` form, spaced the way browsers serialize computed styles.
    pub fn rgb(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_string());
        let digits = s.strip_prefix('#').ok_or_else(err)?;
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| err());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The rewrite rule: every occurrence of `source` becomes `replacement`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetColor {
    pub source: Rgb,
    pub replacement: Rgb,
}

impl TargetColor {
    pub const fn new(source: Rgb, replacement: Rgb) -> Self {
        Self {
            source,
            replacement,
        }
    }
}

/// Compiled matcher for a single [`TargetColor`].
///
/// Build once and share; `rewrite` takes `&self` and holds no state.
#[derive(Debug, Clone)]
pub struct ColorRewriter {
    target: TargetColor,
    hex: Regex,
    rgb: Regex,
    rgba: Regex,
}

impl ColorRewriter {
    pub fn new(target: TargetColor) -> Result<Self, regex::Error> {
        let Rgb { r, g, b } = target.source;
        let hex = Regex::new(&format!(r"(?i){}", regex::escape(&target.source.hex())))?;
        let rgb = Regex::new(&format!(r"(?i)rgb\(\s*{r}\s*,\s*{g}\s*,\s*{b}\s*\)"))?;
        let rgba = Regex::new(&format!(
            r"(?i)rgba\(\s*{r}\s*,\s*{g}\s*,\s*{b}\s*,\s*(?P<alpha>[0-9]*\.?[0-9]+%?)\s*\)"
        ))?;

        Ok(Self {
            target,
            hex,
            rgb,
            rgba,
        })
    }

    pub fn target(&self) -> TargetColor {
        self.target
    }

    /// Replace every hex, `rgb()` and `rgba()` occurrence of the source color.
    ///
    /// The alpha component of `rgba()` matches is carried over verbatim.
    pub fn rewrite(&self, text: &str) -> String {
        let replacement = self.target.replacement;
        let Rgb { r, g, b } = replacement;

        let text = self.hex.replace_all(text, replacement.hex().as_str());
        let text = self.rgb.replace_all(&text, replacement.rgb().as_str());
        let text = self.rgba.replace_all(&text, |caps: &Captures<'_>| {
            format!("rgba({r}, {g}, {b}, {})", &caps["alpha"])
        });
        text.into_owned()
    }

    /// Whether `text` holds the source color in any recognised form.
    pub fn matches(&self, text: &str) -> bool {
        self.hex.is_match(text) || self.rgb.is_match(text) || self.rgba.is_match(text)
    }
}
