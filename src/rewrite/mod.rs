//! HTML and CSS rewriting pipeline.
//!
//! # Data Flow
//! ```text
//! fetched HTML
//!     → document.rs (single streaming pass, request-scoped)
//!         → resource.rs (img/script/stylesheet → /proxy-resource)
//!         → color.rs (inline style, <style> bodies)
//!         → text.rs (optional literal substitutions)
//!     → patch.rs (runtime script appended to <body>)
//!     → serialized HTML + title
//!
//! fetched CSS
//!     → color.rs
//! ```

pub mod color;
pub mod document;
pub mod patch;
pub mod resource;
pub mod text;

pub use color::{ColorRewriter, Rgb, TargetColor};
pub use document::{DocumentTransformer, TransformError, Transformed};
pub use resource::{ProxyReference, ResourceRewriter};
pub use text::{TextRewriter, TextRule};
