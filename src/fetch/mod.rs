//! Outbound fetching subsystem.
//!
//! # Data Flow
//! ```text
//! /fetch or /proxy-resource handler
//!     → gateway.rs (validate URL, GET with fixed User-Agent, bounded timeout)
//!     → resource.rs (FetchedResource: url, content type, opaque bytes)
//!     → handler decides whether the body is HTML, CSS or pass-through
//! ```

pub mod gateway;
pub mod resource;

pub use gateway::{FetchError, FetchGateway};
pub use resource::{ContentKind, FetchedResource};
