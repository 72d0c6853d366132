//! Restyle proxy: fetches a remote page, routes its assets through a
//! same-origin proxy, recolors CSS and returns the rewritten document.

pub mod config;
pub mod fetch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;

pub use config::RestyleConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
