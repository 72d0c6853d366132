//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::rewrite::{ColorRewriter, DocumentTransformer, Rgb, TargetColor, TextRewriter, TextRule};

/// Browser identity sent with every outbound request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RestyleConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Outbound fetch settings.
    pub fetch: FetchConfig,

    /// Color and text rewrite rules.
    pub rewrite: RewriteConfig,

    /// Inbound request limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3001").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
        }
    }
}

/// Outbound fetch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Total time allowed for one upstream request, in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// User-Agent header value.
    pub user_agent: String,

    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` from the environment.
    pub system_proxy: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            connect_timeout_secs: 5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            system_proxy: true,
        }
    }
}

/// Rewrite rules applied to fetched documents and stylesheets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Color to find, as `#RRGGBB`.
    pub source_color: Rgb,

    /// Color substituted for `source_color`.
    pub replacement_color: Rgb,

    /// Literal text substitutions, applied in order. Empty by default.
    pub text_rules: Vec<TextRule>,

    /// Append the client-side patch script to documents.
    pub patch_script: bool,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            source_color: Rgb::new(0x00, 0x35, 0x6B),
            replacement_color: Rgb::new(0xA5, 0x1C, 0x30),
            text_rules: Vec::new(),
            patch_script: true,
        }
    }
}

impl RewriteConfig {
    pub fn target(&self) -> TargetColor {
        TargetColor::new(self.source_color, self.replacement_color)
    }

    pub fn color_rewriter(&self) -> Result<ColorRewriter, regex::Error> {
        ColorRewriter::new(self.target())
    }

    pub fn transformer(&self) -> Result<DocumentTransformer, regex::Error> {
        let transformer = DocumentTransformer::new(self.color_rewriter()?, TextRewriter::new(self.text_rules.clone()));
        Ok(transformer.with_patch_script(self.patch_script))
    }
}

/// Inbound request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum inbound body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: RestyleConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:3001");
        assert_eq!(config.rewrite.source_color.hex(), "#00356B");
        assert_eq!(config.rewrite.replacement_color.hex(), "#A51C30");
        assert!(config.rewrite.text_rules.is_empty());
        assert_eq!(config.fetch.timeout_secs, 15);
    }

    #[test]
    fn test_rewrite_section() {
        let config: RestyleConfig = toml::from_str(
            r##"
            [rewrite]
            source_color = "#112233"
            replacement_color = "#aabbcc"
            patch_script = false

            [[rewrite.text_rules]]
            find = "Yale"
            replace = "Fale"
            "##,
        )
        .unwrap();
        assert_eq!(config.rewrite.source_color, Rgb::new(0x11, 0x22, 0x33));
        assert_eq!(config.rewrite.replacement_color.hex(), "#AABBCC");
        assert_eq!(config.rewrite.text_rules, vec![TextRule::new("Yale", "Fale")]);
        assert!(!config.rewrite.patch_script);
    }

    #[test]
    fn test_bad_color_rejected() {
        let err = toml::from_str::<RestyleConfig>("[rewrite]\nsource_color = \"blue\"\n").unwrap_err();
        assert!(err.to_string().contains("expected #RRGGBB"));
    }
}
