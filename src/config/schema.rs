//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the scraper.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the scrape service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ScraperConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Headless browser settings for rendered fetches.
    pub browser: BrowserConfig,

    /// Plain HTTP fetch settings.
    pub static_fetch: StaticFetchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for the scrape pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Supervisor deadline for a whole request in seconds.
    pub request_secs: u64,

    /// Per-navigation timeout for rendered fetches in seconds.
    pub navigation_secs: u64,

    /// Connection establishment timeout for static fetches in seconds.
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 16,
            navigation_secs: 3,
            connect_secs: 5,
        }
    }
}

/// Browser launch and page-settling settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Chrome/Chromium binary; auto-detected when unset.
    pub chrome_path: Option<String>,

    pub headless: bool,

    /// Chrome sandbox. Usually off inside containers.
    pub sandbox: bool,

    pub window_width: u32,
    pub window_height: u32,

    /// Extra command line flags passed to every browser.
    pub extra_args: Vec<String>,

    /// Interval between DOM stability samples in milliseconds.
    pub stable_interval_ms: u64,

    /// Upper bound on the stability wait in milliseconds.
    pub stable_timeout_ms: u64,

    /// Browser is killed after this long without CDP traffic.
    pub idle_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            sandbox: false,
            window_width: 1920,
            window_height: 1080,
            extra_args: vec![
                "--disable-sync".to_string(),
                "--disable-translate".to_string(),
                "--no-default-browser-check".to_string(),
                "--disable-default-apps".to_string(),
            ],
            stable_interval_ms: 500,
            stable_timeout_ms: 5_000,
            idle_timeout_secs: 30,
        }
    }
}

/// Plain HTTP fetch settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFetchConfig {
    /// User-Agent header sent with static fetches.
    pub user_agent: String,
}

impl Default for StaticFetchConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default `tracing` filter; `RUST_LOG` takes precedence.
    pub log_filter: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Address for the Prometheus scrape endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "scrape_n=info,tower_http=info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let config = ScraperConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.timeouts.request_secs, 16);
        assert_eq!(config.timeouts.navigation_secs, 3);
        assert!(config.browser.headless);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ScraperConfig = toml::from_str(
            r#"
            [timeouts]
            request_secs = 20

            [browser]
            chrome_path = "/usr/bin/chromium"
            "#,
        )
        .unwrap();

        assert_eq!(config.timeouts.request_secs, 20);
        assert_eq!(config.timeouts.navigation_secs, 3);
        assert_eq!(config.browser.chrome_path.as_deref(), Some("/usr/bin/chromium"));
        assert_eq!(config.browser.window_width, 1920);
    }
}
