//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, window size > 0)
//! - Check addresses parse before anything binds
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ScraperConfig → Result<(), Vec<ConfigValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ScraperConfig;

/// A single semantic problem in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} is not a socket address: {value}")]
    BadAddress { field: &'static str, value: String },

    #[error("timeouts.navigation_secs ({navigation}) must be below timeouts.request_secs ({request})")]
    NavigationExceedsDeadline { navigation: u64, request: u64 },

    #[error("browser.stable_interval_ms ({interval}) exceeds browser.stable_timeout_ms ({timeout})")]
    StableIntervalTooLong { interval: u64, timeout: u64 },
}

/// Check a parsed config for semantic errors.
pub fn validate_config(config: &ScraperConfig) -> Result<(), Vec<ConfigValidationError>> {
    let mut errors = Vec::new();

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.request_secs", timeouts.request_secs),
        ("timeouts.navigation_secs", timeouts.navigation_secs),
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("browser.window_width", u64::from(config.browser.window_width)),
        ("browser.window_height", u64::from(config.browser.window_height)),
        ("browser.stable_interval_ms", config.browser.stable_interval_ms),
    ] {
        if value == 0 {
            errors.push(ConfigValidationError::Zero { field });
        }
    }

    if timeouts.navigation_secs >= timeouts.request_secs && timeouts.request_secs > 0 {
        errors.push(ConfigValidationError::NavigationExceedsDeadline {
            navigation: timeouts.navigation_secs,
            request: timeouts.request_secs,
        });
    }

    if config.browser.stable_interval_ms > config.browser.stable_timeout_ms {
        errors.push(ConfigValidationError::StableIntervalTooLong {
            interval: config.browser.stable_interval_ms,
            timeout: config.browser.stable_timeout_ms,
        });
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ConfigValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ConfigValidationError::BadAddress {
            field,
            value: value.to_string(),
        });
    }
}
