//! Request parameters: the raw form fields and the validated request.
//!
//! # Validation order
//! Rules are checked in a fixed order and the first failure wins:
//! url, proxy, js_render, additional_delay. A later field is never
//! reported while an earlier one is invalid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scrape::error::ValidationError;
use crate::scrape::proxy::ProxyCredentials;

/// Lower bound for `additional_delay`, inclusive.
pub const MIN_ADDITIONAL_DELAY_MS: i64 = 1_000;

/// Upper bound for `additional_delay`, inclusive.
pub const MAX_ADDITIONAL_DELAY_MS: i64 = 10_000;

/// The four string fields as received from the transport.
///
/// Missing fields deserialize to empty strings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrapeParams {
    pub url: String,
    pub proxy: String,
    pub js_render: String,
    pub additional_delay: String,
}

/// A validated, immutable scrape request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    pub url: String,
    pub proxy: ProxyCredentials,
    pub render: bool,
    pub additional_delay: Duration,
}

impl ScrapeRequest {
    /// Validate raw parameters, short-circuiting on the first broken rule.
    pub fn validate(params: &ScrapeParams) -> Result<Self, ValidationError> {
        let url = validate_url(&params.url)?;
        let proxy = validate_proxy(&params.proxy)?;
        let render = validate_render_flag(&params.js_render)?;
        let additional_delay = validate_delay(&params.additional_delay)?;

        Ok(Self {
            url: url.to_string(),
            proxy,
            render,
            additional_delay,
        })
    }
}

fn validate_url(url: &str) -> Result<&str, ValidationError> {
    if url.is_empty() {
        return Err(ValidationError::UrlEmpty);
    }
    if !url.starts_with("http") {
        return Err(ValidationError::UrlScheme);
    }
    Ok(url)
}

fn validate_proxy(proxy: &str) -> Result<ProxyCredentials, ValidationError> {
    if proxy.is_empty() {
        return Err(ValidationError::ProxyEmpty);
    }
    ProxyCredentials::parse(proxy).map_err(ValidationError::ProxyFormat)
}

fn validate_render_flag(flag: &str) -> Result<bool, ValidationError> {
    match flag {
        "" => Err(ValidationError::RenderFlagEmpty),
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ValidationError::RenderFlagInvalid),
    }
}

fn validate_delay(delay: &str) -> Result<Duration, ValidationError> {
    if delay.is_empty() {
        return Err(ValidationError::DelayEmpty);
    }
    let millis: i64 = delay
        .parse()
        .map_err(|_| ValidationError::DelayNotInteger)?;
    if !(MIN_ADDITIONAL_DELAY_MS..=MAX_ADDITIONAL_DELAY_MS).contains(&millis) {
        return Err(ValidationError::DelayOutOfRange(millis));
    }
    // In range, so the cast is lossless.
    Ok(Duration::from_millis(millis as u64))
}
