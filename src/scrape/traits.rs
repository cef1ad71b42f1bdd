use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::scrape::error::ScrapeError;
use crate::scrape::proxy::ProxyCredentials;

/// Plain HTTP GET strategy.
#[async_trait::async_trait]
pub trait StaticFetch: Send + Sync {
    /// Fetch `url`, routed through `proxy_endpoint` when one is given.
    async fn fetch(
        &self,
        url: &str,
        proxy_endpoint: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<String, ScrapeError>;
}

/// Headless-browser strategy.
#[async_trait::async_trait]
pub trait RenderedFetch: Send + Sync {
    /// Navigate to `url` through the authenticated proxy and return the
    /// live DOM after the page settles and `additional_delay` passes.
    async fn render(
        &self,
        url: &str,
        proxy: &ProxyCredentials,
        additional_delay: Duration,
        cancel: CancellationToken,
    ) -> Result<String, ScrapeError>;
}
