//! Validation followed by dispatch to one of the two fetch strategies.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::ScraperConfig;
use crate::scrape::error::ScrapeError;
use crate::scrape::rendered::RenderedFetcher;
use crate::scrape::request::{ScrapeParams, ScrapeRequest};
use crate::scrape::static_fetch::StaticFetcher;
use crate::scrape::traits::{RenderedFetch, StaticFetch};

/// Successful scrape payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeResult {
    pub html: String,
    #[serde(rename = "url")]
    pub source_url: String,
}

/// Runs one request through validation and the selected fetch strategy.
#[derive(Clone)]
pub struct ScrapeExecutor {
    static_fetcher: Arc<dyn StaticFetch>,
    rendered_fetcher: Arc<dyn RenderedFetch>,
}

impl ScrapeExecutor {
    pub fn new(
        static_fetcher: Arc<dyn StaticFetch>,
        rendered_fetcher: Arc<dyn RenderedFetch>,
    ) -> Self {
        Self {
            static_fetcher,
            rendered_fetcher,
        }
    }

    /// Executor backed by the real HTTP client and browser.
    pub fn from_config(config: &ScraperConfig) -> Self {
        let static_fetcher = StaticFetcher::new(
            &config.static_fetch,
            Duration::from_secs(config.timeouts.connect_secs),
        );
        let rendered_fetcher = RenderedFetcher::new(
            config.browser.clone(),
            Duration::from_secs(config.timeouts.navigation_secs),
        );
        Self::new(Arc::new(static_fetcher), Arc::new(rendered_fetcher))
    }

    /// Validate `params` and fetch. Invalid input never reaches a fetcher.
    pub async fn execute(
        &self,
        params: &ScrapeParams,
        cancel: CancellationToken,
    ) -> Result<ScrapeResult, ScrapeError> {
        let request = ScrapeRequest::validate(params)?;
        self.dispatch(&request, cancel).await
    }

    /// Fetch an already validated request.
    pub async fn dispatch(
        &self,
        request: &ScrapeRequest,
        cancel: CancellationToken,
    ) -> Result<ScrapeResult, ScrapeError> {
        tracing::debug!(url = %request.url, render = request.render, "Dispatching scrape");

        let html = if request.render {
            self.rendered_fetcher
                .render(&request.url, &request.proxy, request.additional_delay, cancel)
                .await?
        } else {
            self.static_fetcher
                .fetch(&request.url, Some(&request.proxy.endpoint), cancel)
                .await?
        };

        Ok(ScrapeResult {
            html,
            source_url: request.url.clone(),
        })
    }
}
