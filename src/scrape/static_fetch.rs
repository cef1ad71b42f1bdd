//! Plain HTTP fetch.
//!
//! One GET, one attempt, no status check: whatever body comes back is the
//! page, error pages included. Only the proxy endpoint is used here; the
//! proxy credentials are not sent on this path.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::StaticFetchConfig;
use crate::scrape::error::ScrapeError;
use crate::scrape::traits::StaticFetch;

/// Fetches raw HTML with a request-scoped `reqwest` client.
#[derive(Debug, Clone)]
pub struct StaticFetcher {
    connect_timeout: Duration,
    user_agent: String,
}

impl StaticFetcher {
    pub fn new(config: &StaticFetchConfig, connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            user_agent: config.user_agent.clone(),
        }
    }

    fn client(&self, proxy_endpoint: Option<&str>) -> Result<reqwest::Client, ScrapeError> {
        let builder = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(&self.user_agent);

        let builder = match proxy_endpoint.filter(|p| !p.is_empty()) {
            Some(endpoint) => builder.proxy(reqwest::Proxy::all(endpoint)?),
            None => builder.no_proxy(),
        };

        Ok(builder.build()?)
    }
}

#[async_trait::async_trait]
impl StaticFetch for StaticFetcher {
    async fn fetch(
        &self,
        url: &str,
        proxy_endpoint: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<String, ScrapeError> {
        let client = self.client(proxy_endpoint)?;

        tracing::debug!(url = %url, proxy = ?proxy_endpoint, "Static fetch");

        let body = async {
            let response = client.get(url).send().await?;
            tracing::debug!(url = %url, status = %response.status(), "Static fetch response");
            response.text().await
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ScrapeError::Cancelled),
            result = body => result.map_err(ScrapeError::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> StaticFetcher {
        StaticFetcher::new(&StaticFetchConfig::default(), Duration::from_millis(500))
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        // Port 9 on loopback is discard; nothing listens there in CI.
        let err = fetcher()
            .fetch("http://127.0.0.1:9/", None, CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "network");
    }

    #[tokio::test]
    async fn bad_proxy_endpoint_is_network_error() {
        let err = fetcher()
            .fetch("http://example.com", Some("not a url"), CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "network");
    }

    #[tokio::test]
    async fn cancelled_token_aborts_fetch() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        // 10.255.255.1 is unroutable, so the connect would otherwise hang.
        let err = fetcher()
            .fetch("http://10.255.255.1/", None, cancel)
            .await
            .unwrap_err();
        assert_eq!(err, ScrapeError::Cancelled);
    }
}
