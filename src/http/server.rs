//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing)
//! - Decode the scrape form into raw parameters
//! - Hand each request to the supervisor and map the outcome
//! - Serve until the shutdown signal fires

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    routing::{get, post},
    Form, Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ScraperConfig;
use crate::http::request::{request_span, X_REQUEST_ID};
use crate::lifecycle::shutdown::wait_for_shutdown;
use crate::observability::metrics;
use crate::resilience::{RequestSupervisor, SupervisedOutcome};
use crate::scrape::{ScrapeError, ScrapeExecutor, ScrapeParams};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub executor: ScrapeExecutor,
    pub supervisor: RequestSupervisor,
}

/// HTTP server for the scrape service.
pub struct HttpServer {
    router: Router,
    config: ScraperConfig,
}

impl HttpServer {
    /// Create a server backed by the real fetchers.
    pub fn new(config: ScraperConfig) -> Self {
        let executor = ScrapeExecutor::from_config(&config);
        Self::with_executor(config, executor)
    }

    /// Create a server around a prepared executor.
    pub fn with_executor(config: ScraperConfig, executor: ScrapeExecutor) -> Self {
        let state = AppState {
            executor,
            supervisor: RequestSupervisor::new(Duration::from_secs(config.timeouts.request_secs)),
        };

        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/scrape", post(scrape_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(request_span::<Body>))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// The router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            deadline_secs = self.config.timeouts.request_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }
}

/// `POST /scrape`.
///
/// The supervisor runs on its own task. If the client goes away, the server
/// drops this future, the guard fires the disconnect token and the
/// supervisor cancels the fetch.
async fn scrape_handler(
    State(state): State<AppState>,
    Form(params): Form<ScrapeParams>,
) -> SupervisedOutcome {
    let disconnected = CancellationToken::new();
    let _disconnect_on_drop = disconnected.clone().drop_guard();

    let task = tokio::spawn(async move {
        let start = Instant::now();
        let strategy = if params.js_render == "true" { "rendered" } else { "static" };
        let url = params.url.clone();

        let outcome = state
            .supervisor
            .scrape(&state.executor, params, disconnected)
            .await;

        metrics::record_request(strategy, outcome.label(), start);
        match &outcome {
            SupervisedOutcome::Completed(Err(e)) => tracing::warn!(
                url = %url,
                strategy,
                kind = e.kind(),
                error = %e,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Scrape failed"
            ),
            _ => tracing::info!(
                url = %url,
                strategy,
                outcome = outcome.label(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Scrape finished"
            ),
        }
        outcome
    });

    task.await.unwrap_or_else(|e| {
        SupervisedOutcome::Completed(Err(ScrapeError::Internal(format!(
            "supervisor task failed: {e}"
        ))))
    })
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /health`.
async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::{ProxyCredentials, RenderedFetch, StaticFetch};
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct FixedStatic(&'static str);

    #[async_trait::async_trait]
    impl StaticFetch for FixedStatic {
        async fn fetch(
            &self,
            _url: &str,
            _proxy_endpoint: Option<&str>,
            _cancel: CancellationToken,
        ) -> Result<String, ScrapeError> {
            Ok(self.0.to_string())
        }
    }

    struct HangingRender;

    #[async_trait::async_trait]
    impl RenderedFetch for HangingRender {
        async fn render(
            &self,
            _url: &str,
            _proxy: &ProxyCredentials,
            _additional_delay: Duration,
            cancel: CancellationToken,
        ) -> Result<String, ScrapeError> {
            cancel.cancelled().await;
            Err(ScrapeError::Cancelled)
        }
    }

    /// Hangs until cancelled, then reports the cancellation.
    struct ObservedRender(Arc<tokio::sync::Notify>);

    #[async_trait::async_trait]
    impl RenderedFetch for ObservedRender {
        async fn render(
            &self,
            _url: &str,
            _proxy: &ProxyCredentials,
            _additional_delay: Duration,
            cancel: CancellationToken,
        ) -> Result<String, ScrapeError> {
            cancel.cancelled().await;
            self.0.notify_one();
            Err(ScrapeError::Cancelled)
        }
    }

    fn server(deadline_secs: u64) -> HttpServer {
        let mut config = ScraperConfig::default();
        config.timeouts.request_secs = deadline_secs;
        let executor = ScrapeExecutor::new(
            Arc::new(FixedStatic("<html>ok</html>")),
            Arc::new(HangingRender),
        );
        HttpServer::with_executor(config, executor)
    }

    fn form(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/scrape")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn static_scrape_round_trip() {
        let response = server(16)
            .router()
            .oneshot(form(
                "url=http%3A%2F%2Fexample.com&proxy=http%3A%2F%2Fu%3Ap%4010.0.0.1%3A8080&js_render=false&additional_delay=2000",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(
            json(response).await,
            serde_json::json!({"html": "<html>ok</html>", "url": "http://example.com"})
        );
    }

    #[tokio::test]
    async fn missing_fields_report_first_rule() {
        let response = server(16).router().oneshot(form("")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json(response).await, serde_json::json!({"error": "url is empty"}));
    }

    #[tokio::test]
    async fn hanging_render_times_out() {
        let response = server(1)
            .router()
            .oneshot(form(
                "url=http%3A%2F%2Fexample.com&proxy=http%3A%2F%2Fu%3Ap%40h%3A1&js_render=true&additional_delay=1000",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            json(response).await,
            serde_json::json!({"error": "Request timed out"})
        );
    }

    #[tokio::test]
    async fn dropped_request_cancels_the_fetch() {
        let cancelled = Arc::new(tokio::sync::Notify::new());
        let executor = ScrapeExecutor::new(
            Arc::new(FixedStatic("<html>ok</html>")),
            Arc::new(ObservedRender(cancelled.clone())),
        );
        let router = HttpServer::with_executor(ScraperConfig::default(), executor).router();

        // The caller gives up long before the 16s deadline; the server drops
        // the handler future just as it does when the connection closes.
        let abandoned = tokio::time::timeout(
            Duration::from_millis(200),
            router.oneshot(form(
                "url=http%3A%2F%2Fexample.com&proxy=http%3A%2F%2Fu%3Ap%40h%3A1&js_render=true&additional_delay=1000",
            )),
        )
        .await;
        assert!(abandoned.is_err(), "request should still be in flight");

        tokio::time::timeout(Duration::from_secs(2), cancelled.notified())
            .await
            .expect("render was not cancelled after the caller went away");
    }

    #[tokio::test]
    async fn health_reports_version() {
        let response = server(16)
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn caller_request_id_is_echoed() {
        let mut request = form("");
        request
            .headers_mut()
            .insert("x-request-id", "trace-42".parse().unwrap());

        let response = server(16).router().oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "trace-42");
    }
}
