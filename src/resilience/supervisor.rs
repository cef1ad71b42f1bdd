//! Bounded-time, cancellable execution of one scrape.
//!
//! # State Machine
//! ```text
//! Running ──work finished──▶ Completed(result | error)
//!    │ ───deadline elapsed──▶ TimedOut
//!    └────caller gone───────▶ Disconnected
//! ```
//!
//! Exactly one terminal state is reported. When the work loses the race
//! its cancellation token fires, so fetchers release sockets and browser
//! processes instead of running to natural completion.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::scrape::{ScrapeError, ScrapeExecutor, ScrapeParams, ScrapeResult};

/// Terminal state of a supervised request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisedOutcome {
    Completed(Result<ScrapeResult, ScrapeError>),
    TimedOut,
    Disconnected,
}

impl SupervisedOutcome {
    /// Collapse into the executor's result type.
    pub fn into_result(self) -> Result<ScrapeResult, ScrapeError> {
        match self {
            SupervisedOutcome::Completed(result) => result,
            SupervisedOutcome::TimedOut => Err(ScrapeError::Timeout),
            SupervisedOutcome::Disconnected => Err(ScrapeError::ClientDisconnected),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SupervisedOutcome::Completed(Ok(_)) => "success",
            SupervisedOutcome::Completed(Err(e)) => e.kind(),
            SupervisedOutcome::TimedOut => "timeout",
            SupervisedOutcome::Disconnected => "disconnected",
        }
    }
}

/// Races work against a deadline and the caller's disconnect signal.
#[derive(Debug, Clone)]
pub struct RequestSupervisor {
    deadline: Duration,
}

impl RequestSupervisor {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run `work` on its own task. `work` receives the token that is
    /// cancelled if it loses the race.
    pub async fn supervise<F, Fut>(
        &self,
        disconnected: CancellationToken,
        work: F,
    ) -> SupervisedOutcome
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<ScrapeResult, ScrapeError>> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        // Also covers this future being dropped mid-race.
        let _cancel_on_exit = cancel.clone().drop_guard();

        let mut task = tokio::spawn(work(cancel.clone()));

        let outcome = tokio::select! {
            biased;
            joined = &mut task => SupervisedOutcome::Completed(
                joined.unwrap_or_else(|e| Err(ScrapeError::Internal(e.to_string()))),
            ),
            _ = tokio::time::sleep(self.deadline) => SupervisedOutcome::TimedOut,
            _ = disconnected.cancelled() => SupervisedOutcome::Disconnected,
        };

        match &outcome {
            SupervisedOutcome::Completed(_) => {}
            SupervisedOutcome::TimedOut => {
                tracing::warn!(
                    deadline_secs = self.deadline.as_secs(),
                    "Request timed out, cancelling fetch"
                );
                cancel.cancel();
            }
            SupervisedOutcome::Disconnected => {
                tracing::info!("Client disconnected, cancelling fetch");
                cancel.cancel();
            }
        }

        outcome
    }

    /// Supervise one scrape through `executor`.
    pub async fn scrape(
        &self,
        executor: &ScrapeExecutor,
        params: ScrapeParams,
        disconnected: CancellationToken,
    ) -> SupervisedOutcome {
        let executor = executor.clone();
        self.supervise(disconnected, move |cancel| async move {
            executor.execute(&params, cancel).await
        })
        .await
    }
}
