//! Mapping supervised outcomes to HTTP responses.
//!
//! # Status Classes
//! - 200 `{"html", "url"}` on success
//! - 500 `{"error"}` for validation, proxy and fetch failures
//! - 408 `{"error": "Request timed out"}` when the deadline passes
//! - Disconnect: nobody is listening, so an empty body is produced

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::resilience::SupervisedOutcome;
use crate::scrape::ScrapeError;

/// nginx's "client closed request"; never actually read by anyone.
const CLIENT_CLOSED_REQUEST: u16 = 499;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Status code for a failed scrape.
pub fn error_status(error: &ScrapeError) -> StatusCode {
    match error {
        ScrapeError::Timeout => StatusCode::REQUEST_TIMEOUT,
        ScrapeError::ClientDisconnected => {
            StatusCode::from_u16(CLIENT_CLOSED_REQUEST).unwrap_or(StatusCode::BAD_REQUEST)
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ScrapeError {
    fn into_response(self) -> Response {
        let status = error_status(&self);
        if matches!(self, ScrapeError::ClientDisconnected) {
            return status.into_response();
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

impl IntoResponse for SupervisedOutcome {
    fn into_response(self) -> Response {
        match self.into_result() {
            Ok(result) => (StatusCode::OK, Json(result)).into_response(),
            Err(e) => e.into_response(),
        }
    }
}
