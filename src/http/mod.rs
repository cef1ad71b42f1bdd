//! HTTP transport adapter.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID + trace layers)
//!     → POST /scrape form → ScrapeParams (four raw strings)
//!     → [resilience::supervisor races executor vs deadline vs disconnect]
//!     → response.rs (outcome → 200 / 500 / 408 / nothing)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::HttpServer;
