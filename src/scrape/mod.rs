//! Scrape pipeline.
//!
//! # Data Flow
//! ```text
//! ScrapeParams (four raw strings)
//!     → request.rs (ordered validation, proxy decoding via proxy.rs)
//!     → ScrapeRequest (validated, immutable)
//!     → executor.rs (branch on render flag)
//!         → static_fetch.rs (reqwest GET via proxy endpoint)
//!         → rendered.rs (headless Chrome, authenticated proxy)
//!     → ScrapeResult { html, url } | ScrapeError
//! ```
//!
//! # Design Decisions
//! - Validation happens before any network or browser activity
//! - Fetchers sit behind traits so the executor can be driven by fakes
//! - No retries: one attempt per request
//! - Every fetch takes a cancellation token owned by the supervisor

pub mod error;
pub mod executor;
pub mod proxy;
pub mod rendered;
pub mod request;
pub mod static_fetch;
pub mod traits;

pub use error::{ProxyFormatError, ScrapeError, ValidationError};
pub use executor::{ScrapeExecutor, ScrapeResult};
pub use proxy::ProxyCredentials;
pub use request::{ScrapeParams, ScrapeRequest};
pub use traits::{RenderedFetch, StaticFetch};
