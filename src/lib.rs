//! Single-endpoint scraping service library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod scrape;

pub use config::ScraperConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resilience::{RequestSupervisor, SupervisedOutcome};
pub use scrape::{ScrapeError, ScrapeExecutor, ScrapeParams, ScrapeResult};
