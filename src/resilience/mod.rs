//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! POST /scrape
//!     → supervisor.rs (spawn work, arm deadline, watch disconnect)
//!     → first of: completion | deadline | disconnect
//!     → losing work is cancelled through its token
//! ```
//!
//! # Design Decisions
//! - Every request has a deadline (16 seconds by default)
//! - Timeouts are distinct from fetch failures (408 vs 500)
//! - No automatic retries; retry policy belongs to the caller

pub mod supervisor;

pub use supervisor::{RequestSupervisor, SupervisedOutcome};
