//! Shared building blocks for the vantage scan engine.
//!
//! Everything here is plain data or plumbing with no runtime dependency:
//! the scan model (targets, ports, plans, outcomes), the typed error
//! taxonomy, the runtime configuration, and the logging macro veneer.

pub mod config;
pub mod error;
pub mod scan;

mod macros;

pub use tracing;
