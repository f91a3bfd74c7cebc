//! The scan session engine.
//!
//! [`session::ScanSession`] owns one scan's lifecycle: bounded-concurrency
//! dispatch of probe units to a pluggable [`probe::Prober`], live progress
//! aggregation, cooperative cancellation, and vulnerability correlation via
//! [`catalog::VulnerabilityCatalog`]. [`coordinator::ScanCoordinator`] tracks
//! sessions by handle and enforces one running scan per caller context.
//! [`advisory::AdvisoryCache`] deduplicates remediation-advisory requests.

pub mod advisory;
pub mod catalog;
pub mod coordinator;
pub mod probe;
pub mod session;
