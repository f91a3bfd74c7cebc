//! Typed error taxonomy for the scan engine.
//!
//! Per-probe and per-advisory failures are *data* (they end up inside a
//! [`Finding`](crate::scan::outcome::Finding) or an advisory entry), not
//! errors. Only precondition and lifecycle violations surface as `Err` to
//! the immediate caller.

use std::time::Duration;

use thiserror::Error;

/// Lifecycle errors raised by a scan session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The plan failed validation before dispatch could begin.
    #[error("invalid scan plan: {0}")]
    InvalidPlan(String),

    /// The operation is not valid for the session's current state.
    #[error("operation not valid while session is {state}")]
    InvalidState { state: &'static str },
}

/// Errors raised by the coordinator when managing sessions by handle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// The caller context already has a running session.
    #[error("a scan is already running for context '{0}'")]
    SessionAlreadyRunning(String),

    /// The handle does not refer to a tracked session.
    #[error("unknown session handle {0}")]
    UnknownSession(u64),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// A transport-level probe failure.
///
/// Recorded as `PortStatus::Error` on the outcome; never fails the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("could not resolve '{0}'")]
    Resolution(String),

    #[error("i/o failure: {0}")]
    Io(String),
}

/// An advisory-provider failure, recorded per key in the advisory cache.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdvisoryError {
    #[error("advisory provider failed: {0}")]
    Provider(String),

    #[error("advisory provider timed out after {0:?}")]
    Timeout(Duration),
}
