//! What a scan produces: per-probe outcomes and correlated findings.

use std::fmt;
use std::time::SystemTime;

use super::target::Target;

/// The observed state of one (target, port) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortStatus {
    Open,
    Closed,
    /// No response within the probe timeout. The port may be firewalled.
    Filtered,
    /// A transport-level failure (resolution, socket errors). Recorded as
    /// data; never fails the session.
    Error,
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PortStatus::Open => "open",
            PortStatus::Closed => "closed",
            PortStatus::Filtered => "filtered",
            PortStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// The immutable result of a single probe.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub target: Target,
    /// `None` for target-only probes (discovery mode).
    pub port: Option<u16>,
    pub status: PortStatus,
    pub service: Option<String>,
    pub banner: Option<String>,
    pub timestamp: SystemTime,
}

impl ProbeOutcome {
    pub fn new(target: Target, port: Option<u16>, status: PortStatus) -> Self {
        Self {
            target,
            port,
            status,
            service: None,
            banner: None,
            timestamp: SystemTime::now(),
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = Some(banner.into());
        self
    }
}

/// A probe outcome enriched with known-vulnerability identifiers.
///
/// Owned by the session that produced it; read-only once the session
/// reaches a terminal state.
#[derive(Debug, Clone)]
pub struct Finding {
    pub outcome: ProbeOutcome,
    /// Ordered by severity descending, then identifier ascending.
    pub vulnerabilities: Vec<String>,
}

impl Finding {
    pub fn has_vulnerabilities(&self) -> bool {
        !self.vulnerabilities.is_empty()
    }
}
