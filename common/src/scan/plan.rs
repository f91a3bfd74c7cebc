//! # Scan Plan
//!
//! A plan is the immutable configuration snapshot a session is built from:
//! targets, ports, mode, timing, concurrency and detection flags. Sessions
//! never observe configuration changes after construction.

use std::time::Duration;

use crate::error::ScanError;

use super::ports::PortSpec;
use super::target::{Target, TargetSet};

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_CONCURRENCY: usize = 32;

/// How probes are performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Full TCP connect scan.
    TcpConnect,
    /// UDP probe scan.
    Udp,
    /// Half-open SYN scan (requires a raw-socket capable prober).
    Syn,
    /// Target-only host discovery; ports are ignored.
    Discovery,
}

impl ScanMode {
    /// Whether units are (target, port) pairs rather than bare targets.
    pub fn uses_ports(&self) -> bool {
        !matches!(self, ScanMode::Discovery)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScanMode::TcpConnect => "tcp-connect",
            ScanMode::Udp => "udp",
            ScanMode::Syn => "syn",
            ScanMode::Discovery => "discovery",
        }
    }
}

/// Optional detection work layered on top of the raw probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionFlags {
    /// Identify the service and grab a banner where possible.
    pub service_detection: bool,
    /// Attempt OS fingerprinting hints from probe responses.
    pub os_detection: bool,
    /// Report filtered ports explicitly (firewall detection).
    pub firewall_detection: bool,
    /// Correlate outcomes against the vulnerability catalog.
    pub check_cves: bool,
    /// Allow intrusive probes (longer banner exchanges).
    pub aggressive: bool,
}

impl Default for DetectionFlags {
    fn default() -> Self {
        Self {
            service_detection: true,
            os_detection: false,
            firewall_detection: false,
            check_cves: true,
            aggressive: false,
        }
    }
}

/// The atomic unit of work: one target, optionally one port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeUnit {
    pub target: Target,
    pub port: Option<u16>,
}

/// Immutable configuration snapshot for one scan session.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub targets: TargetSet,
    pub ports: PortSpec,
    pub mode: ScanMode,
    pub probe_timeout: Duration,
    pub concurrency: usize,
    pub detect: DetectionFlags,
    /// Request advisories for correlated findings as they arrive.
    /// Off by default; advisories are normally fetched on demand.
    pub prefetch_advisories: bool,
}

impl ScanPlan {
    pub fn new(targets: TargetSet, ports: PortSpec, mode: ScanMode) -> Self {
        Self {
            targets,
            ports,
            mode,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
            detect: DetectionFlags::default(),
            prefetch_advisories: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_detection(mut self, detect: DetectionFlags) -> Self {
        self.detect = detect;
        self
    }

    pub fn with_prefetch_advisories(mut self, prefetch: bool) -> Self {
        self.prefetch_advisories = prefetch;
        self
    }

    /// Total probe units this plan will dispatch:
    /// |targets| × |ports|, or |targets| in target-only modes.
    pub fn total_units(&self) -> usize {
        if self.mode.uses_ports() {
            self.targets.len() * self.ports.len()
        } else {
            self.targets.len()
        }
    }

    /// Enumerates units in deterministic target-major order.
    /// Completion order will differ; this is only the dispatch order.
    pub fn units(&self) -> Vec<ProbeUnit> {
        let mut units = Vec::with_capacity(self.total_units());
        for target in self.targets.iter() {
            if self.mode.uses_ports() {
                for port in self.ports.iter() {
                    units.push(ProbeUnit {
                        target: target.clone(),
                        port: Some(port),
                    });
                }
            } else {
                units.push(ProbeUnit {
                    target: target.clone(),
                    port: None,
                });
            }
        }
        units
    }

    /// Checks preconditions before dispatch.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.targets.is_empty() {
            return Err(ScanError::InvalidPlan(
                "at least one target is required".to_string(),
            ));
        }
        if self.mode.uses_ports() && self.ports.is_empty() {
            return Err(ScanError::InvalidPlan(
                "at least one port is required for this mode".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(ScanError::InvalidPlan(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
