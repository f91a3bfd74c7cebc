//! The central **abstraction** for probing a single unit of work.
//!
//! A [`Prober`] answers one question: what is the state of this
//! (target, port) pair? The session engine owns timing, concurrency and
//! aggregation; probers own the transport. Ship-with implementations:
//! a real TCP connect prober ([`tcp::TcpConnectProber`]) and a scripted
//! one for demos and tests ([`simulated::SimulatedProber`]).
//!
//! **Architectural Note:**
//! Higher-level modules depend on this abstraction only. Raw-socket SYN
//! scanning, packet capture, or OS-level probing plug in behind the same
//! trait without touching the session engine.

use std::time::Duration;

use async_trait::async_trait;
use vantage_common::error::TransportError;
use vantage_common::scan::outcome::{PortStatus, ProbeOutcome};
use vantage_common::scan::plan::{DetectionFlags, ProbeUnit, ScanMode};

pub mod simulated;
pub mod tcp;

/// What a single probe learned, before correlation and bookkeeping.
#[derive(Debug, Clone)]
pub struct ProbeReply {
    pub status: PortStatus,
    pub service: Option<String>,
    pub banner: Option<String>,
}

impl ProbeReply {
    pub fn status(status: PortStatus) -> Self {
        Self {
            status,
            service: None,
            banner: None,
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

    /// Folds the reply into the outcome record for its unit.
    pub fn into_outcome(self, unit: ProbeUnit) -> ProbeOutcome {
        let mut outcome = ProbeOutcome::new(unit.target, unit.port, self.status);
        outcome.service = self.service;
        outcome.banner = self.banner;
        outcome
    }
}

/// Performs one connectivity/banner probe against a unit of work.
///
/// The session wraps every call in its own per-probe timeout; `timeout` is
/// passed along so implementations can bound internal waits (resolution,
/// banner reads) below the session's deadline.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(
        &self,
        unit: &ProbeUnit,
        timeout: Duration,
        detect: &DetectionFlags,
    ) -> Result<ProbeReply, TransportError>;

    /// Whether this implementation can perform `mode` probes. Sessions
    /// reject plans whose mode the prober does not support, instead of
    /// silently probing some other way.
    fn supports(&self, mode: ScanMode) -> bool {
        let _ = mode;
        true
    }
}

/// Best-effort service name for a well-known port.
pub fn service_name(port: u16) -> Option<&'static str> {
    let name = match port {
        21 => "ftp",
        22 => "ssh",
        23 => "telnet",
        25 => "smtp",
        53 => "dns",
        80 => "http",
        110 => "pop3",
        111 => "rpcbind",
        135 => "msrpc",
        139 => "netbios-ssn",
        143 => "imap",
        389 => "ldap",
        443 => "https",
        445 => "microsoft-ds",
        465 => "smtps",
        587 => "submission",
        631 => "ipp",
        993 => "imaps",
        995 => "pop3s",
        1433 => "ms-sql-s",
        1723 => "pptp",
        2049 => "nfs",
        3306 => "mysql",
        3389 => "rdp",
        5060 => "sip",
        5432 => "postgresql",
        5900 => "vnc",
        6379 => "redis",
        8080 => "http-proxy",
        8443 => "https-alt",
        9100 => "jetdirect",
        27017 => "mongodb",
        _ => return None,
    };
    Some(name)
}
