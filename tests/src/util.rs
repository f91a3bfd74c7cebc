#![cfg(test)]
//! Shared stubs for the integration tests. Probing goes through the
//! scripted [`SimulatedProber`]; advisory generation goes through the
//! counting provider below so call-collapsing is observable.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use vantage_common::error::AdvisoryError;
use vantage_common::scan::outcome::PortStatus;
use vantage_common::scan::plan::{ScanMode, ScanPlan};
use vantage_core::advisory::AdvisoryProvider;
use vantage_core::probe::simulated::{Script, SimulatedProber};
use vantage_core::probe::ProbeReply;

pub fn tcp_plan(targets: &str, ports: &str) -> ScanPlan {
    ScanPlan::new(
        targets.parse().expect("test targets"),
        ports.parse().expect("test ports"),
        ScanMode::TcpConnect,
    )
}

/// The classic two-port fixture: SSH and HTTP open with banners the
/// built-in catalog recognizes.
pub fn portal_prober(host: &str) -> SimulatedProber {
    SimulatedProber::new()
        .script(
            host,
            22,
            Script::Reply(
                ProbeReply::status(PortStatus::Open)
                    .with_service("ssh")
                    .with_banner("OpenSSH 8.2p1 Ubuntu-4ubuntu0.5"),
            ),
        )
        .script(
            host,
            80,
            Script::Reply(
                ProbeReply::status(PortStatus::Open)
                    .with_service("http")
                    .with_banner("Apache/2.4.41 (Ubuntu)"),
            ),
        )
}

/// Counts provider invocations; optionally fails the first `fail_first`
/// calls, then succeeds. Each call takes `delay`.
pub struct CountingAdvisor {
    pub calls: AtomicUsize,
    delay: Duration,
    fail_first: usize,
}

impl CountingAdvisor {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
            fail_first: 0,
        })
    }

    pub fn failing_first(delay: Duration, fail_first: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
            fail_first,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdvisoryProvider for CountingAdvisor {
    async fn generate(&self, vuln_id: &str) -> Result<String, AdvisoryError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if call < self.fail_first {
            return Err(AdvisoryError::Provider("transient outage".to_string()));
        }
        Ok(format!("remediation for {vuln_id}"))
    }
}
