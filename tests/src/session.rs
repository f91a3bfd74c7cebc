#![cfg(test)]
//! End-to-end session behavior against scripted probers: correlation,
//! progress accounting, cancellation, and failure containment.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;

use vantage_common::error::TransportError;
use vantage_common::scan::outcome::PortStatus;
use vantage_common::scan::plan::{DetectionFlags, ProbeUnit};
use vantage_core::catalog::StaticCatalog;
use vantage_core::probe::simulated::{Script, SimulatedProber};
use vantage_core::probe::{ProbeReply, Prober};
use vantage_core::session::{ScanSession, SessionState};

use crate::util::{portal_prober, tcp_plan};

fn catalog() -> Arc<StaticCatalog> {
    Arc::new(StaticCatalog::builtin())
}

#[tokio::test]
async fn scripted_scan_correlates_both_findings() {
    let session = ScanSession::new(
        tcp_plan("10.0.0.5", "22,80"),
        Arc::new(portal_prober("10.0.0.5")),
        catalog(),
        None,
    );

    session.start().unwrap();
    let (state, findings) = session.wait().await;

    assert_eq!(state, SessionState::Completed);
    assert_eq!(findings.len(), 2);
    assert!(
        findings.iter().all(|f| f.has_vulnerabilities()),
        "both banners are in the built-in catalog"
    );

    let progress = session.progress();
    assert_eq!((progress.completed, progress.total), (2, 2));
}

#[tokio::test]
async fn probe_errors_become_findings_not_failures() {
    let prober = SimulatedProber::new()
        .script(
            "10.0.0.5",
            22,
            Script::Reply(ProbeReply::status(PortStatus::Open)),
        )
        .script(
            "10.0.0.5",
            80,
            Script::Fail(TransportError::Io("connection reset".to_string())),
        );

    let session = ScanSession::new(tcp_plan("10.0.0.5", "22,80"), Arc::new(prober), catalog(), None);
    session.start().unwrap();
    let (state, findings) = session.wait().await;

    assert_eq!(state, SessionState::Completed);
    let errored: Vec<_> = findings
        .iter()
        .filter(|f| f.outcome.status == PortStatus::Error)
        .collect();
    assert_eq!(errored.len(), 1);
    assert_eq!(errored[0].outcome.port, Some(80));
}

#[tokio::test]
async fn unresponsive_probe_is_recorded_as_filtered() {
    let prober = SimulatedProber::new().script("10.0.0.5", 22, Script::Hang);
    let plan = tcp_plan("10.0.0.5", "22").with_timeout(Duration::from_millis(50));

    let session = ScanSession::new(plan, Arc::new(prober), catalog(), None);
    session.start().unwrap();
    let (state, findings) = session.wait().await;

    assert_eq!(state, SessionState::Completed);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].outcome.status, PortStatus::Filtered);
}

#[tokio::test]
async fn progress_is_monotone_and_bounded() {
    let prober = SimulatedProber::new()
        .with_jitter(Duration::from_millis(1), Duration::from_millis(10));
    let plan = tcp_plan("10.0.0.1,10.0.0.2,10.0.0.3", "1-10").with_concurrency(4);

    let session = ScanSession::new(plan, Arc::new(prober), catalog(), None);
    assert_eq!(session.progress().total, 30);

    session.start().unwrap();

    let mut last = 0;
    loop {
        let progress = session.progress();
        assert!(progress.completed >= last, "completed count went backwards");
        assert!(progress.completed <= progress.total);
        assert!(progress.completed <= session.results().len());
        last = progress.completed;

        if session.state().is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    assert_eq!(session.progress().completed, 30);
}

/// Cancels the session from inside the first probe, before the worker can
/// pull another unit. Deterministic stand-in for "cancel after 1 of 4".
struct CancelAfterFirst {
    session: OnceLock<Arc<ScanSession>>,
}

#[async_trait]
impl Prober for CancelAfterFirst {
    async fn probe(
        &self,
        _unit: &ProbeUnit,
        _timeout: Duration,
        _detect: &DetectionFlags,
    ) -> Result<ProbeReply, TransportError> {
        let session = self.session.get().expect("session wired before start");
        session.cancel().expect("session is running");
        Ok(ProbeReply::status(PortStatus::Open))
    }
}

#[tokio::test]
async fn cancel_freezes_dispatch_but_keeps_findings() {
    let prober = Arc::new(CancelAfterFirst {
        session: OnceLock::new(),
    });
    let plan = tcp_plan("10.0.0.1,10.0.0.2", "22,80").with_concurrency(1);

    let session = ScanSession::new(plan, prober.clone(), catalog(), None);
    prober.session.set(Arc::clone(&session)).ok().unwrap();

    session.start().unwrap();
    let (state, findings) = session.wait().await;

    assert_eq!(state, SessionState::Cancelled);
    assert_eq!(findings.len(), 1, "in-flight finding is kept, rest never ran");

    let progress = session.progress();
    assert_eq!((progress.completed, progress.total), (1, 4));
}

#[tokio::test]
async fn cancelled_results_remain_readable() {
    let prober = Arc::new(CancelAfterFirst {
        session: OnceLock::new(),
    });
    let plan = tcp_plan("10.0.0.1", "22,80,443").with_concurrency(1);

    let session = ScanSession::new(plan, prober.clone(), catalog(), None);
    prober.session.set(Arc::clone(&session)).ok().unwrap();

    session.start().unwrap();
    session.wait().await;

    // Cancellation is a valid, reportable outcome.
    assert_eq!(session.state(), SessionState::Cancelled);
    assert_eq!(session.results().len(), 1);

    // And a second cancel is a lifecycle error now.
    assert!(session.cancel().is_err());
}

struct PanickingProber;

#[async_trait]
impl Prober for PanickingProber {
    async fn probe(
        &self,
        _unit: &ProbeUnit,
        _timeout: Duration,
        _detect: &DetectionFlags,
    ) -> Result<ProbeReply, TransportError> {
        panic!("prober blew up");
    }
}

#[tokio::test]
async fn panicking_prober_fails_the_session() {
    let session = ScanSession::new(
        tcp_plan("10.0.0.1", "22"),
        Arc::new(PanickingProber),
        catalog(),
        None,
    );

    session.start().unwrap();
    let (state, findings) = session.wait().await;

    assert_eq!(state, SessionState::Failed);
    assert!(findings.is_empty());
}

#[tokio::test]
async fn correlation_can_be_disabled() {
    let mut plan = tcp_plan("10.0.0.5", "22,80");
    plan.detect = DetectionFlags {
        check_cves: false,
        ..DetectionFlags::default()
    };

    let session = ScanSession::new(plan, Arc::new(portal_prober("10.0.0.5")), catalog(), None);
    session.start().unwrap();
    let (_, findings) = session.wait().await;

    assert!(findings.iter().all(|f| !f.has_vulnerabilities()));
}
