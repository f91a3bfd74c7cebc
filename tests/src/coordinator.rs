#![cfg(test)]
//! Coordinator behavior: one running session per context, handle
//! lifecycle, and session garbage collection.

use std::sync::Arc;
use std::time::Duration;

use vantage_common::error::CoordinatorError;
use vantage_core::catalog::StaticCatalog;
use vantage_core::coordinator::{ScanCoordinator, SessionHandle};
use vantage_core::probe::simulated::{Script, SimulatedProber};
use vantage_core::session::SessionState;

use crate::util::tcp_plan;

fn coordinator(prober: SimulatedProber) -> ScanCoordinator {
    ScanCoordinator::new(Arc::new(prober), Arc::new(StaticCatalog::builtin()))
}

fn slow_prober() -> SimulatedProber {
    SimulatedProber::new().fallback(Script::Hang)
}

#[tokio::test]
async fn one_running_session_per_context() {
    let coordinator = coordinator(slow_prober());
    let plan = tcp_plan("10.0.0.1", "22,80").with_timeout(Duration::from_secs(5));

    let handle = coordinator
        .create_and_start("portal-user", plan.clone())
        .unwrap();

    let err = coordinator
        .create_and_start("portal-user", plan.clone())
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::SessionAlreadyRunning(_)));

    // A different context is free to scan concurrently.
    coordinator.create_and_start("other-user", plan).unwrap();

    coordinator.cancel(handle).unwrap();
}

#[tokio::test]
async fn context_frees_up_after_terminal_state() {
    let coordinator = coordinator(SimulatedProber::new());
    let plan = tcp_plan("10.0.0.1", "22");

    let first = coordinator.create_and_start("ctx", plan.clone()).unwrap();
    coordinator.wait(first).await.unwrap();

    // First session completed; the context may start another.
    coordinator.create_and_start("ctx", plan).unwrap();
}

#[tokio::test]
async fn unknown_handles_are_rejected() {
    let coordinator = coordinator(SimulatedProber::new());
    let stale = SessionHandle::default();

    assert!(matches!(
        coordinator.get(stale),
        Err(CoordinatorError::UnknownSession(_))
    ));
    assert!(matches!(
        coordinator.cancel(stale),
        Err(CoordinatorError::UnknownSession(_))
    ));
    assert!(matches!(
        coordinator.remove(stale),
        Err(CoordinatorError::UnknownSession(_))
    ));
}

#[tokio::test]
async fn cancel_through_the_coordinator() {
    let coordinator = coordinator(slow_prober());
    let plan = tcp_plan("10.0.0.1", "22,80,443").with_timeout(Duration::from_millis(200));

    let handle = coordinator.create_and_start("ctx", plan).unwrap();
    coordinator.cancel(handle).unwrap();

    let view = coordinator.wait(handle).await.unwrap();
    assert_eq!(view.state, SessionState::Cancelled);
}

#[tokio::test]
async fn remove_rejects_running_then_releases_terminal() {
    let coordinator = coordinator(slow_prober());
    let plan = tcp_plan("10.0.0.1", "22").with_timeout(Duration::from_millis(50));

    let handle = coordinator.create_and_start("ctx", plan).unwrap();
    assert!(coordinator.remove(handle).is_err(), "still running");

    coordinator.wait(handle).await.unwrap();
    let view = coordinator.remove(handle).unwrap();
    assert_eq!(view.state, SessionState::Completed);
    assert_eq!(view.findings.len(), 1);

    // The handle is gone afterwards.
    assert!(matches!(
        coordinator.get(handle),
        Err(CoordinatorError::UnknownSession(_))
    ));
}

#[tokio::test]
async fn get_exposes_live_progress() {
    let coordinator = coordinator(SimulatedProber::new());
    let plan = tcp_plan("10.0.0.1,10.0.0.2", "1-5");

    let handle = coordinator.create_and_start("ctx", plan).unwrap();
    let view = coordinator.get(handle).unwrap();
    assert_eq!(view.progress.total, 10);

    let view = coordinator.wait(handle).await.unwrap();
    assert_eq!(view.progress.completed, 10);
    assert_eq!(view.findings.len(), 10);
}
