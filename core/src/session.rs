//! # Scan Session
//!
//! Owns one scan's lifecycle: `Idle → Running → {Completed, Cancelled,
//! Failed}`. A fixed pool of workers pulls probe units off a shared queue
//! and funnels outcomes through a single aggregation point, where they are
//! correlated against the vulnerability catalog and appended in completion
//! order. Readers take snapshots at any time without blocking dispatch.
//!
//! Per-probe failures are recorded as `PortStatus::Error` findings and
//! never fail the session; `Failed` is reserved for unrecoverable internal
//! errors (a panicking prober).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::debug;

use vantage_common::error::ScanError;
use vantage_common::scan::outcome::{Finding, PortStatus, ProbeOutcome};
use vantage_common::scan::plan::{ProbeUnit, ScanPlan};

use crate::advisory::AdvisoryCache;
use crate::catalog::VulnerabilityCatalog;
use crate::probe::Prober;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Cancelled | SessionState::Failed
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Completed => "completed",
            SessionState::Cancelled => "cancelled",
            SessionState::Failed => "failed",
        }
    }
}

/// A progress snapshot. `completed` is monotone and never exceeds `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.completed * 100) / self.total) as u8
    }
}

type Queue = Arc<tokio::sync::Mutex<VecDeque<ProbeUnit>>>;

pub struct ScanSession {
    plan: ScanPlan,
    total: usize,
    prober: Arc<dyn Prober>,
    catalog: Arc<dyn VulnerabilityCatalog>,
    advisories: Option<Arc<AdvisoryCache>>,
    completed: AtomicUsize,
    findings: Mutex<Vec<Finding>>,
    cancelled: AtomicBool,
    state_tx: watch::Sender<SessionState>,
}

impl ScanSession {
    pub fn new(
        plan: ScanPlan,
        prober: Arc<dyn Prober>,
        catalog: Arc<dyn VulnerabilityCatalog>,
        advisories: Option<Arc<AdvisoryCache>>,
    ) -> Arc<Self> {
        let total = plan.total_units();
        let (state_tx, _) = watch::channel(SessionState::Idle);

        Arc::new(Self {
            plan,
            total,
            prober,
            catalog,
            advisories,
            completed: AtomicUsize::new(0),
            findings: Mutex::new(Vec::new()),
            cancelled: AtomicBool::new(false),
            state_tx,
        })
    }

    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    /// Validates the plan and begins dispatch.
    ///
    /// Idempotent no-op while already Running; `InvalidState` once the
    /// session reached a terminal state. Must be called from within a
    /// tokio runtime.
    pub fn start(self: &Arc<Self>) -> Result<(), ScanError> {
        self.plan.validate()?;
        if !self.prober.supports(self.plan.mode) {
            return Err(ScanError::InvalidPlan(format!(
                "prober cannot perform {} scans",
                self.plan.mode.name()
            )));
        }

        let mut begin = false;
        let mut terminal: Option<&'static str> = None;
        self.state_tx.send_if_modified(|state| match *state {
            SessionState::Idle => {
                *state = SessionState::Running;
                begin = true;
                true
            }
            SessionState::Running => false,
            other => {
                terminal = Some(other.name());
                false
            }
        });

        if let Some(state) = terminal {
            return Err(ScanError::InvalidState { state });
        }
        if begin {
            let session = Arc::clone(self);
            tokio::spawn(async move { session.run().await });
        }
        Ok(())
    }

    /// Requests cooperative cancellation.
    ///
    /// Valid only while Running: no new units are dispatched afterwards,
    /// in-flight probes finish and still contribute their findings, and
    /// the session settles in `Cancelled`.
    pub fn cancel(&self) -> Result<(), ScanError> {
        let mut accepted = false;
        let mut state_name = "idle";
        self.state_tx.send_if_modified(|state| {
            if *state == SessionState::Running {
                // Flag set under the channel lock so the terminal-state
                // decision in run() cannot race past it.
                self.cancelled.store(true, Ordering::Relaxed);
                accepted = true;
            } else {
                state_name = state.name();
            }
            false
        });

        if accepted {
            Ok(())
        } else {
            Err(ScanError::InvalidState { state: state_name })
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.completed.load(Ordering::Relaxed),
            total: self.total,
        }
    }

    /// A snapshot of findings collected so far, in completion order.
    pub fn results(&self) -> Vec<Finding> {
        self.findings.lock().expect("findings lock poisoned").clone()
    }

    /// Suspends until the session reaches a terminal state.
    pub async fn wait(&self) -> (SessionState, Vec<Finding>) {
        let mut rx = self.state_tx.subscribe();
        loop {
            let state = *rx.borrow_and_update();
            if state.is_terminal() {
                return (state, self.results());
            }
            if rx.changed().await.is_err() {
                return (self.state(), self.results());
            }
        }
    }

    async fn run(self: Arc<Self>) {
        let queue: Queue = Arc::new(tokio::sync::Mutex::new(self.plan.units().into()));
        let (tx, mut rx) = mpsc::unbounded_channel::<ProbeOutcome>();

        let workers = self.plan.concurrency.min(self.total).max(1);
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let session = Arc::clone(&self);
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            handles.push(tokio::spawn(async move { session.worker(queue, tx).await }));
        }
        drop(tx);

        // Single aggregation point: the only writer of the accumulator.
        while let Some(outcome) = rx.recv().await {
            self.record(outcome);
        }

        let mut failed = false;
        for handle in handles {
            if handle.await.is_err() {
                failed = true;
            }
        }

        self.state_tx.send_if_modified(|state| {
            *state = if failed {
                SessionState::Failed
            } else if self.cancelled.load(Ordering::Relaxed) {
                SessionState::Cancelled
            } else {
                SessionState::Completed
            };
            true
        });
    }

    async fn worker(&self, queue: Queue, tx: mpsc::UnboundedSender<ProbeOutcome>) {
        loop {
            if self.cancelled.load(Ordering::Relaxed) {
                break;
            }

            let unit = {
                let mut queue = queue.lock().await;
                queue.pop_front()
            };
            let Some(unit) = unit else {
                break;
            };

            let outcome = self.probe_unit(unit).await;
            if tx.send(outcome).is_err() {
                break;
            }
        }
    }

    async fn probe_unit(&self, unit: ProbeUnit) -> ProbeOutcome {
        let deadline = self.plan.probe_timeout;
        let probe = self.prober.probe(&unit, deadline, &self.plan.detect);

        match timeout(deadline, probe).await {
            Ok(Ok(reply)) => reply.into_outcome(unit),
            Ok(Err(err)) => {
                // Transport-level failure: recorded, never raised.
                debug!("probe of {}:{:?} failed: {err}", unit.target, unit.port);
                ProbeOutcome::new(unit.target, unit.port, PortStatus::Error)
            }
            // No response within the deadline: filtered, mirroring the
            // "no answer" semantics of connect-style scans.
            Err(_elapsed) => ProbeOutcome::new(unit.target, unit.port, PortStatus::Filtered),
        }
    }

    fn record(&self, outcome: ProbeOutcome) {
        let vulnerabilities = if self.plan.detect.check_cves {
            self.catalog
                .lookup(outcome.service.as_deref(), outcome.banner.as_deref())
        } else {
            Vec::new()
        };

        let finding = Finding {
            outcome,
            vulnerabilities,
        };

        if self.plan.prefetch_advisories && finding.has_vulnerabilities() {
            if let Some(cache) = &self.advisories {
                for id in &finding.vulnerabilities {
                    let _ = cache.request(id);
                }
            }
        }

        // Push before bumping the counter, so `completed` never runs
        // ahead of what `results()` can see.
        self.findings
            .lock()
            .expect("findings lock poisoned")
            .push(finding);
        self.completed.fetch_add(1, Ordering::Relaxed);
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
