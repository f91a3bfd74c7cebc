//! # Scan Coordinator
//!
//! Creates, tracks and cancels sessions by handle, and enforces the
//! single-active-scan rule: at most one Running session per caller
//! context. The context is a caller-chosen identifier (a UI session id,
//! a CLI invocation, a tenant), so independent callers can scan
//! concurrently while each keeps its own start/stop toggle semantics.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use vantage_common::error::{CoordinatorError, ScanError};
use vantage_common::scan::outcome::Finding;
use vantage_common::scan::plan::ScanPlan;

use crate::advisory::AdvisoryCache;
use crate::catalog::VulnerabilityCatalog;
use crate::probe::Prober;
use crate::session::{Progress, ScanSession, SessionState};

/// Opaque handle to a tracked session. The default handle refers to no
/// session; coordinator ids start at 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SessionHandle(u64);

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// A read-only view of a session for presentation layers.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub state: SessionState,
    pub progress: Progress,
    pub findings: Vec<Finding>,
}

struct TrackedSession {
    context: String,
    session: Arc<ScanSession>,
}

pub struct ScanCoordinator {
    prober: Arc<dyn Prober>,
    catalog: Arc<dyn VulnerabilityCatalog>,
    advisories: Option<Arc<AdvisoryCache>>,
    next_id: AtomicU64,
    sessions: Mutex<HashMap<u64, TrackedSession>>,
}

impl ScanCoordinator {
    pub fn new(prober: Arc<dyn Prober>, catalog: Arc<dyn VulnerabilityCatalog>) -> Self {
        Self {
            prober,
            catalog,
            advisories: None,
            next_id: AtomicU64::new(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Wires an advisory cache into sessions created from here on, so
    /// plans with `prefetch_advisories` can warm it during the scan.
    pub fn with_advisories(mut self, advisories: Arc<AdvisoryCache>) -> Self {
        self.advisories = Some(advisories);
        self
    }

    /// Constructs and starts a session for `context`.
    ///
    /// Fails with `SessionAlreadyRunning` while the context has a
    /// non-terminal session, and propagates `InvalidPlan` from start.
    pub fn create_and_start(
        &self,
        context: &str,
        plan: ScanPlan,
    ) -> Result<SessionHandle, CoordinatorError> {
        let mut sessions = self.sessions.lock().expect("sessions lock poisoned");

        let already_running = sessions
            .values()
            .any(|t| t.context == context && !t.session.state().is_terminal());
        if already_running {
            return Err(CoordinatorError::SessionAlreadyRunning(context.to_string()));
        }

        let session = ScanSession::new(
            plan,
            Arc::clone(&self.prober),
            Arc::clone(&self.catalog),
            self.advisories.clone(),
        );
        session.start()?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        sessions.insert(
            id,
            TrackedSession {
                context: context.to_string(),
                session,
            },
        );
        Ok(SessionHandle(id))
    }

    /// Cancels the session behind `handle`.
    pub fn cancel(&self, handle: SessionHandle) -> Result<(), CoordinatorError> {
        let session = self.lookup(handle)?;
        session.cancel()?;
        Ok(())
    }

    /// Current state, progress and findings for `handle`.
    pub fn get(&self, handle: SessionHandle) -> Result<SessionView, CoordinatorError> {
        let session = self.lookup(handle)?;
        Ok(SessionView {
            state: session.state(),
            progress: session.progress(),
            findings: session.results(),
        })
    }

    /// Suspends until the session behind `handle` reaches a terminal
    /// state, then returns its final view.
    pub async fn wait(&self, handle: SessionHandle) -> Result<SessionView, CoordinatorError> {
        let session = self.lookup(handle)?;
        let (state, findings) = session.wait().await;
        Ok(SessionView {
            state,
            progress: session.progress(),
            findings,
        })
    }

    /// Releases a terminal session, returning its final view.
    ///
    /// Running sessions cannot be removed; cancel first. This is the
    /// garbage-collection point once a report has been retrieved.
    pub fn remove(&self, handle: SessionHandle) -> Result<SessionView, CoordinatorError> {
        let mut sessions = self.sessions.lock().expect("sessions lock poisoned");
        let tracked = sessions
            .get(&handle.0)
            .ok_or(CoordinatorError::UnknownSession(handle.0))?;

        let state = tracked.session.state();
        if !state.is_terminal() {
            return Err(CoordinatorError::Scan(ScanError::InvalidState {
                state: state.name(),
            }));
        }

        let tracked = sessions
            .remove(&handle.0)
            .expect("session vanished under lock");
        Ok(SessionView {
            state,
            progress: tracked.session.progress(),
            findings: tracked.session.results(),
        })
    }

    fn lookup(&self, handle: SessionHandle) -> Result<Arc<ScanSession>, CoordinatorError> {
        let sessions = self.sessions.lock().expect("sessions lock poisoned");
        sessions
            .get(&handle.0)
            .map(|t| Arc::clone(&t.session))
            .ok_or(CoordinatorError::UnknownSession(handle.0))
    }
}
