//! # Remediation Advisory Cache
//!
//! Deduplicates advisory requests per vulnerability identifier: the first
//! request creates a `Pending` entry and spawns exactly one provider call;
//! concurrent requests for the same key attach to the same eventual
//! transition. Terminal entries (`Ready`/`Failed`) never regress and are
//! served from cache until explicitly invalidated.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::debug;

use vantage_common::error::AdvisoryError;

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Produces remediation text for a vulnerability identifier.
///
/// The wording is opaque to the engine; providers may be slow or fail.
#[async_trait]
pub trait AdvisoryProvider: Send + Sync {
    async fn generate(&self, vuln_id: &str) -> Result<String, AdvisoryError>;
}

/// Lifecycle of one advisory entry. `Ready` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvisoryState {
    Pending,
    Ready(String),
    Failed(AdvisoryError),
}

impl AdvisoryState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AdvisoryState::Pending)
    }
}

/// A caller's view of one advisory entry.
///
/// Handles for the same key observe the same underlying transition; no
/// waiter sees a partial state or a second Pending→terminal edge.
pub struct AdvisoryHandle {
    rx: watch::Receiver<AdvisoryState>,
}

impl AdvisoryHandle {
    /// The entry's state right now.
    pub fn state(&self) -> AdvisoryState {
        self.rx.borrow().clone()
    }

    /// Suspends until the entry reaches `Ready` or `Failed`.
    pub async fn wait(&mut self) -> AdvisoryState {
        loop {
            let state = self.rx.borrow_and_update().clone();
            if state.is_terminal() {
                return state;
            }
            if self.rx.changed().await.is_err() {
                // Writer gone; whatever was last published is final.
                return self.rx.borrow().clone();
            }
        }
    }
}

/// At-most-one-in-flight advisory requests, keyed by identifier.
pub struct AdvisoryCache {
    provider: Arc<dyn AdvisoryProvider>,
    provider_timeout: Duration,
    entries: Mutex<HashMap<String, Arc<watch::Sender<AdvisoryState>>>>,
}

impl AdvisoryCache {
    pub fn new(provider: Arc<dyn AdvisoryProvider>) -> Self {
        Self::with_timeout(provider, DEFAULT_PROVIDER_TIMEOUT)
    }

    pub fn with_timeout(provider: Arc<dyn AdvisoryProvider>, provider_timeout: Duration) -> Self {
        Self {
            provider,
            provider_timeout,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Requests an advisory for `vuln_id`.
    ///
    /// First request per key spawns the provider call; later requests
    /// attach to the existing entry, whatever its state. Must be called
    /// from within a tokio runtime.
    pub fn request(&self, vuln_id: &str) -> AdvisoryHandle {
        let mut entries = self.entries.lock().expect("advisory entries lock poisoned");

        if let Some(tx) = entries.get(vuln_id) {
            return AdvisoryHandle { rx: tx.subscribe() };
        }

        let (tx, rx) = watch::channel(AdvisoryState::Pending);
        let tx = Arc::new(tx);
        entries.insert(vuln_id.to_string(), Arc::clone(&tx));
        drop(entries);

        let provider = Arc::clone(&self.provider);
        let deadline = self.provider_timeout;
        let id = vuln_id.to_string();
        tokio::spawn(async move {
            let state = match timeout(deadline, provider.generate(&id)).await {
                Ok(Ok(text)) => AdvisoryState::Ready(text),
                Ok(Err(err)) => {
                    debug!("advisory for {id} failed: {err}");
                    AdvisoryState::Failed(err)
                }
                Err(_elapsed) => AdvisoryState::Failed(AdvisoryError::Timeout(deadline)),
            };
            // send_replace publishes even when no waiter is subscribed yet.
            tx.send_replace(state);
        });

        AdvisoryHandle { rx }
    }

    /// Current state for a key, if an entry exists.
    pub fn state(&self, vuln_id: &str) -> Option<AdvisoryState> {
        let entries = self.entries.lock().expect("advisory entries lock poisoned");
        entries.get(vuln_id).map(|tx| tx.borrow().clone())
    }

    /// Removes a terminal entry so a future request re-issues the call.
    /// Pending entries are left alone. Returns whether an entry was removed.
    pub fn invalidate(&self, vuln_id: &str) -> bool {
        let mut entries = self.entries.lock().expect("advisory entries lock poisoned");
        let terminal = entries
            .get(vuln_id)
            .is_some_and(|tx| tx.borrow().is_terminal());
        if terminal {
            entries.remove(vuln_id);
        }
        terminal
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
