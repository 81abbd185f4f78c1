// Dashboard screen state and refresh coordination
//
// State machine: Loading -> Loaded | Failed, re-entered from Loading on every
// refresh. Loads run on a worker thread; at most one is in flight.

use crate::auth::User;
use crate::error::{DashboardError, DashboardResult};
use crate::storage::{load_transactions, Storage};
use crate::summary::{summarize, Dashboard, DisplayOptions};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenState {
    Loading,
    Loaded(Arc<Dashboard>),
    /// Storage or decode failure, shown instead of the cards
    Failed(String),
}

/// Why a refresh was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Mount,
    Focus,
    Manual,
}

impl RefreshTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshTrigger::Mount => "mount",
            RefreshTrigger::Focus => "focus",
            RefreshTrigger::Manual => "manual",
        }
    }
}

// ============================================================================
// REFRESH GUARD
// ============================================================================

/// Allows a single refresh at a time
#[derive(Debug, Clone, Default)]
pub struct RefreshGuard {
    in_flight: Arc<AtomicBool>,
}

/// Held for the duration of one refresh; releases the guard on drop
#[derive(Debug)]
pub struct RefreshPermit {
    in_flight: Arc<AtomicBool>,
}

impl RefreshGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_begin(&self) -> Option<RefreshPermit> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshPermit {
                in_flight: Arc::clone(&self.in_flight),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl Drop for RefreshPermit {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

// ============================================================================
// LOADER (I/O + aggregation)
// ============================================================================

/// Reads a user's collection and aggregates it
pub struct DashboardLoader {
    storage: Arc<dyn Storage>,
    options: DisplayOptions,
}

impl DashboardLoader {
    pub fn new(storage: Arc<dyn Storage>, options: DisplayOptions) -> Self {
        DashboardLoader { storage, options }
    }

    pub fn load(&self, user_id: &str) -> DashboardResult<Dashboard> {
        let transactions = load_transactions(self.storage.as_ref(), user_id)?;
        summarize(&transactions, &self.options)
    }
}

// ============================================================================
// SCREEN
// ============================================================================

type LoadOutcome = DashboardResult<Dashboard>;

pub struct DashboardScreen {
    loader: Arc<DashboardLoader>,
    user: User,
    state: ScreenState,
    guard: RefreshGuard,
    /// Result channel of the latest refresh; the worker owns the only sender
    pending: Option<Receiver<LoadOutcome>>,
}

impl DashboardScreen {
    pub fn new(loader: Arc<DashboardLoader>, user: User) -> Self {
        DashboardScreen {
            loader,
            user,
            state: ScreenState::Loading,
            guard: RefreshGuard::new(),
            pending: None,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn state(&self) -> &ScreenState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == ScreenState::Loading
    }

    pub fn dashboard(&self) -> Option<&Dashboard> {
        match &self.state {
            ScreenState::Loaded(dashboard) => Some(&**dashboard),
            _ => None,
        }
    }

    /// Start a background load. Returns false when one is already running.
    pub fn refresh(&mut self, trigger: RefreshTrigger) -> bool {
        let Some(permit) = self.guard.try_begin() else {
            debug!(trigger = trigger.as_str(), "refresh already in flight, skipping");
            return false;
        };

        info!(trigger = trigger.as_str(), user_id = %self.user.id, "refreshing dashboard");
        self.state = ScreenState::Loading;

        let loader = Arc::clone(&self.loader);
        let user_id = self.user.id.clone();
        let (sender, receiver) = mpsc::channel();
        self.pending = Some(receiver);

        thread::spawn(move || {
            let outcome = loader.load(&user_id);
            drop(permit);
            // Receiver gone means the screen was closed; nothing to report to
            let _ = sender.send(outcome);
        });

        true
    }

    /// Apply a finished load, if any. Returns true when the state changed.
    pub fn poll(&mut self) -> bool {
        let Some(receiver) = &self.pending else {
            return false;
        };

        let outcome = match receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => Err(worker_stopped()),
        };
        self.finish(outcome);
        true
    }

    /// Block until the in-flight load finishes or `timeout` elapses
    pub fn wait_for_load(&mut self, timeout: Duration) -> bool {
        let Some(receiver) = &self.pending else {
            return false;
        };

        let outcome = match receiver.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => return false,
            Err(RecvTimeoutError::Disconnected) => Err(worker_stopped()),
        };
        self.finish(outcome);
        true
    }

    fn finish(&mut self, outcome: LoadOutcome) {
        self.pending = None;
        self.apply(outcome);
    }

    fn apply(&mut self, outcome: LoadOutcome) {
        self.state = match outcome {
            Ok(dashboard) => {
                debug!(rows = dashboard.transactions.len(), "dashboard loaded");
                ScreenState::Loaded(Arc::new(dashboard))
            }
            Err(err) => {
                warn!(error = %err, "dashboard load failed");
                ScreenState::Failed(failure_message(&err))
            }
        };
    }
}

/// The worker dropped its sender without a result, i.e. it panicked
fn worker_stopped() -> DashboardError {
    DashboardError::Worker("load thread exited without a result".to_string())
}

fn failure_message(err: &DashboardError) -> String {
    if err.is_data_error() {
        format!("Não foi possível ler as transações salvas: {}", err)
    } else {
        format!("Não foi possível carregar o painel: {}", err)
    }
}
