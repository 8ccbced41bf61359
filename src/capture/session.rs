//! Capture session state machine.
//!
//! A session moves `Idle -> Running -> {Stopped, Errored}` and may be
//! started again from either terminal state. Only `Running` rejects a new
//! start. The terminal state is recorded when the blocking native call
//! returns, never before.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::capture::event::{NETWORK_FOUND, PACKET_CAPTURED};
use crate::error::{CaptureError, Result};

/// The two independent capture kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureKind {
    /// Wireless beacon frames on a monitor-mode interface
    Beacon,
    /// Ethernet frames on any interface
    Packet,
}

impl CaptureKind {
    pub const ALL: [CaptureKind; 2] = [CaptureKind::Beacon, CaptureKind::Packet];

    /// Consumer-facing channel carrying this kind's events.
    pub fn channel(&self) -> &'static str {
        match self {
            CaptureKind::Beacon => NETWORK_FOUND,
            CaptureKind::Packet => PACKET_CAPTURED,
        }
    }
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureKind::Beacon => write!(f, "beacon"),
            CaptureKind::Packet => write!(f, "packet"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    /// The native call returned 0
    Stopped,
    /// The native call returned nonzero
    Errored,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Stopped | SessionState::Errored)
    }
}

/// Per-session delivery counters, shared with the record dispatcher.
#[derive(Debug, Default)]
pub struct SessionStats {
    delivered: AtomicU64,
    dropped: AtomicU64,
    skipped: AtomicU64,
}

impl SessionStats {
    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.delivered.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.skipped.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of a session for status queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub kind: CaptureKind,
    pub state: SessionState,
    pub interface: Option<String>,
    pub exit_code: Option<i32>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Local>>,
    pub events_delivered: u64,
    pub events_dropped: u64,
    pub records_skipped: u64,
}

#[derive(Debug)]
struct Lifecycle {
    state: SessionState,
    interface: Option<String>,
    exit_code: Option<i32>,
    error: Option<String>,
    started_at: Option<DateTime<Local>>,
}

/// Lifecycle of one capture kind.
///
/// Owned by the `SessionManager`; the worker thread only calls
/// [`CaptureSession::finish`] once its native call has returned.
#[derive(Debug)]
pub struct CaptureSession {
    kind: CaptureKind,
    lifecycle: Mutex<Lifecycle>,
    changed: Condvar,
    stop_requested: AtomicBool,
    stats: Arc<SessionStats>,
}

impl CaptureSession {
    pub fn new(kind: CaptureKind) -> Self {
        Self {
            kind,
            lifecycle: Mutex::new(Lifecycle {
                state: SessionState::Idle,
                interface: None,
                exit_code: None,
                error: None,
                started_at: None,
            }),
            changed: Condvar::new(),
            stop_requested: AtomicBool::new(false),
            stats: Arc::new(SessionStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<SessionStats> {
        Arc::clone(&self.stats)
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Moves the session to `Running` for `interface`.
    ///
    /// Fails with `SessionAlreadyRunning` and leaves the session untouched
    /// if it is already running. Any previous terminal state and counters
    /// are reset.
    pub fn begin(&self, interface: &str) -> Result<()> {
        let mut lifecycle = self.lock();
        if lifecycle.state == SessionState::Running {
            return Err(CaptureError::SessionAlreadyRunning(self.kind));
        }

        self.stop_requested.store(false, Ordering::SeqCst);
        self.stats.reset();
        *lifecycle = Lifecycle {
            state: SessionState::Running,
            interface: Some(interface.to_string()),
            exit_code: None,
            error: None,
            started_at: Some(Local::now()),
        };
        self.changed.notify_all();

        info!("Started {} capture on {}", self.kind, interface);
        Ok(())
    }

    /// Returns the session to `Idle` after a start that never reached the
    /// worker (for example when spawning the thread failed).
    pub fn abort(&self, reason: &CaptureError) {
        let mut lifecycle = self.lock();
        error!("Failed to start {} capture: {}", self.kind, reason);
        lifecycle.state = SessionState::Idle;
        lifecycle.error = Some(reason.to_string());
        self.changed.notify_all();
    }

    /// Flags a stop request if the session is running.
    ///
    /// Returns `true` when the caller should signal the native engine.
    /// Calling this on an idle or terminated session changes nothing.
    pub fn request_stop(&self) -> bool {
        let lifecycle = self.lock();
        if lifecycle.state != SessionState::Running {
            return false;
        }
        self.stop_requested.store(true, Ordering::SeqCst);
        true
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    /// Records the native call's return code as the terminal state.
    pub fn finish(&self, code: i32) {
        let mut lifecycle = self.lock();
        lifecycle.exit_code = Some(code);

        if code == 0 {
            lifecycle.state = SessionState::Stopped;
            info!("{} capture stopped cleanly", self.kind);
        } else {
            let err = CaptureError::NativeEngine {
                kind: self.kind,
                code,
            };
            error!("{}", err);
            lifecycle.state = SessionState::Errored;
            lifecycle.error = Some(err.to_string());
        }

        info!(
            "{} capture delivered {} events ({} dropped, {} skipped)",
            self.kind,
            self.stats.delivered(),
            self.stats.dropped(),
            self.stats.skipped()
        );
        self.changed.notify_all();
    }

    pub fn status(&self) -> SessionStatus {
        let lifecycle = self.lock();
        SessionStatus {
            kind: self.kind,
            state: lifecycle.state,
            interface: lifecycle.interface.clone(),
            exit_code: lifecycle.exit_code,
            error: lifecycle.error.clone(),
            started_at: lifecycle.started_at,
            events_delivered: self.stats.delivered(),
            events_dropped: self.stats.dropped(),
            records_skipped: self.stats.skipped(),
        }
    }

    /// Blocks until the session is no longer `Running` or `timeout`
    /// elapses, returning the state observed last.
    pub fn wait_while_running(&self, timeout: Duration) -> SessionState {
        let deadline = Instant::now() + timeout;
        let mut lifecycle = self.lock();

        while lifecycle.state == SessionState::Running {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            lifecycle = match self.changed.wait_timeout(lifecycle, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        lifecycle.state
    }

    // Lifecycle updates are single assignments, so a poisoned lock still
    // holds a consistent value.
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        match self.lifecycle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
