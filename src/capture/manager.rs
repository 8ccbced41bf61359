//! Public start/stop surface for beacon and packet capture.
//!
//! Each kind has its own session and at most one worker thread. Control
//! calls run on the caller's thread and return as soon as the worker is
//! spawned or the engine has been signalled.

use std::ffi::CString;
use std::os::raw::c_int;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info};

use crate::capture::dispatch::RecordDispatcher;
use crate::capture::engine::CaptureEngine;
use crate::capture::routing::RoutingContext;
use crate::capture::session::{CaptureKind, CaptureSession, SessionState, SessionStatus};
use crate::error::{CaptureError, Result};

/// An open native capture for one kind.
///
/// Opening registers the session's dispatcher with the engine; dropping
/// unregisters it, whichever way the worker exits.
struct NativeHandle {
    engine: Arc<dyn CaptureEngine>,
    kind: CaptureKind,
    interface: CString,
}

impl NativeHandle {
    fn open(
        engine: Arc<dyn CaptureEngine>,
        kind: CaptureKind,
        interface: CString,
        dispatcher: Arc<RecordDispatcher>,
    ) -> Self {
        engine.open(kind, dispatcher);
        debug!("Opened native {} handle for {:?}", kind, interface);
        Self {
            engine,
            kind,
            interface,
        }
    }

    /// Blocks in the native capture loop.
    fn run(&self) -> c_int {
        self.engine.run(self.kind, &self.interface)
    }
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        self.engine.close(self.kind);
        debug!("Closed native {} handle", self.kind);
    }
}

struct Slot {
    session: Arc<CaptureSession>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Slot {
    fn new(kind: CaptureKind) -> Self {
        Self {
            session: Arc::new(CaptureSession::new(kind)),
            worker: Mutex::new(None),
        }
    }
}

/// Owns the beacon and packet sessions and their workers.
pub struct SessionManager {
    engine: Arc<dyn CaptureEngine>,
    routing: Arc<RoutingContext>,
    beacon: Slot,
    packet: Slot,
}

impl SessionManager {
    /// Creates a manager delivering through `routing`.
    pub fn new(engine: Arc<dyn CaptureEngine>, routing: Arc<RoutingContext>) -> Self {
        Self {
            engine,
            routing,
            beacon: Slot::new(CaptureKind::Beacon),
            packet: Slot::new(CaptureKind::Packet),
        }
    }

    pub fn start_beacon_capture(&self, interface_name: &str) -> Result<()> {
        self.start(CaptureKind::Beacon, interface_name)
    }

    pub fn stop_beacon_capture(&self) {
        self.stop(CaptureKind::Beacon)
    }

    pub fn start_packet_capture(&self, interface_name: &str) -> Result<()> {
        self.start(CaptureKind::Packet, interface_name)
    }

    pub fn stop_packet_capture(&self) {
        self.stop(CaptureKind::Packet)
    }

    /// Starts a capture of `kind` on `interface_name`.
    ///
    /// Returns once the worker thread is spawned; the capture itself runs
    /// asynchronously. The interface is validated by the native layer, so
    /// an unknown name surfaces as an `Errored` session, not an error here.
    pub fn start(&self, kind: CaptureKind, interface_name: &str) -> Result<()> {
        if interface_name.is_empty() {
            return Err(CaptureError::EmptyInterfaceName);
        }
        let interface = CString::new(interface_name)
            .map_err(|_| CaptureError::InvalidInterfaceName(interface_name.to_string()))?;

        let slot = self.slot(kind);
        slot.session.begin(interface_name)?;

        let mut worker = match slot.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // The previous worker has already recorded its terminal state.
        if let Some(previous) = worker.take() {
            if previous.join().is_err() {
                error!("Previous {} capture worker panicked", kind);
            }
        }

        let dispatcher = Arc::new(RecordDispatcher::new(
            kind,
            Arc::clone(&self.routing),
            slot.session.stats(),
        ));
        let handle = NativeHandle::open(Arc::clone(&self.engine), kind, interface, dispatcher);
        let session = Arc::clone(&slot.session);

        let spawned = thread::Builder::new()
            .name(format!("{}-capture", kind))
            .spawn(move || {
                let code = if session.stop_requested() {
                    info!("{} capture stopped before entering the native loop", kind);
                    0
                } else {
                    handle.run()
                };
                drop(handle);
                session.finish(code);
            });

        match spawned {
            Ok(join) => {
                *worker = Some(join);
                Ok(())
            }
            Err(e) => {
                let err = CaptureError::Io(e);
                slot.session.abort(&err);
                Err(err)
            }
        }
    }

    /// Requests that the running capture of `kind` ends.
    ///
    /// Returns immediately. Calling it when nothing of that kind is running
    /// does nothing.
    ///
    /// A stop issued before the worker enters the native call is always
    /// honoured. One issued after that but before the engine has armed its
    /// capture loop can be lost, since the native stop functions ignore
    /// calls without an active handle; the session then stays `Running`
    /// until `stop` is called again.
    pub fn stop(&self, kind: CaptureKind) {
        if self.slot(kind).session.request_stop() {
            info!("Stopping {} capture", kind);
            self.engine.interrupt(kind);
        } else {
            debug!("No running {} capture to stop", kind);
        }
    }

    /// Lists capture interfaces in native order.
    ///
    /// Zero interfaces is an empty list; a failed query is an
    /// `InterfaceEnumeration` error.
    pub fn enumerate_interfaces(&self, monitor_only: bool) -> Result<Vec<String>> {
        let list = self.engine.interfaces(monitor_only)?;
        debug!("Decoding {} native interface names", list.count());
        let names = list.decode()?;
        info!(
            "Number of {}interfaces found: {}",
            if monitor_only { "monitor-capable " } else { "" },
            names.len()
        );
        Ok(names)
    }

    pub fn status(&self, kind: CaptureKind) -> SessionStatus {
        self.slot(kind).session.status()
    }

    pub fn state(&self, kind: CaptureKind) -> SessionState {
        self.slot(kind).session.state()
    }

    /// Waits up to `timeout` for `kind` to leave `Running`.
    ///
    /// Never cancels the worker; a capture whose native loop ignores the
    /// stop request, or whose stop was lost before the loop was armed (see
    /// [`SessionManager::stop`]), is still `Running` when this returns.
    pub fn wait_for_terminal(&self, kind: CaptureKind, timeout: Duration) -> SessionState {
        self.slot(kind).session.wait_while_running(timeout)
    }

    fn slot(&self, kind: CaptureKind) -> &Slot {
        match kind {
            CaptureKind::Beacon => &self.beacon,
            CaptureKind::Packet => &self.packet,
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        for kind in CaptureKind::ALL {
            self.stop(kind);
        }
    }
}
