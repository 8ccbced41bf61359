//! C ABI boundary with the native capture engine.
//!
//! The engine reports records through two exported callbacks that carry no
//! user data, so they have to find their consumer through process-wide
//! state. This module holds the only such state: one dispatcher slot per
//! capture kind, filled by [`install`] while a session of that kind is open
//! and emptied by [`remove`]. The slot forwards into the injected
//! [`RecordDispatcher`], which in turn routes through the session's
//! `RoutingContext`. One consumer per kind and process is a constraint of
//! the native interface.
//!
//! With the `native` feature the `extern "C"` declarations of the engine
//! library are linked and exposed through [`NativeEngine`].

use std::os::raw::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;
use log::error;

use crate::capture::dispatch::{RawPacketRecord, RecordDispatcher};
use crate::capture::session::CaptureKind;

#[derive(Default)]
struct Routes {
    beacon: Option<Arc<RecordDispatcher>>,
    packet: Option<Arc<RecordDispatcher>>,
}

impl Routes {
    fn slot(&mut self, kind: CaptureKind) -> &mut Option<Arc<RecordDispatcher>> {
        match kind {
            CaptureKind::Beacon => &mut self.beacon,
            CaptureKind::Packet => &mut self.packet,
        }
    }
}

lazy_static! {
    static ref ROUTES: RwLock<Routes> = RwLock::new(Routes::default());
}

/// Points `kind`'s native callback at `dispatcher`.
pub fn install(kind: CaptureKind, dispatcher: Arc<RecordDispatcher>) {
    let mut routes = match ROUTES.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *routes.slot(kind) = Some(dispatcher);
}

/// Disconnects `kind`'s native callback.
pub fn remove(kind: CaptureKind) {
    let mut routes = match ROUTES.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    routes.slot(kind).take();
}

fn route(kind: CaptureKind) -> Option<Arc<RecordDispatcher>> {
    let routes = match ROUTES.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    match kind {
        CaptureKind::Beacon => routes.beacon.clone(),
        CaptureKind::Packet => routes.packet.clone(),
    }
}

/// Called by the engine for every beacon frame.
///
/// # Safety
///
/// The string arguments must be NUL-terminated and valid for the call.
#[no_mangle]
pub unsafe extern "C" fn on_network_found(
    ssid: *mut c_char,
    bssid: *mut c_char,
    channel: c_int,
    frequency: c_int,
    signal_strength: c_int,
) {
    let Some(dispatcher) = route(CaptureKind::Beacon) else {
        return;
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        dispatcher.beacon_record(ssid, bssid, channel, frequency, signal_strength)
    }));
    if outcome.is_err() {
        error!("Beacon event consumer panicked; record discarded");
    }
}

/// Called by the engine for every captured packet.
///
/// # Safety
///
/// The string arguments must be NUL-terminated and valid for the call;
/// `payload` must hold `payload_length` bytes or be null with length 0.
#[no_mangle]
pub unsafe extern "C" fn on_packet_captured(
    src_mac: *mut c_char,
    dest_mac: *mut c_char,
    eth_type: *mut c_char,
    src_ipv4: *mut c_char,
    dest_ipv4: *mut c_char,
    src_ipv6: *mut c_char,
    dest_ipv6: *mut c_char,
    src_port: c_int,
    dest_port: c_int,
    payload: *mut c_char,
    payload_length: c_int,
) {
    let Some(dispatcher) = route(CaptureKind::Packet) else {
        return;
    };

    let record = RawPacketRecord {
        src_mac,
        dest_mac,
        eth_type,
        src_ipv4,
        dest_ipv4,
        src_ipv6,
        dest_ipv6,
        src_port,
        dest_port,
        payload: payload as *const u8,
        payload_length,
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| dispatcher.packet_record(record)));
    if outcome.is_err() {
        error!("Packet event consumer panicked; record discarded");
    }
}

#[cfg(feature = "native")]
pub use native::NativeEngine;

#[cfg(feature = "native")]
mod native {
    use std::ffi::CStr;
    use std::os::raw::{c_char, c_int};
    use std::ptr;
    use std::sync::Arc;

    use log::{debug, info};

    use super::{install, remove};
    use crate::capture::dispatch::RecordDispatcher;
    use crate::capture::engine::{CaptureEngine, InterfaceList, ReleaseFn};
    use crate::capture::session::CaptureKind;
    use crate::error::{CaptureError, Result};

    extern "C" {
        fn get_all_interfaces(interfaces: *mut *mut *mut c_char, count: *mut c_int) -> c_int;
        fn free_all_interfaces(interfaces: *mut *mut c_char, count: c_int) -> c_int;
        fn get_monitor_interfaces(interfaces: *mut *mut *mut c_char, count: *mut c_int) -> c_int;
        fn free_monitor_interfaces(interfaces: *mut *mut c_char, count: c_int) -> c_int;

        fn start_capture(interface_name: *const c_char) -> c_int;
        fn stop_capture() -> c_int;
        fn start_packet_capture(interface_name: *const c_char) -> c_int;
        fn stop_packet_capture() -> c_int;
    }

    /// The linked libpcap-based engine (`libnetcapture`).
    ///
    /// The library keeps one active capture handle per kind in C statics,
    /// so a process should create a single `NativeEngine`.
    #[derive(Debug, Default)]
    pub struct NativeEngine {
        _private: (),
    }

    impl NativeEngine {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl CaptureEngine for NativeEngine {
        fn interfaces(&self, monitor_only: bool) -> Result<InterfaceList> {
            let mut items: *mut *mut c_char = ptr::null_mut();
            let mut count: c_int = 0;

            let (status, release): (c_int, ReleaseFn) = unsafe {
                if monitor_only {
                    (
                        get_monitor_interfaces(&mut items, &mut count),
                        free_monitor_interfaces as ReleaseFn,
                    )
                } else {
                    (
                        get_all_interfaces(&mut items, &mut count),
                        free_all_interfaces as ReleaseFn,
                    )
                }
            };

            if status != 0 {
                return Err(CaptureError::InterfaceEnumeration { code: status });
            }
            debug!("Native layer reported {} interfaces", count);
            // SAFETY: on success the library filled `items` with `count`
            // strings allocated for the matching free function.
            Ok(unsafe { InterfaceList::from_raw(items, count, release) })
        }

        fn open(&self, kind: CaptureKind, dispatcher: Arc<RecordDispatcher>) {
            install(kind, dispatcher);
        }

        fn run(&self, kind: CaptureKind, interface: &CStr) -> c_int {
            info!("Entering native {} capture loop", kind);
            // SAFETY: `interface` outlives the blocking call.
            unsafe {
                match kind {
                    CaptureKind::Beacon => start_capture(interface.as_ptr()),
                    CaptureKind::Packet => start_packet_capture(interface.as_ptr()),
                }
            }
        }

        fn interrupt(&self, kind: CaptureKind) {
            // SAFETY: both stop functions only break an active pcap loop and
            // are documented as callable from any thread.
            unsafe {
                match kind {
                    CaptureKind::Beacon => stop_capture(),
                    CaptureKind::Packet => stop_packet_capture(),
                };
            }
        }

        fn close(&self, kind: CaptureKind) {
            remove(kind);
        }
    }
}
