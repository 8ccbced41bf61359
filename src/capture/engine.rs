//! Interface to the native capture engine.
//!
//! The engine performs the actual frame capture and low-level parsing.
//! Captures are blocking calls that report each record through the
//! [`RecordDispatcher`] registered with [`CaptureEngine::open`] and return
//! a status code once the engine's loop ends.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::sync::Arc;

use crate::capture::dispatch::RecordDispatcher;
use crate::capture::marshal::{self, MarshalError};
use crate::capture::session::CaptureKind;
use crate::error::Result;

/// Native function that frees an interface array.
pub type ReleaseFn = unsafe extern "C" fn(*mut *mut c_char, c_int) -> c_int;

/// Operations the native capture engine has to provide.
pub trait CaptureEngine: Send + Sync {
    /// Lists interfaces, only monitor-capable ones when `monitor_only`.
    ///
    /// A nonzero native status is `CaptureError::InterfaceEnumeration`.
    fn interfaces(&self, monitor_only: bool) -> Result<InterfaceList>;

    /// Registers the dispatcher that receives `kind`'s records.
    fn open(&self, kind: CaptureKind, dispatcher: Arc<RecordDispatcher>);

    /// Runs the blocking capture loop for `kind` on `interface`.
    ///
    /// Returns 0 on a clean stop and nonzero on failure.
    fn run(&self, kind: CaptureKind, interface: &CStr) -> c_int;

    /// Asks a running capture loop to return. Must be safe to call from any
    /// thread and when nothing is running.
    fn interrupt(&self, kind: CaptureKind);

    /// Unregisters `kind`'s dispatcher. Records arriving afterwards are
    /// discarded.
    fn close(&self, kind: CaptureKind);
}

/// Interface name array owned by the native layer.
///
/// The array is handed back to its release function when dropped, on
/// success and error paths alike.
pub struct InterfaceList {
    items: *mut *mut c_char,
    count: c_int,
    release: ReleaseFn,
}

impl InterfaceList {
    /// Takes ownership of a native interface array.
    ///
    /// # Safety
    ///
    /// `items` must be null or point to `count` NUL-terminated strings, and
    /// `release` must be the function that frees exactly this allocation.
    pub unsafe fn from_raw(items: *mut *mut c_char, count: c_int, release: ReleaseFn) -> Self {
        Self {
            items,
            count,
            release,
        }
    }

    /// Number of entries reported by the native layer.
    pub fn count(&self) -> c_int {
        self.count
    }

    /// Copies the names out in native order.
    pub fn decode(&self) -> std::result::Result<Vec<String>, MarshalError> {
        // SAFETY: `from_raw` guarantees `items` holds `count` valid strings
        // until this list is dropped.
        unsafe { marshal::decode_string_array(self.items as *const *const c_char, self.count) }
    }
}

impl Drop for InterfaceList {
    fn drop(&mut self) {
        if self.items.is_null() {
            return;
        }
        // SAFETY: the allocation is released once, with its own release
        // function, and never read afterwards.
        unsafe {
            (self.release)(self.items, self.count);
        }
    }
}
