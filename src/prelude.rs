//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types and traits from the crate,
//! allowing users to import everything they need with a single use statement:
//!
//! ```rust
//! use wavewatch::prelude::*;
//! ```

// Error handling
pub use crate::error::{CaptureError, Result};

// Sessions
pub use crate::capture::{CaptureKind, SessionManager, SessionState, SessionStatus};

// Events and routing
pub use crate::capture::{
    BeaconEvent, CaptureEvent, EventSink, PacketEvent, RoutingContext, NETWORK_FOUND,
    PACKET_CAPTURED,
};

// Sinks
pub use crate::capture::{JsonLinesSink, LogSink, RecordingSink};

// Engine seam
pub use crate::capture::{CaptureEngine, InterfaceList};

#[cfg(feature = "native")]
pub use crate::capture::NativeEngine;

// Configuration
pub use crate::config::AppConfig;
