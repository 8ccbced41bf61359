//! Capture sessions and the native-to-consumer event relay.
//!
//! This module contains the session lifecycle management, the conversion
//! of native records into events, and their routing to the consumer.

pub mod dispatch;
pub mod engine;
pub mod event;
pub mod ffi;
pub mod manager;
pub mod marshal;
pub mod routing;
pub mod session;
pub mod sink;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use engine::{CaptureEngine, InterfaceList};
pub use event::{BeaconEvent, CaptureEvent, PacketEvent, NETWORK_FOUND, PACKET_CAPTURED};
pub use manager::SessionManager;
pub use routing::{EventSink, RoutingContext};
pub use session::{CaptureKind, SessionState, SessionStatus};
pub use sink::{JsonLinesSink, LogSink, RecordingSink};

#[cfg(feature = "native")]
pub use ffi::NativeEngine;
