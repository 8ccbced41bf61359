//! # Wavewatch - live wireless and packet capture
//!
//! Wavewatch drives a native capture library (`libnetcapture`) and turns
//! the records it reports through C callbacks into typed events for a
//! consumer: a JSON-lines stream on the command line, or the event bus of
//! a Tauri desktop app.
//!
//! ## Features
//!
//! * Beacon capture - Wireless networks seen on a monitor-mode interface
//! * Packet capture - Per-packet addressing, ports and payload bytes
//! * Interface enumeration - All interfaces or monitor-capable ones only
//!
//! ## Architecture
//!
//! Each capture kind has one session at a time. Starting a session spawns a
//! worker thread that blocks inside the native loop; the library calls back
//! into this crate for every record, the record is copied into an owned
//! event and relayed through the [`capture::RoutingContext`] to whatever
//! [`capture::EventSink`] is bound.
//!
//! Cargo features:
//!
//! * `native` - Link `libnetcapture` and expose [`capture::NativeEngine`]
//! * `desktop` - Tauri commands in [`commands`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wavewatch::prelude::*;
//!
//! let routing = Arc::new(RoutingContext::with_sink(Arc::new(LogSink)));
//! let manager = SessionManager::new(Arc::new(NativeEngine::new()), routing);
//!
//! manager.start_beacon_capture("wlan0mon")?;
//! // ...
//! manager.stop_beacon_capture();
//! ```

/// Capture sessions, native bindings and event routing
pub mod capture;
/// Command-line front-end
pub mod cli;
/// Tauri commands exposed to the desktop frontend
#[cfg(feature = "desktop")]
pub mod commands;
/// Application configuration
pub mod config;
/// Centralized error handling
pub mod error;
/// Logger setup
pub mod logging;
/// Prelude for convenient imports
pub mod prelude;

// Re-export commonly used types
pub use error::{CaptureError, Result};
