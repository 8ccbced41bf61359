//! Tauri command handlers.
//!
//! This module contains the commands exposed to the desktop frontend,
//! organized into submodules by functionality.

pub mod start;
pub mod state;
pub mod status;
pub mod stop;

pub use state::{register_state, CaptureState, TauriSink};

pub use start::{
    __cmd__start_beacon_capture, __cmd__start_packet_capture, start_beacon_capture,
    start_packet_capture,
};
pub use status::{
    __cmd__get_capture_status, __cmd__get_interfaces, get_capture_status, get_interfaces,
};
pub use stop::{
    __cmd__stop_beacon_capture, __cmd__stop_packet_capture, stop_beacon_capture,
    stop_packet_capture,
};
