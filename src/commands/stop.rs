//! Stop capture commands.
//!
//! Stopping only signals the native loop. The session reaches `stopped`
//! once the worker returns; poll `get_capture_status` to observe it.

use tauri::State;

use crate::commands::state::CaptureState;

/// Requests the beacon capture loop to end. A no-op when idle.
#[tauri::command]
pub async fn stop_beacon_capture(state: State<'_, CaptureState>) -> Result<(), String> {
    state.manager.stop_beacon_capture();
    Ok(())
}

#[tauri::command]
pub async fn stop_packet_capture(state: State<'_, CaptureState>) -> Result<(), String> {
    state.manager.stop_packet_capture();
    Ok(())
}
