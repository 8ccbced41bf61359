//! Start capture commands.

use log::info;
use tauri::State;

use crate::commands::state::CaptureState;

/// Starts beacon capture on a monitor-mode interface.
///
/// Found networks arrive on the `network:found` event.
///
/// # Returns
///
/// * `Ok("ok")` - If the capture worker was launched
/// * `Err(String)` - If beacon capture is already running or the name is unusable
#[tauri::command]
pub async fn start_beacon_capture(
    state: State<'_, CaptureState>,
    interface_name: String,
) -> Result<String, String> {
    state.manager.start_beacon_capture(&interface_name)?;
    info!("Beacon capture requested on {}", interface_name);
    Ok("ok".to_string())
}

/// Starts packet capture, emitting on `packet:captured`.
#[tauri::command]
pub async fn start_packet_capture(
    state: State<'_, CaptureState>,
    interface_name: String,
) -> Result<String, String> {
    state.manager.start_packet_capture(&interface_name)?;
    info!("Packet capture requested on {}", interface_name);
    Ok("ok".to_string())
}
