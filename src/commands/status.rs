//! Status and query commands.

use log::debug;
use tauri::State;

use crate::capture::{CaptureKind, SessionStatus};
use crate::commands::state::CaptureState;

/// Lists capture interfaces.
///
/// `monitor` restricts the list to interfaces that support monitor mode;
/// the configured `monitor_only` setting forces it.
#[tauri::command]
pub async fn get_interfaces(
    state: State<'_, CaptureState>,
    monitor: bool,
) -> Result<Vec<String>, String> {
    let monitor_only = monitor || state.config.monitor_only;
    let names = state.manager.enumerate_interfaces(monitor_only)?;
    debug!("Returning {} interfaces to the frontend", names.len());
    Ok(names)
}

/// Gets the status of both capture sessions, beacon first.
#[tauri::command]
pub async fn get_capture_status(
    state: State<'_, CaptureState>,
) -> Result<Vec<SessionStatus>, String> {
    Ok(CaptureKind::ALL
        .iter()
        .map(|kind| state.manager.status(*kind))
        .collect())
}
