//! Application state for the desktop front-end.
//!
//! Holds the session manager that every capture command goes through and
//! binds the routing context to the app's event bus.

use std::sync::Arc;

use log::{info, warn};
use tauri::{App, AppHandle, Emitter, Manager, Runtime};

use crate::capture::{CaptureEngine, CaptureEvent, EventSink, RoutingContext, SessionManager};
use crate::config::AppConfig;

/// Shared state managed by Tauri.
pub struct CaptureState {
    /// Owner of both capture sessions
    pub manager: SessionManager,
    /// Settings loaded at startup
    pub config: AppConfig,
}

impl CaptureState {
    pub fn new(manager: SessionManager, config: AppConfig) -> Self {
        Self { manager, config }
    }
}

/// Forwards capture events to the webview as Tauri events.
pub struct TauriSink<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> TauriSink<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }
}

impl<R: Runtime> EventSink for TauriSink<R> {
    fn emit(&self, channel: &str, event: &CaptureEvent) {
        if let Err(e) = self.app.emit(channel, event) {
            warn!("Failed to emit {} event: {}", channel, e);
        }
    }
}

/// Registers the capture state with the Tauri application.
///
/// Events start flowing to the frontend as soon as this returns; anything
/// captured before it is dropped.
pub fn register_state<R: Runtime>(
    app: &mut App<R>,
    engine: Arc<dyn CaptureEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_default()?;
    let sink = Arc::new(TauriSink::new(app.handle().clone()));
    let routing = Arc::new(RoutingContext::with_sink(sink));

    app.manage(CaptureState::new(
        SessionManager::new(engine, routing),
        config,
    ));
    info!("Capture state registered");
    Ok(())
}
