//! Command-line front-end.
//!
//! Streams capture events as JSON lines until interrupted. The binary wires
//! a `JsonLinesSink` on stdout and a Ctrl-C handler into [`execute`].

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};

use crate::capture::{
    CaptureKind, EventSink, JsonLinesSink, LogSink, SessionManager, SessionState,
};
use crate::config::AppConfig;
use crate::error::{CaptureError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Live beacon and packet capture
#[derive(Debug, Parser)]
#[command(name = "wavewatch", version, about)]
pub struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level, overrides the configuration
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// How captured events are written
    #[arg(long, global = true, value_enum, default_value = "json")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List capture interfaces
    Interfaces {
        /// Only interfaces that support monitor mode
        #[arg(long)]
        monitor: bool,
    },
    /// Stream wireless networks found in beacon frames
    Beacons {
        /// Monitor-mode interface (defaults to `beacon_interface`)
        interface: Option<String>,
    },
    /// Stream captured packets
    Packets {
        /// Interface to capture on (defaults to `packet_interface`)
        interface: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line on stdout
    Json,
    /// One summary line per event through the logger
    Log,
}

/// The sink capture events are written to for `format`.
pub fn event_sink(format: OutputFormat) -> Arc<dyn EventSink> {
    match format {
        OutputFormat::Json => Arc::new(JsonLinesSink::new(io::stdout())),
        OutputFormat::Log => Arc::new(LogSink),
    }
}

/// Runs `command` against `manager`.
///
/// Listings go to `out`; capture events go to whatever sink the manager's
/// routing context is bound to. Captures run until `shutdown` fires (or its
/// sender is dropped) or the session ends by itself.
pub fn execute<W: Write>(
    command: &Command,
    config: &AppConfig,
    manager: &SessionManager,
    out: &mut W,
    shutdown: &Receiver<()>,
) -> Result<()> {
    match command {
        Command::Interfaces { monitor } => {
            let names = manager.enumerate_interfaces(*monitor || config.monitor_only)?;
            for name in names {
                writeln!(out, "{}", name)?;
            }
            out.flush()?;
            Ok(())
        }
        Command::Beacons { interface } => {
            let interface = resolve_interface(CaptureKind::Beacon, interface, &config.beacon_interface)?;
            stream(manager, CaptureKind::Beacon, &interface, config, shutdown)
        }
        Command::Packets { interface } => {
            let interface = resolve_interface(CaptureKind::Packet, interface, &config.packet_interface)?;
            stream(manager, CaptureKind::Packet, &interface, config, shutdown)
        }
    }
}

fn resolve_interface(
    kind: CaptureKind,
    given: &Option<String>,
    configured: &Option<String>,
) -> Result<String> {
    given
        .clone()
        .or_else(|| configured.clone())
        .ok_or_else(|| {
            CaptureError::Config(format!(
                "no interface given and no {}_interface configured",
                kind
            ))
        })
}

fn stream(
    manager: &SessionManager,
    kind: CaptureKind,
    interface: &str,
    config: &AppConfig,
    shutdown: &Receiver<()>,
) -> Result<()> {
    manager.start(kind, interface)?;

    loop {
        match shutdown.recv_timeout(POLL_INTERVAL) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                info!("Shutdown requested");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                if manager.state(kind).is_terminal() {
                    break;
                }
            }
        }
    }

    manager.stop(kind);
    let mut state = manager.wait_for_terminal(kind, config.stop_timeout());
    if state == SessionState::Running {
        // The first stop may have hit the engine before its loop was armed.
        info!("{} capture still running, stopping again", kind);
        manager.stop(kind);
        state = manager.wait_for_terminal(kind, config.stop_timeout());
    }

    match state {
        SessionState::Errored => {
            let code = manager.status(kind).exit_code.unwrap_or(1);
            Err(CaptureError::NativeEngine { kind, code })
        }
        SessionState::Running => {
            warn!(
                "{} capture did not stop within {} ms",
                kind, config.stop_timeout_ms
            );
            Ok(())
        }
        _ => Ok(()),
    }
}
