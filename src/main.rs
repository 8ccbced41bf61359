#![warn(clippy::all)]

use std::io;
use std::process::ExitCode;
use std::sync::mpsc;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};

use wavewatch::capture::{NativeEngine, RoutingContext, SessionManager};
use wavewatch::cli::{self, Cli};
use wavewatch::config::AppConfig;
use wavewatch::logging;

/// Main entry point for the wavewatch command line
fn main() -> ExitCode {
    let args = Cli::parse();

    let config = match &args.config {
        Some(path) => AppConfig::load(path),
        None => AppConfig::load_default(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = args.log_level.as_deref().unwrap_or(&config.log_level);
    if let Err(e) = logging::init(level) {
        eprintln!("Failed to initialize logger: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Wavewatch starting up");

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    }) {
        error!("Failed to install Ctrl-C handler: {}", e);
        return ExitCode::FAILURE;
    }

    let routing = Arc::new(RoutingContext::with_sink(cli::event_sink(args.format)));
    let manager = SessionManager::new(Arc::new(NativeEngine::new()), routing);

    let mut out = io::stdout();
    match cli::execute(&args.command, &config, &manager, &mut out, &shutdown_rx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("wavewatch: {}", e);
            ExitCode::FAILURE
        }
    }
}
