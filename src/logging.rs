//! Logger setup.

use std::io::Write;

use env_logger::{Builder, Env};
use log::SetLoggerError;

/// Installs the console logger at `level` unless `RUST_LOG` says otherwise.
///
/// Lines look like `[12:00:01.250] INFO - wavewatch::capture::session: ...`.
pub fn init(level: &str) -> Result<(), SetLoggerError> {
    Builder::from_env(Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}: {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
}
