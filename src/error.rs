use thiserror::Error;

use crate::capture::marshal::MarshalError;
use crate::capture::session::CaptureKind;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// A session of the same kind is already running
    #[error("{0} capture is already running")]
    SessionAlreadyRunning(CaptureKind),

    /// The blocking native capture call returned a nonzero status
    #[error("{kind} capture ended with native error code {code}")]
    NativeEngine { kind: CaptureKind, code: i32 },

    /// The native interface query failed
    #[error("interface enumeration failed with native error code {code}")]
    InterfaceEnumeration { code: i32 },

    /// Start was called without an interface name
    #[error("interface name must not be empty")]
    EmptyInterfaceName,

    /// The interface name cannot be handed to the native layer
    #[error("interface name {0:?} contains an interior NUL byte")]
    InvalidInterfaceName(String),

    /// Foreign data could not be converted
    #[error("marshalling error: {0}")]
    Marshal(#[from] MarshalError),

    /// Configuration could not be loaded or saved
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors from file operations and worker spawning
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenient Result type alias using `CaptureError`.
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Convert `CaptureError` to a String for Tauri command responses.
impl From<CaptureError> for String {
    fn from(error: CaptureError) -> Self {
        error.to_string()
    }
}
