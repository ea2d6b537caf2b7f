//! Driver error types.

use std::fmt;

/// Errors from driver setup and command-stream plumbing.
///
/// Misuse of individual commands is not an error: it is caught by
/// `debug_assert!` in debug builds and logged and ignored in release builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// The requested backend is not compiled in.
    UnsupportedBackend(String),
    /// The render thread could not be started.
    ThreadSpawnFailed(String),
    /// The render thread is gone; nothing more can be submitted.
    RenderThreadDisconnected,
    /// An invalid parameter was provided.
    InvalidParameter(String),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedBackend(name) => write!(f, "unsupported backend: {name}"),
            Self::ThreadSpawnFailed(msg) => write!(f, "failed to spawn render thread: {msg}"),
            Self::RenderThreadDisconnected => write!(f, "render thread disconnected"),
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
        }
    }
}

impl std::error::Error for DriverError {}
