use std::{io, path::PathBuf, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type for the crate.
pub type Result<T> = StdResult<T, Error>;

/// Errors raised while interpreting a script or touching the device or store.
///
/// Cancellation is deliberately absent: a stopped execution is an
/// [`Outcome`](crate::engine::Outcome), not an error.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed command arguments, e.g. a `RAW` line with a missing or non-numeric value.
    #[error("{0}")]
    Parse(String),

    /// The interpreter state does not allow the command, e.g. `REPEAT` with nothing to repeat.
    #[error("{0}")]
    State(String),

    /// Opening or writing the HID device failed.
    #[error("Failed to write to HID device {}: {source}", .path.display())]
    DeviceIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Another execution already owns the device.
    #[error("Device {} is busy with another script", .0.display())]
    Busy(PathBuf),

    /// The script store file could not be read or written.
    #[error("Script store {} is not accessible: {source}", .path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn device(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::DeviceIo {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn store(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Store {
            path: path.into(),
            source,
        }
    }
}
