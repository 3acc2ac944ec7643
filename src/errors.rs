use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::runtime::TimedOut;

/// Errors reported by a [`crate::Device`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The device did not answer in time.
    #[error("operation timed out")]
    Timeout,

    /// The host name could not be resolved to an address.
    #[error("cannot resolve host {0}")]
    Resolve(String),

    /// A socket operation failed while talking to the device.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The device answered with something the library did not understand.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl DeviceError {
    /// Whether the failure means the device could not be reached at all.
    ///
    /// Timeouts and name resolution failures are reported to the user as
    /// `connection_error` during setup and as "not ready" during entry setup.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, DeviceError::Timeout | DeviceError::Resolve(_))
    }
}

impl From<TimedOut> for DeviceError {
    fn from(_: TimedOut) -> Self {
        DeviceError::Timeout
    }
}

/// All error types that can occur when configuring or running an Aquael light.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The device could not be reached while setting up an entry; retry later.
    #[error("cannot connect to {host}: {source}")]
    NotReady { host: String, source: DeviceError },

    /// A device operation failed in a way that retrying will not fix.
    #[error("device {host} failed: {source}")]
    Device { host: String, source: DeviceError },

    /// The config entry does not exist.
    #[error("config entry {0} not found")]
    EntryNotFound(Uuid),

    /// Failed to serialize data to JSON.
    #[error("failed to dump json: {0:?}")]
    JsonDump(serde_json::Error),

    /// Failed to deserialize JSON data.
    #[error("failed to load json: {0:?}")]
    JsonLoad(serde_json::Error),

    /// Reading or writing the config entry file failed.
    #[error("storage {action} error for {path:?}: {err:?}")]
    Storage {
        action: String,
        path: PathBuf,
        err: std::io::Error,
    },
}

impl Error {
    /// Classify a device failure that happened while setting up an entry.
    pub fn setup(host: &str, source: DeviceError) -> Self {
        if source.is_connection_error() {
            Error::NotReady {
                host: host.to_string(),
                source,
            }
        } else {
            Error::Device {
                host: host.to_string(),
                source,
            }
        }
    }

    /// Create a new storage error
    pub fn storage(action: &str, path: &Path, err: std::io::Error) -> Self {
        Error::Storage {
            action: action.to_string(),
            path: path.to_path_buf(),
            err,
        }
    }

    /// Whether the host should retry setting up the entry later.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Error::NotReady { .. })
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
