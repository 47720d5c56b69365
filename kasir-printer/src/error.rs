//! Error types for the printer library

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Driver layer itself could not be initialized (libusb context,
    /// missing platform support). Not retryable until operator action.
    #[error("Printer driver unavailable: {0}")]
    DriverUnavailable(String),

    /// No matching device found, or the device disappeared. Retryable
    /// after physically reconnecting.
    #[error("Printer device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Another session holds the device. Retryable.
    #[error("Printer device busy: {0}")]
    DeviceBusy(String),

    /// The connected printer cannot execute this specific command.
    /// Non-fatal: callers skip the command and continue.
    #[error("Unsupported print command: {0}")]
    WriteUnsupported(String),

    /// IO failure in the middle of a write. Fatal for the job.
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Cut failed: {0}")]
    CutFailed(String),

    #[error("Close failed: {0}")]
    CloseFailed(String),

    /// Timeout waiting for the printer
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// IO error during printing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
