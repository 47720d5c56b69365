//! Driver adapter traits
//!
//! [`PrinterDriver`] isolates callers from the physical transport: one
//! driver per transport (USB, network), each handing out exclusive
//! per-session [`PrinterConnection`]s. Swapping printer hardware means
//! swapping only the driver implementation.

use crate::command::PrintCommand;
use crate::error::PrintResult;
use async_trait::async_trait;

/// Feature support of a driver, fixed at construction.
///
/// Not every printer model executes every ESC/POS primitive; callers
/// consult these flags before attempting optional commands instead of
/// probing with trial writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// GS ! character scaling
    pub size: bool,
    /// Column table layout
    pub table: bool,
}

impl Capabilities {
    pub const fn full() -> Self {
        Self {
            size: true,
            table: true,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::full()
    }
}

/// Trait for printer drivers
#[async_trait]
pub trait PrinterDriver: Send + Sync {
    /// Short transport name for logs and status messages
    fn name(&self) -> &str;

    /// Feature support of the underlying printer
    fn capabilities(&self) -> Capabilities;

    /// Acquire exclusive access to the device.
    ///
    /// The returned connection is initialized and ready for commands.
    async fn open(&self) -> PrintResult<Box<dyn PrinterConnection>>;

    /// Check if the printer is reachable without printing anything
    async fn is_online(&self) -> bool;
}

/// One open device session.
///
/// Connections are single-owner: exactly one job writes to the device
/// until [`PrinterConnection::close`] releases it.
#[async_trait]
pub trait PrinterConnection: Send {
    /// Execute a single print command
    async fn write(&mut self, command: &PrintCommand) -> PrintResult<()>;

    /// Feed and cut the paper
    async fn cut(&mut self) -> PrintResult<()>;

    /// Release the device
    async fn close(self: Box<Self>) -> PrintResult<()>;
}
