//! Receipt Printing Module
//!
//! Everything between a stored transaction and paper coming out of the
//! printer:
//! - [`types`]: read-only snapshots of transactions and settings
//! - [`renderer`]: pure transaction -> command-sequence formatting
//! - [`session`]: per-copy open/write/cut/close state machine
//! - [`service`]: request orchestration and HTTP error mapping

pub mod renderer;
pub mod service;
pub mod session;
pub mod types;

pub use renderer::ReceiptRenderer;
pub use service::{PrintService, PrinterStatus};
pub use session::{PrintController, PrintJobError, SessionPhase};
pub use types::*;
