//! # kasir-printer
//!
//! ESC/POS thermal printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - The [`PrintCommand`] vocabulary shared by renderers and drivers
//! - ESC/POS command building
//! - GB18030 encoding for text output
//! - USB printing (libusb bulk transfer)
//! - Network printing (TCP port 9100)
//!
//! Business logic (WHAT to print) stays in application code: receipt
//! rendering and print-job orchestration live in `kasir-server`.
//!
//! ## Example
//!
//! ```ignore
//! use kasir_printer::{PrintCommand, PrinterDriver, UsbPrinter, UsbPrinterConfig};
//!
//! let driver = UsbPrinter::new(UsbPrinterConfig::default())?;
//! let mut conn = driver.open().await?;
//! conn.write(&PrintCommand::Text("Terima kasih".into())).await?;
//! conn.cut().await?;
//! conn.close().await?;
//! ```

mod command;
mod driver;
pub mod encoding;
mod error;
mod escpos;
mod net;
mod usb;

// Re-exports
pub use command::{Align, Column, Font, PrintCommand, Style};
pub use driver::{Capabilities, PrinterConnection, PrinterDriver};
pub use encoding::{convert_to_gb18030, pad_width, text_width, truncate_chars, truncate_width};
pub use error::{PrintError, PrintResult};
pub use escpos::EscPosBuilder;
pub use net::NetworkPrinter;
pub use usb::{UsbPrinter, UsbPrinterConfig};
