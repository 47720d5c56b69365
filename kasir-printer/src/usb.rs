//! USB printer driver
//!
//! Talks ESC/POS directly to a USB thermal printer through libusb bulk
//! transfers. Device selection matches an explicit vendor/product id
//! when configured, otherwise the first printer-class interface found.

use crate::command::PrintCommand;
use crate::driver::{Capabilities, PrinterConnection, PrinterDriver};
use crate::error::{PrintError, PrintResult};
use crate::escpos::EscPosBuilder;
use async_trait::async_trait;
use rusb::{Context, Device, Direction, TransferType, UsbContext};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// USB base class code for printers
const USB_CLASS_PRINTER: u8 = 0x07;

/// ESC @ - initialize printer
const INIT: [u8; 2] = [0x1B, 0x40];

/// USB printer configuration
#[derive(Debug, Clone)]
pub struct UsbPrinterConfig {
    /// Match a specific device; `None` selects the first printer-class
    /// interface on the bus.
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
    /// Per-transfer timeout
    pub timeout: Duration,
    /// Paper width in characters (32 for 58mm, 48 for 80mm)
    pub width: usize,
}

impl Default for UsbPrinterConfig {
    fn default() -> Self {
        Self {
            vendor_id: None,
            product_id: None,
            timeout: Duration::from_secs(5),
            width: 32,
        }
    }
}

/// USB printer driver (libusb)
pub struct UsbPrinter {
    context: Context,
    config: UsbPrinterConfig,
}

impl UsbPrinter {
    /// Initialize the libusb context.
    ///
    /// Failure here means the driver layer itself is unusable, reported
    /// as [`PrintError::DriverUnavailable`] and distinct from any later
    /// device lookup failure.
    pub fn new(config: UsbPrinterConfig) -> PrintResult<Self> {
        let context = Context::new()
            .map_err(|e| PrintError::DriverUnavailable(format!("libusb init failed: {e}")))?;
        Ok(Self { context, config })
    }

    fn find_device(context: &Context, config: &UsbPrinterConfig) -> PrintResult<(Device<Context>, u8, u8)> {
        let devices = context
            .devices()
            .map_err(|e| PrintError::DeviceUnavailable(format!("USB enumeration failed: {e}")))?;

        let filtered = config.vendor_id.is_some() || config.product_id.is_some();
        for device in devices.iter() {
            let Ok(descriptor) = device.device_descriptor() else {
                continue;
            };
            if let Some(vid) = config.vendor_id
                && descriptor.vendor_id() != vid
            {
                continue;
            }
            if let Some(pid) = config.product_id
                && descriptor.product_id() != pid
            {
                continue;
            }
            // Without an explicit id the interface class must identify the
            // device as a printer; with one, any bulk-out endpoint will do
            // (some printers report a vendor-specific class).
            if let Some((interface, endpoint)) = bulk_out_endpoint(&device, !filtered) {
                return Ok((device, interface, endpoint));
            }
        }

        Err(PrintError::DeviceUnavailable(
            "no USB printer found; check cable, power and device ids".into(),
        ))
    }

    fn open_blocking(context: Context, config: UsbPrinterConfig) -> PrintResult<UsbConnection> {
        let (device, interface, endpoint) = Self::find_device(&context, &config)?;
        let vendor_id = device
            .device_descriptor()
            .map(|d| d.vendor_id())
            .unwrap_or(0);

        let handle = device.open().map_err(map_open_error)?;

        // Not supported on all platforms; claiming still works without it
        let _ = handle.set_auto_detach_kernel_driver(true);

        handle.claim_interface(interface).map_err(|e| match e {
            rusb::Error::Busy => {
                PrintError::DeviceBusy("USB interface already claimed by another process".into())
            }
            other => map_open_error(other),
        })?;

        handle
            .write_bulk(endpoint, &INIT, config.timeout)
            .map_err(|e| PrintError::WriteFailed(format!("printer init failed: {e}")))?;

        info!(vendor_id, interface, endpoint, "USB printer opened");

        Ok(UsbConnection {
            handle: Arc::new(handle),
            interface,
            endpoint,
            timeout: config.timeout,
            width: config.width,
        })
    }
}

#[async_trait]
impl PrinterDriver for UsbPrinter {
    fn name(&self) -> &str {
        "usb"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::full()
    }

    #[instrument(skip(self))]
    async fn open(&self) -> PrintResult<Box<dyn PrinterConnection>> {
        let context = self.context.clone();
        let config = self.config.clone();
        let conn = tokio::task::spawn_blocking(move || Self::open_blocking(context, config))
            .await
            .map_err(|e| PrintError::DeviceUnavailable(format!("open task join failed: {e}")))??;
        Ok(Box::new(conn))
    }

    #[instrument(skip(self))]
    async fn is_online(&self) -> bool {
        let context = self.context.clone();
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || Self::find_device(&context, &config).is_ok())
            .await
            .unwrap_or(false)
    }
}

/// Map libusb open/claim errors onto the printer error taxonomy,
/// with remediation hints for the common driver-mismatch case.
fn map_open_error(e: rusb::Error) -> PrintError {
    match e {
        rusb::Error::Busy => PrintError::DeviceBusy("USB device busy".into()),
        rusb::Error::Access => PrintError::DeviceUnavailable(
            "USB access denied; install a WinUSB driver (Zadig) on Windows or add a udev rule on Linux"
                .into(),
        ),
        rusb::Error::NoDevice | rusb::Error::NotFound => {
            PrintError::DeviceUnavailable(format!("USB device gone: {e}"))
        }
        other => PrintError::DeviceUnavailable(other.to_string()),
    }
}

/// One claimed USB interface
pub struct UsbConnection {
    handle: Arc<rusb::DeviceHandle<Context>>,
    interface: u8,
    endpoint: u8,
    timeout: Duration,
    width: usize,
}

impl UsbConnection {
    /// Bulk-write the full buffer, off the async executor.
    async fn send(&self, data: Vec<u8>) -> PrintResult<()> {
        let handle = Arc::clone(&self.handle);
        let endpoint = self.endpoint;
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || {
            let mut offset = 0;
            while offset < data.len() {
                let written = handle
                    .write_bulk(endpoint, &data[offset..], timeout)
                    .map_err(|e| match e {
                        rusb::Error::Timeout => {
                            PrintError::Timeout(format!("USB write timed out after {timeout:?}"))
                        }
                        rusb::Error::NoDevice => {
                            PrintError::WriteFailed("USB device disconnected mid-write".into())
                        }
                        other => PrintError::WriteFailed(other.to_string()),
                    })?;
                if written == 0 {
                    return Err(PrintError::WriteFailed("USB bulk write stalled".into()));
                }
                offset += written;
            }
            Ok(())
        })
        .await
        .map_err(|e| PrintError::WriteFailed(format!("write task join failed: {e}")))?
    }
}

#[async_trait]
impl PrinterConnection for UsbConnection {
    async fn write(&mut self, command: &PrintCommand) -> PrintResult<()> {
        let mut b = EscPosBuilder::bare(self.width);
        b.push_command(command);
        self.send(b.build()).await
    }

    async fn cut(&mut self) -> PrintResult<()> {
        let mut b = EscPosBuilder::bare(self.width);
        b.push_command(&PrintCommand::Cut);
        self.send(b.build())
            .await
            .map_err(|e| PrintError::CutFailed(e.to_string()))
    }

    async fn close(self: Box<Self>) -> PrintResult<()> {
        let handle = Arc::clone(&self.handle);
        let interface = self.interface;
        tokio::task::spawn_blocking(move || {
            handle.release_interface(interface).map_err(|e| match e {
                rusb::Error::NoDevice | rusb::Error::NotFound => PrintError::CloseFailed(
                    "USB device not found while closing; replug the printer and check the driver"
                        .into(),
                ),
                other => PrintError::CloseFailed(other.to_string()),
            })
        })
        .await
        .map_err(|e| PrintError::CloseFailed(format!("close task join failed: {e}")))?
    }
}

fn bulk_out_endpoint(device: &Device<Context>, require_printer_class: bool) -> Option<(u8, u8)> {
    let config = device.active_config_descriptor().ok()?;
    for interface in config.interfaces() {
        for descriptor in interface.descriptors() {
            if require_printer_class && descriptor.class_code() != USB_CLASS_PRINTER {
                continue;
            }
            for endpoint in descriptor.endpoint_descriptors() {
                if endpoint.direction() == Direction::Out
                    && endpoint.transfer_type() == TransferType::Bulk
                {
                    return Some((descriptor.interface_number(), endpoint.address()));
                }
            }
        }
    }
    if require_printer_class {
        warn!("device has no printer-class interface");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UsbPrinterConfig::default();
        assert_eq!(config.width, 32);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.vendor_id.is_none());
    }

    #[test]
    fn test_open_error_mapping() {
        assert!(matches!(
            map_open_error(rusb::Error::Busy),
            PrintError::DeviceBusy(_)
        ));
        assert!(matches!(
            map_open_error(rusb::Error::NoDevice),
            PrintError::DeviceUnavailable(_)
        ));
        // Access errors carry the driver-mismatch hint
        match map_open_error(rusb::Error::Access) {
            PrintError::DeviceUnavailable(msg) => assert!(msg.contains("Zadig")),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }
}
