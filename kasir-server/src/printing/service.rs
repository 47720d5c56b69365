//! Receipt print service - ties storage, renderer and driver together
//!
//! One service instance per server. Holds the driver slot (or the
//! construction failure when the printing stack never came up), the
//! collaborator handles, and the session controller.

use std::sync::Arc;
use std::time::Duration;

use kasir_printer::{PrintError, PrinterDriver};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use super::renderer::ReceiptRenderer;
use super::session::{PrintController, PrintJobError};
use super::types::{
    LineItem, ReceiptSettings, SettingsLookup, TransactionSnapshot, TransactionSource,
    clamp_copies,
};
use crate::utils::{AppError, AppResult};

/// Printer availability report
#[derive(Debug, Serialize)]
pub struct PrinterStatus {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A constructed driver plus its session controller
struct ReadyPrinter {
    driver: Arc<dyn PrinterDriver>,
    controller: PrintController,
}

/// Receipt print service
///
/// Responsibilities:
/// - Resolve transactions and settings for a print request
/// - Run print jobs through the session controller
/// - Map job failures onto HTTP-facing errors
pub struct PrintService {
    printer: Result<ReadyPrinter, String>,
    transactions: Arc<dyn TransactionSource>,
    settings: Arc<dyn SettingsLookup>,
}

impl PrintService {
    /// Create the service.
    ///
    /// `driver` carries the driver construction result; on `Err` the
    /// service still answers requests, reporting the stored reason.
    pub fn new(
        driver: Result<Arc<dyn PrinterDriver>, String>,
        transactions: Arc<dyn TransactionSource>,
        settings: Arc<dyn SettingsLookup>,
        renderer: ReceiptRenderer,
        copy_delay: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let printer = driver.map(|driver| ReadyPrinter {
            driver: Arc::clone(&driver),
            controller: PrintController::new(driver, renderer, copy_delay, cancel),
        });
        Self {
            printer,
            transactions,
            settings,
        }
    }

    /// Print a stored transaction.
    ///
    /// `copies` falls back to the operator's `printCopies` setting;
    /// either way the count is clamped to the supported range.
    #[instrument(skip(self))]
    pub async fn print_transaction(&self, id: u64, copies: Option<u32>) -> AppResult<u32> {
        let printer = self.ready_printer()?;

        let tx = self
            .transactions
            .transaction(id)
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {id}")))?;

        // One settings snapshot per request, reused across copies
        let settings = self.settings_snapshot();
        let copies = copies
            .map(|n| clamp_copies(n as i64))
            .unwrap_or(settings.print_copies);

        printer
            .controller
            .print(&tx, &settings, copies)
            .await
            .map_err(map_job_error)
    }

    /// Print a fixed sample receipt to verify the whole chain
    #[instrument(skip(self))]
    pub async fn print_test_page(&self) -> AppResult<()> {
        let printer = self.ready_printer()?;
        let settings = self.settings_snapshot();

        printer
            .controller
            .print(&sample_transaction(), &settings, 1)
            .await
            .map_err(map_job_error)?;
        Ok(())
    }

    /// Report printer availability without attempting a print
    pub async fn printer_status(&self) -> PrinterStatus {
        match &self.printer {
            Err(reason) => PrinterStatus {
                available: false,
                message: Some(reason.clone()),
            },
            Ok(printer) => {
                if printer.driver.is_online().await {
                    PrinterStatus {
                        available: true,
                        message: None,
                    }
                } else {
                    PrinterStatus {
                        available: false,
                        message: Some(format!(
                            "no {} printer detected; check cable, power and driver",
                            printer.driver.name()
                        )),
                    }
                }
            }
        }
    }

    fn ready_printer(&self) -> AppResult<&ReadyPrinter> {
        self.printer
            .as_ref()
            .map_err(|reason| AppError::PrinterUnavailable {
                details: reason.clone(),
            })
    }

    /// Current settings, with defaults when the store is unreadable
    fn settings_snapshot(&self) -> ReceiptSettings {
        match self.settings.settings_map() {
            Ok(map) => ReceiptSettings::from_map(&map),
            Err(e) => {
                warn!(error = %e, "failed to load settings, printing with defaults");
                ReceiptSettings::default()
            }
        }
    }
}

/// Map a job failure onto the HTTP error surface
fn map_job_error(err: PrintJobError) -> AppError {
    let details = err.source_error().and_then(remediation);
    match err.source_error() {
        Some(PrintError::DriverUnavailable(reason)) => AppError::PrinterUnavailable {
            details: reason.clone(),
        },
        _ => AppError::PrinterCommunication {
            message: err.to_string(),
            details,
        },
    }
}

/// Operator guidance for the errors a cashier can act on
fn remediation(err: &PrintError) -> Option<String> {
    match err {
        PrintError::DeviceUnavailable(_) => Some(
            "Replug the printer and check the USB driver (Zadig/WinUSB on Windows, udev rules on Linux)"
                .to_string(),
        ),
        PrintError::CloseFailed(_) => Some(
            "The printer disconnected while finishing the job; replug it before the next print"
                .to_string(),
        ),
        PrintError::DeviceBusy(_) => {
            Some("Another print job is using the printer; retry in a moment".to_string())
        }
        _ => None,
    }
}

/// Fixed content for the test page
fn sample_transaction() -> TransactionSnapshot {
    TransactionSnapshot {
        id: 0,
        total: 16000,
        paid: 20000,
        change: 4000,
        created_at: chrono::Utc::now().timestamp_millis(),
        items: vec![
            LineItem {
                product_name: Some("Contoh A".to_string()),
                manual_name: None,
                quantity: 1,
                subtotal: 1000,
            },
            LineItem {
                product_name: Some("Contoh B".to_string()),
                manual_name: None,
                quantity: 2,
                subtotal: 15000,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_unavailable_maps_to_501_variant() {
        let err = map_job_error(PrintJobError::Copy {
            phase: super::super::session::SessionPhase::Opening,
            copy: 1,
            requested: 1,
            printed: 0,
            source: PrintError::DriverUnavailable("libusb missing".into()),
        });
        assert!(matches!(err, AppError::PrinterUnavailable { .. }));
    }

    #[test]
    fn test_device_errors_map_to_communication() {
        let err = map_job_error(PrintJobError::Copy {
            phase: super::super::session::SessionPhase::Opening,
            copy: 1,
            requested: 1,
            printed: 0,
            source: PrintError::DeviceUnavailable("unplugged".into()),
        });
        match err {
            AppError::PrinterCommunication { details, .. } => {
                assert!(details.unwrap().contains("Replug"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = map_job_error(PrintJobError::Busy("held".into()));
        assert!(matches!(err, AppError::PrinterCommunication { .. }));
    }

    #[test]
    fn test_sample_transaction_balances() {
        let tx = sample_transaction();
        let items: i64 = tx.items.iter().map(|i| i.subtotal).sum();
        assert_eq!(items, tx.total);
        assert_eq!(tx.paid - tx.total, tx.change);
    }
}
