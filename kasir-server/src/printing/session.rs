//! Print session controller
//!
//! Drives one physical print job: acquire the device, render, write,
//! cut, release - once per copy, strictly sequentially. The hardware is
//! a single stateful device, so a job holds an exclusive gate for its
//! whole duration and a competing job fails fast with a busy error
//! instead of queueing.
//!
//! Per copy the controller walks
//! `Opening -> Formatting -> Writing -> Cutting -> Closing`; a fatal
//! failure in any phase aborts the remaining copies and reports which
//! copy failed and how many made it to paper.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use kasir_printer::{
    Capabilities, PrintCommand, PrintError, PrinterConnection, PrinterDriver,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::renderer::ReceiptRenderer;
use super::types::{ReceiptSettings, TransactionSnapshot};

/// Phase of the per-copy state machine, carried in errors and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Opening,
    Formatting,
    Writing,
    Cutting,
    Closing,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionPhase::Opening => "opening the device",
            SessionPhase::Formatting => "formatting",
            SessionPhase::Writing => "writing",
            SessionPhase::Cutting => "cutting",
            SessionPhase::Closing => "closing the device",
        };
        f.write_str(s)
    }
}

/// Print job failure
#[derive(Debug, Error)]
pub enum PrintJobError {
    /// A copy failed; `printed` copies made it to paper before that.
    #[error("copy {copy}/{requested} failed while {phase} ({printed} printed): {source}")]
    Copy {
        phase: SessionPhase,
        copy: u32,
        requested: u32,
        printed: u32,
        #[source]
        source: PrintError,
    },

    /// Another job holds the device
    #[error("printer busy: {0}")]
    Busy(String),

    /// Job stopped at a copy boundary during shutdown
    #[error("print job cancelled after {printed}/{requested} copies")]
    Cancelled { printed: u32, requested: u32 },
}

impl PrintJobError {
    /// Copies that made it to paper before the job stopped
    pub fn printed(&self) -> u32 {
        match self {
            PrintJobError::Copy { printed, .. } => *printed,
            PrintJobError::Busy(_) => 0,
            PrintJobError::Cancelled { printed, .. } => *printed,
        }
    }

    /// Underlying driver error, when there is one
    pub fn source_error(&self) -> Option<&PrintError> {
        match self {
            PrintJobError::Copy { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Print session controller
///
/// Owns the device gate; one controller per physical printer.
pub struct PrintController {
    driver: Arc<dyn PrinterDriver>,
    renderer: ReceiptRenderer,
    gate: Mutex<()>,
    copy_delay: Duration,
    cancel: CancellationToken,
}

impl PrintController {
    pub fn new(
        driver: Arc<dyn PrinterDriver>,
        renderer: ReceiptRenderer,
        copy_delay: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            driver,
            renderer,
            gate: Mutex::new(()),
            copy_delay,
            cancel,
        }
    }

    pub fn driver(&self) -> &Arc<dyn PrinterDriver> {
        &self.driver
    }

    /// Print `copies` receipts for one transaction.
    ///
    /// Copies run strictly sequentially with a settle delay between
    /// them; a fatal failure aborts the remaining copies. Once a copy
    /// has opened the device it always runs to the close, cancellation
    /// is only honored at copy boundaries.
    #[instrument(skip(self, tx, settings), fields(tx_id = tx.id, copies))]
    pub async fn print(
        &self,
        tx: &TransactionSnapshot,
        settings: &ReceiptSettings,
        copies: u32,
    ) -> Result<u32, PrintJobError> {
        let Ok(_guard) = self.gate.try_lock() else {
            return Err(PrintJobError::Busy(
                "another print job holds the device".into(),
            ));
        };

        let capabilities = self.driver.capabilities();

        for copy in 1..=copies {
            if copy > 1 {
                // Let the physical device settle before reopening
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        return Err(PrintJobError::Cancelled { printed: copy - 1, requested: copies });
                    }
                    _ = tokio::time::sleep(self.copy_delay) => {}
                }
            }
            if self.cancel.is_cancelled() {
                return Err(PrintJobError::Cancelled {
                    printed: copy - 1,
                    requested: copies,
                });
            }

            if let Err((phase, source)) = self.print_copy(tx, settings, capabilities).await {
                // A failure while closing means the paper already came
                // out; count the copy as printed.
                let printed = if phase == SessionPhase::Closing {
                    copy
                } else {
                    copy - 1
                };
                return Err(PrintJobError::Copy {
                    phase,
                    copy,
                    requested: copies,
                    printed,
                    source,
                });
            }
            info!(copy, copies, "copy printed");
        }

        Ok(copies)
    }

    /// Run one copy through the full open/write/cut/close cycle
    async fn print_copy(
        &self,
        tx: &TransactionSnapshot,
        settings: &ReceiptSettings,
        capabilities: Capabilities,
    ) -> Result<(), (SessionPhase, PrintError)> {
        let mut conn = self
            .driver
            .open()
            .await
            .map_err(|e| (SessionPhase::Opening, e))?;

        // Rendering is pure and cannot fail
        let commands = self.renderer.render(tx, settings);

        match write_all(&mut conn, &commands, capabilities).await {
            Ok(()) => conn.close().await.map_err(|e| (SessionPhase::Closing, e)),
            Err(failure) => {
                // Best effort: release the device even after a fatal write
                if let Err(e) = conn.close().await {
                    warn!(error = %e, "close after failed write also failed");
                }
                Err(failure)
            }
        }
    }
}

/// Write the command sequence, degrading unsupported commands in place.
///
/// Commands the printer cannot execute are skipped (scaling) or
/// rewritten as plain text (tables); cut failures are logged and the
/// job continues, since the paper is usually already printed.
async fn write_all(
    conn: &mut Box<dyn PrinterConnection>,
    commands: &[PrintCommand],
    capabilities: Capabilities,
) -> Result<(), (SessionPhase, PrintError)> {
    for command in commands {
        match command {
            PrintCommand::Cut => {
                if let Err(e) = conn.cut().await {
                    warn!(error = %e, "cut failed");
                }
            }
            PrintCommand::SetSize { .. } if !capabilities.size => {
                warn!(?command, "printer lacks size support, skipping");
            }
            PrintCommand::Table(columns) if !capabilities.table => {
                let line = PrintCommand::Text(PrintCommand::table_fallback_line(columns));
                conn.write(&line)
                    .await
                    .map_err(|e| (SessionPhase::Writing, e))?;
            }
            other => match conn.write(other).await {
                Ok(()) => {}
                Err(PrintError::WriteUnsupported(what)) => {
                    warn!(what = %what, "unsupported command skipped");
                    if let PrintCommand::Table(columns) = other {
                        let line =
                            PrintCommand::Text(PrintCommand::table_fallback_line(columns));
                        conn.write(&line)
                            .await
                            .map_err(|e| (SessionPhase::Writing, e))?;
                    }
                }
                Err(e) => return Err((SessionPhase::Writing, e)),
            },
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printing::types::LineItem;
    use async_trait::async_trait;
    use kasir_printer::PrintResult;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// What the fake driver should do, step by step
    #[derive(Debug, Clone, Copy, Default)]
    struct FakeBehavior {
        capabilities: Option<Capabilities>,
        /// 1-based open attempt that fails
        fail_open_on: Option<u32>,
        fail_cut: bool,
        fail_close: bool,
        unsupported_size_writes: bool,
        open_delay: Option<Duration>,
    }

    /// Shared observation point for test assertions
    #[derive(Debug, Default)]
    struct FakeState {
        opens: AtomicU32,
        written: StdMutex<Vec<PrintCommand>>,
        cuts: AtomicU32,
        closes: AtomicU32,
    }

    impl FakeState {
        fn written(&self) -> Vec<PrintCommand> {
            self.written.lock().unwrap().clone()
        }
    }

    struct FakeDriver {
        behavior: FakeBehavior,
        state: Arc<FakeState>,
    }

    impl FakeDriver {
        fn new(behavior: FakeBehavior) -> (Arc<dyn PrinterDriver>, Arc<FakeState>) {
            let state = Arc::new(FakeState::default());
            let driver: Arc<dyn PrinterDriver> = Arc::new(Self {
                behavior,
                state: Arc::clone(&state),
            });
            (driver, state)
        }
    }

    #[async_trait]
    impl PrinterDriver for FakeDriver {
        fn name(&self) -> &str {
            "fake"
        }

        fn capabilities(&self) -> Capabilities {
            self.behavior.capabilities.unwrap_or_default()
        }

        async fn open(&self) -> PrintResult<Box<dyn PrinterConnection>> {
            if let Some(delay) = self.behavior.open_delay {
                tokio::time::sleep(delay).await;
            }
            let attempt = self.state.opens.fetch_add(1, Ordering::SeqCst) + 1;
            if self.behavior.fail_open_on == Some(attempt) {
                return Err(PrintError::DeviceUnavailable("simulated unplug".into()));
            }
            Ok(Box::new(FakeConnection {
                behavior: self.behavior,
                state: Arc::clone(&self.state),
            }))
        }

        async fn is_online(&self) -> bool {
            true
        }
    }

    struct FakeConnection {
        behavior: FakeBehavior,
        state: Arc<FakeState>,
    }

    #[async_trait]
    impl PrinterConnection for FakeConnection {
        async fn write(&mut self, command: &PrintCommand) -> PrintResult<()> {
            if self.behavior.unsupported_size_writes
                && matches!(command, PrintCommand::SetSize { .. })
            {
                return Err(PrintError::WriteUnsupported("size".into()));
            }
            self.state.written.lock().unwrap().push(command.clone());
            Ok(())
        }

        async fn cut(&mut self) -> PrintResult<()> {
            self.state.cuts.fetch_add(1, Ordering::SeqCst);
            if self.behavior.fail_cut {
                return Err(PrintError::CutFailed("simulated jam".into()));
            }
            Ok(())
        }

        async fn close(self: Box<Self>) -> PrintResult<()> {
            self.state.closes.fetch_add(1, Ordering::SeqCst);
            if self.behavior.fail_close {
                return Err(PrintError::CloseFailed("device gone while closing".into()));
            }
            Ok(())
        }
    }

    fn controller(driver: Arc<dyn PrinterDriver>) -> PrintController {
        PrintController::new(
            driver,
            ReceiptRenderer::default(),
            Duration::from_millis(1),
            CancellationToken::new(),
        )
    }

    fn sample_tx() -> TransactionSnapshot {
        TransactionSnapshot {
            id: 7,
            total: 45000,
            paid: 50000,
            change: 5000,
            created_at: 1705912335000,
            items: vec![LineItem {
                product_name: Some("Kopi".to_string()),
                manual_name: None,
                quantity: 3,
                subtotal: 45000,
            }],
        }
    }

    #[tokio::test]
    async fn test_successful_multi_copy_job() {
        let (driver, state) = FakeDriver::new(FakeBehavior::default());
        let c = controller(driver);

        let printed = c
            .print(&sample_tx(), &ReceiptSettings::default(), 2)
            .await
            .unwrap();

        assert_eq!(printed, 2);
        assert_eq!(state.opens.load(Ordering::SeqCst), 2);
        assert_eq!(state.cuts.load(Ordering::SeqCst), 2);
        assert_eq!(state.closes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_copy_aborts_remaining() {
        let (driver, state) = FakeDriver::new(FakeBehavior {
            fail_open_on: Some(3),
            ..Default::default()
        });
        let c = controller(driver);

        let err = c
            .print(&sample_tx(), &ReceiptSettings::default(), 5)
            .await
            .unwrap_err();

        match err {
            PrintJobError::Copy {
                phase,
                copy,
                printed,
                requested,
                ..
            } => {
                assert_eq!(phase, SessionPhase::Opening);
                assert_eq!(copy, 3);
                assert_eq!(printed, 2);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Copy 4 never attempted
        assert_eq!(state.opens.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_concurrent_jobs_one_gets_busy() {
        let (driver, _state) = FakeDriver::new(FakeBehavior {
            open_delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let c = Arc::new(controller(driver));

        let tx = sample_tx();
        let settings = ReceiptSettings::default();
        let first = {
            let c = Arc::clone(&c);
            let tx = tx.clone();
            let settings = settings.clone();
            tokio::spawn(async move { c.print(&tx, &settings, 1).await })
        };
        let second = {
            let c = Arc::clone(&c);
            let tx = tx.clone();
            let settings = settings.clone();
            tokio::spawn(async move { c.print(&tx, &settings, 1).await })
        };

        let results = [first.await.unwrap(), second.await.unwrap()];
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let busy = results
            .iter()
            .filter(|r| matches!(r, Err(PrintJobError::Busy(_))))
            .count();
        assert_eq!(ok, 1);
        assert_eq!(busy, 1);
    }

    #[tokio::test]
    async fn test_missing_table_capability_degrades_to_text() {
        let (driver, state) = FakeDriver::new(FakeBehavior {
            capabilities: Some(Capabilities {
                size: true,
                table: false,
            }),
            ..Default::default()
        });
        let c = controller(driver);

        c.print(&sample_tx(), &ReceiptSettings::default(), 1)
            .await
            .unwrap();

        let written = state.written();
        assert!(!written.iter().any(|c| matches!(c, PrintCommand::Table(_))));
        assert!(written.contains(&PrintCommand::Text("TOTAL Rp45.000".to_string())));
    }

    #[tokio::test]
    async fn test_missing_size_capability_skips_command() {
        let (driver, state) = FakeDriver::new(FakeBehavior {
            capabilities: Some(Capabilities {
                size: false,
                table: true,
            }),
            ..Default::default()
        });
        let c = controller(driver);

        c.print(&sample_tx(), &ReceiptSettings::default(), 1)
            .await
            .unwrap();

        assert!(
            !state
                .written()
                .iter()
                .any(|c| matches!(c, PrintCommand::SetSize { .. }))
        );
    }

    #[tokio::test]
    async fn test_write_unsupported_is_recovered() {
        let (driver, state) = FakeDriver::new(FakeBehavior {
            unsupported_size_writes: true,
            ..Default::default()
        });
        let c = controller(driver);

        let printed = c
            .print(&sample_tx(), &ReceiptSettings::default(), 1)
            .await
            .unwrap();
        assert_eq!(printed, 1);
        // The rest of the receipt still went out
        assert!(!state.written().is_empty());
    }

    #[tokio::test]
    async fn test_cut_failure_is_not_fatal() {
        let (driver, state) = FakeDriver::new(FakeBehavior {
            fail_cut: true,
            ..Default::default()
        });
        let c = controller(driver);

        let printed = c
            .print(&sample_tx(), &ReceiptSettings::default(), 1)
            .await
            .unwrap();
        assert_eq!(printed, 1);
        assert_eq!(state.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_failure_counts_copy_as_printed() {
        let (driver, _state) = FakeDriver::new(FakeBehavior {
            fail_close: true,
            ..Default::default()
        });
        let c = controller(driver);

        let err = c
            .print(&sample_tx(), &ReceiptSettings::default(), 1)
            .await
            .unwrap_err();

        match err {
            PrintJobError::Copy { phase, printed, .. } => {
                assert_eq!(phase, SessionPhase::Closing);
                assert_eq!(printed, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (driver, state) = FakeDriver::new(FakeBehavior::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let c = PrintController::new(
            driver,
            ReceiptRenderer::default(),
            Duration::from_millis(1),
            cancel,
        );

        let err = c
            .print(&sample_tx(), &ReceiptSettings::default(), 2)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PrintJobError::Cancelled {
                printed: 0,
                requested: 2
            }
        ));
        assert_eq!(state.opens.load(Ordering::SeqCst), 0);
    }
}
