//! Server state
//!
//! [`ServerState`] holds shared references to every service the HTTP
//! handlers need. All fields are cheap to clone; the state itself is
//! the axum router state.

use std::sync::Arc;

use kasir_printer::{NetworkPrinter, PrinterDriver, UsbPrinter, UsbPrinterConfig};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::config::{Config, PrinterConnection};
use crate::printing::{PrintService, ReceiptRenderer};
use crate::storage::PosStorage;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub storage: PosStorage,
    pub print_service: Arc<PrintService>,
    /// Cancelled on shutdown; print jobs stop at the next copy boundary
    pub shutdown: CancellationToken,
}

impl ServerState {
    /// Initialize storage and services.
    ///
    /// A printer driver that fails to construct is not fatal: the
    /// server still answers, print requests report the stored reason.
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let storage = PosStorage::open(config.db_path())?;
        let shutdown = CancellationToken::new();

        let driver = build_driver(config);
        if let Err(reason) = &driver {
            warn!(reason, "printer driver unavailable at startup");
        }

        let store = Arc::new(storage.clone());
        let renderer = ReceiptRenderer::new(config.paper_width, config.timezone);
        let print_service = Arc::new(PrintService::new(
            driver,
            store.clone(),
            store,
            renderer,
            config.copy_delay,
            shutdown.child_token(),
        ));

        Ok(Self {
            config: Arc::new(config.clone()),
            storage,
            print_service,
            shutdown,
        })
    }
}

/// Construct the configured printer driver
fn build_driver(config: &Config) -> Result<Arc<dyn PrinterDriver>, String> {
    match &config.printer {
        PrinterConnection::Usb {
            vendor_id,
            product_id,
        } => UsbPrinter::new(UsbPrinterConfig {
            vendor_id: *vendor_id,
            product_id: *product_id,
            timeout: config.open_timeout,
            width: config.paper_width,
        })
        .map(|d| Arc::new(d) as Arc<dyn PrinterDriver>)
        .map_err(|e| e.to_string()),
        PrinterConnection::Network { host, port } => {
            NetworkPrinter::new(host, *port, config.paper_width)
                .map(|d| {
                    Arc::new(d.with_timeout(config.open_timeout)) as Arc<dyn PrinterDriver>
                })
                .map_err(|e| e.to_string())
        }
    }
}
