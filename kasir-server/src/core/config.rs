//! Server configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | WORK_DIR | ./data | Database and log directory |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | PRINTER_CONNECTION | usb | Printer transport: usb \| network |
//! | PRINTER_VENDOR_ID | - | USB vendor id (hex), optional |
//! | PRINTER_PRODUCT_ID | - | USB product id (hex), optional |
//! | PRINTER_HOST | 192.168.1.100 | Network printer address |
//! | PRINTER_PORT | 9100 | Network printer port |
//! | PAPER_WIDTH | 32 | Paper width in characters (32 = 58mm) |
//! | COPY_DELAY_MS | 500 | Settle delay between copies |
//! | OPEN_TIMEOUT_MS | 5000 | Device open/write timeout |
//! | TIMEZONE | Asia/Jakarta | Receipt timestamp timezone |
//!
//! # Example
//!
//! ```ignore
//! PRINTER_CONNECTION=network PRINTER_HOST=10.0.0.5 cargo run
//! ```

use std::path::PathBuf;
use std::time::Duration;

/// Printer transport selection
#[derive(Debug, Clone)]
pub enum PrinterConnection {
    Usb {
        vendor_id: Option<u16>,
        product_id: Option<u16>,
    },
    Network {
        host: String,
        port: u16,
    },
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database and logs
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Printer transport
    pub printer: PrinterConnection,
    /// Paper width in characters (32 for 58mm, 48 for 80mm)
    pub paper_width: usize,
    /// Settle delay between copies
    pub copy_delay: Duration,
    /// Device open/write timeout
    pub open_timeout: Duration,
    /// Timezone for receipt timestamps
    pub timezone: chrono_tz::Tz,
}

impl Config {
    /// Load configuration from environment variables,
    /// falling back to defaults for anything unset
    pub fn from_env() -> Self {
        let connection = std::env::var("PRINTER_CONNECTION").unwrap_or_else(|_| "usb".into());
        let printer = match connection.as_str() {
            "network" => PrinterConnection::Network {
                host: std::env::var("PRINTER_HOST")
                    .unwrap_or_else(|_| "192.168.1.100".into()),
                port: std::env::var("PRINTER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(9100),
            },
            _ => PrinterConnection::Usb {
                vendor_id: hex_env("PRINTER_VENDOR_ID"),
                product_id: hex_env("PRINTER_PRODUCT_ID"),
            },
        };

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            printer,
            paper_width: std::env::var("PAPER_WIDTH")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(32),
            copy_delay: Duration::from_millis(
                std::env::var("COPY_DELAY_MS")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(500),
            ),
            open_timeout: Duration::from_millis(
                std::env::var("OPEN_TIMEOUT_MS")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(5000),
            ),
            timezone: std::env::var("TIMEZONE")
                .ok()
                .and_then(|tz| tz.parse().ok())
                .unwrap_or(chrono_tz::Asia::Jakarta),
        }
    }

    /// Path of the embedded database file
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("kasirqu.redb")
    }
}

/// Parse a `0x`-prefixed or bare hex id from the environment
fn hex_env(name: &str) -> Option<u16> {
    let raw = std::env::var(name).ok()?;
    let trimmed = raw.trim().trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(trimmed, 16).ok()
}
