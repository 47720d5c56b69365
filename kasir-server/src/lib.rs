//! KasirQu print service - point-of-sale receipt printing backend
//!
//! # Architecture overview
//!
//! This crate is the HTTP-facing half of the system; `kasir-printer`
//! owns the ESC/POS and transport details. Core responsibilities:
//!
//! - **Printing** (`printing`): receipt rendering and the per-copy
//!   print session state machine
//! - **Storage** (`storage`): embedded redb store for settings and
//!   transaction snapshots
//! - **HTTP API** (`api`): print, printer status and health routes
//!
//! # Module structure
//!
//! ```text
//! kasir-server/src/
//! ├── core/          # configuration, state, startup
//! ├── api/           # HTTP routes and handlers
//! ├── printing/      # renderer, session controller, service
//! ├── storage/       # redb store
//! └── utils/         # errors, logging
//! ```

pub mod api;
pub mod core;
pub mod printing;
pub mod storage;
pub mod utils;

// Re-export public types
pub use crate::core::{Config, Server, ServerState, build_router};
pub use crate::printing::{
    LineItem, PrintService, ReceiptRenderer, ReceiptSettings, SettingsLookup,
    TransactionSnapshot, TransactionSource,
};
pub use crate::storage::PosStorage;
pub use crate::utils::{AppError, AppResult};

// Re-export logger functions
pub use crate::utils::logger::{init_logger, init_logger_with_file};

/// Load .env and initialize logging
pub fn setup_environment() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let log_level = std::env::var("LOG_LEVEL").ok();
    init_logger_with_file(log_level.as_deref(), None);
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    __ __           _       ____
   / //_/___ ______(_)____ / __ \__  __
  / ,< / __ `/ ___/ / ___// / / / / / /
 / /| / /_/ (__  ) / /   / /_/ / /_/ /
/_/ |_\__,_/____/_/_/    \___\_\__,_/
    "#
    );
}
