//! Core server building blocks: configuration, shared state, startup

pub mod config;
pub mod server;
pub mod state;

pub use config::{Config, PrinterConnection};
pub use server::{Server, build_router};
pub use state::ServerState;
