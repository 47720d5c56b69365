//! Network printer driver (TCP port 9100)
//!
//! Most thermal printers accept raw ESC/POS on TCP port 9100. Useful as
//! a drop-in replacement for the USB transport when the printer hangs
//! off the network instead of the till.

use crate::command::PrintCommand;
use crate::driver::{Capabilities, PrinterConnection, PrinterDriver};
use crate::error::{PrintError, PrintResult};
use crate::escpos::EscPosBuilder;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument, warn};

/// ESC @ - initialize printer
const INIT: [u8; 2] = [0x1B, 0x40];

/// Network printer driver
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    addr: SocketAddr,
    timeout: Duration,
    width: usize,
}

impl NetworkPrinter {
    /// Create a new network printer
    pub fn new(host: &str, port: u16, width: usize) -> PrintResult<Self> {
        let addr_str = format!("{}:{}", host, port);
        let addr = addr_str
            .parse()
            .map_err(|_| PrintError::InvalidConfig(format!("Invalid address: {}", addr_str)))?;

        Ok(Self {
            addr,
            timeout: Duration::from_secs(5),
            width,
        })
    }

    /// Create from a socket address string (e.g., "192.168.1.100:9100")
    pub fn from_addr(addr: &str, width: usize) -> PrintResult<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| PrintError::InvalidConfig(format!("Invalid address: {}", addr)))?;

        Ok(Self {
            addr,
            timeout: Duration::from_secs(5),
            width,
        })
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the printer address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

#[async_trait]
impl PrinterDriver for NetworkPrinter {
    fn name(&self) -> &str {
        "network"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::full()
    }

    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn open(&self) -> PrintResult<Box<dyn PrinterConnection>> {
        info!("Connecting to printer");

        let mut stream = tokio::time::timeout(self.timeout, TcpStream::connect(self.addr))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", self.addr)))?
            .map_err(|e| PrintError::DeviceUnavailable(format!("{}: {}", self.addr, e)))?;

        stream
            .write_all(&INIT)
            .await
            .map_err(|e| PrintError::WriteFailed(format!("printer init failed: {e}")))?;

        Ok(Box::new(NetworkConnection {
            stream,
            width: self.width,
        }))
    }

    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn is_online(&self) -> bool {
        let check_timeout = Duration::from_millis(500);

        match tokio::time::timeout(check_timeout, TcpStream::connect(self.addr)).await {
            Ok(Ok(_)) => {
                info!("Printer online");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Printer offline");
                false
            }
            Err(_) => {
                warn!("Printer check timeout");
                false
            }
        }
    }
}

/// One open TCP session
struct NetworkConnection {
    stream: TcpStream,
    width: usize,
}

impl NetworkConnection {
    async fn send(&mut self, data: Vec<u8>) -> PrintResult<()> {
        self.stream
            .write_all(&data)
            .await
            .map_err(|e| PrintError::WriteFailed(format!("Write failed: {e}")))?;
        self.stream
            .flush()
            .await
            .map_err(|e| PrintError::WriteFailed(format!("Flush failed: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl PrinterConnection for NetworkConnection {
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

    async fn close(mut self: Box<Self>) -> PrintResult<()> {
        self.stream
            .shutdown()
            .await
            .map_err(|e| PrintError::CloseFailed(format!("Socket shutdown failed: {e}")))
    }
}
