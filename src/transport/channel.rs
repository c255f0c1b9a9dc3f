// MIT License - Copyright (c) 2026 bolid-bridge developers

//! Abstract duplex byte channel over which the bus is reached.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::error::{BolidError, Result};

/// A duplex byte stream with bounded writes and non-blocking reads.
///
/// This is the only interface the core needs from the outside world; any
/// transport that can move raw bytes to and from the RS-485 segment
/// (serial port wrapper, serial-to-ethernet bridge, loopback emulator in
/// tests) implements it.
#[async_trait]
pub trait BusChannel: Send + Sync {
    /// Write all bytes within `timeout`. Fails with [`BolidError::WriteTimeout`]
    /// when the deadline passes and [`BolidError::ChannelClosed`] when the
    /// channel is no longer usable.
    async fn write(&self, data: &[u8], timeout: Duration) -> Result<()>;

    /// Drain whatever bytes have arrived; returns an empty vector when
    /// nothing is pending. Never blocks waiting for data.
    async fn read_available(&self) -> Result<Vec<u8>>;

    /// Number of bytes that [`BusChannel::read_available`] would return now.
    async fn bytes_available(&self) -> Result<usize>;

    /// Whether the channel is still open.
    fn is_open(&self) -> bool;

    /// Close the channel. Further operations fail with
    /// [`BolidError::ChannelClosed`].
    async fn close(&self);
}

/// TCP channel to a serial-to-ethernet bridge in raw socket mode, the
/// usual way an RS-485 segment is reached over a network.
pub struct TcpChannel {
    stream: Mutex<TcpStream>,
    /// Bytes already pulled off the socket but not yet handed to a reader.
    pending: Mutex<Vec<u8>>,
    open: AtomicBool,
}

impl TcpChannel {
    /// Connect to `host:port`.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port)).await.map_err(|e| {
            error!("TCP connect to {host}:{port} failed: {e}");
            BolidError::Io(e)
        })?;
        stream.set_nodelay(true).ok();
        debug!("TCP channel connected to {host}:{port}");
        Ok(Self {
            stream: Mutex::new(stream),
            pending: Mutex::new(Vec::new()),
            open: AtomicBool::new(true),
        })
    }

    /// Pull any readable bytes off the socket into the pending buffer
    /// without blocking.
    async fn drain_socket(&self) -> Result<()> {
        if !self.is_open() {
            return Err(BolidError::ChannelClosed);
        }
        let stream = self.stream.lock().await;
        let mut pending = self.pending.lock().await;
        let mut buf = [0u8; 4096];
        loop {
            match stream.try_read(&mut buf) {
                Ok(0) => {
                    // Orderly shutdown by the peer.
                    debug!("TCP channel closed by peer");
                    self.open.store(false, Ordering::SeqCst);
                    return Err(BolidError::ChannelClosed);
                }
                Ok(n) => pending.extend_from_slice(&buf[..n]),
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => {
                    error!("TCP read error: {e}");
                    self.open.store(false, Ordering::SeqCst);
                    return Err(BolidError::Io(e));
                }
            }
        }
    }
}

#[async_trait]
impl BusChannel for TcpChannel {
    async fn write(&self, data: &[u8], timeout: Duration) -> Result<()> {
        if !self.is_open() {
            return Err(BolidError::ChannelClosed);
        }
        let mut stream = self.stream.lock().await;
        match tokio::time::timeout(timeout, stream.write_all(data)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!("TCP write error: {e}");
                self.open.store(false, Ordering::SeqCst);
                Err(BolidError::Io(e))
            }
            Err(_) => Err(BolidError::WriteTimeout),
        }
    }

    async fn read_available(&self) -> Result<Vec<u8>> {
        self.drain_socket().await?;
        let mut pending = self.pending.lock().await;
        Ok(std::mem::take(&mut *pending))
    }

    async fn bytes_available(&self) -> Result<usize> {
        self.drain_socket().await?;
        Ok(self.pending.lock().await.len())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        let mut stream = self.stream.lock().await;
        let _ = stream.shutdown().await;
        debug!("TCP channel closed");
    }
}
