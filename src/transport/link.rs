// MIT License - Copyright (c) 2026 bolid-bridge developers

//! Bus link lifecycle: channel ownership and the background reader task.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::BusConfig;
use crate::transport::channel::BusChannel;
use crate::transport::engine::ExchangeEngine;

/// An open session on the bus: exactly one logical owner of the channel.
///
/// Opening a link spawns the reader task that continuously drains the
/// channel into the reassembler. Reconnecting requires closing the link
/// first so the reader stops and buffered state is cleared.
pub struct BusLink {
    engine: Arc<ExchangeEngine>,
    reader_handle: Option<tokio::task::JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl BusLink {
    /// Take ownership of a channel and start reading from it.
    pub fn open(channel: Arc<dyn BusChannel>, config: BusConfig) -> Self {
        let engine = Arc::new(ExchangeEngine::new(channel.clone(), config.clone()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let reader_handle = spawn_reader_task(channel, engine.clone(), config, shutdown_rx);
        Self {
            engine,
            reader_handle: Some(reader_handle),
            shutdown_tx,
        }
    }

    /// The exchange engine for this link.
    pub fn engine(&self) -> Arc<ExchangeEngine> {
        self.engine.clone()
    }

    /// Stop the reader task, clear buffered state and close the channel.
    pub async fn close(&mut self) {
        debug!("closing bus link");
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.reader_handle.take() {
            let _ = handle.await;
        }
        self.engine.clear_responses().await;
        self.engine.channel().close().await;
    }
}

impl Drop for BusLink {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.reader_handle.take() {
            handle.abort();
        }
    }
}

/// Spawn the task that moves bytes from the channel into the reassembler.
fn spawn_reader_task(
    channel: Arc<dyn BusChannel>,
    engine: Arc<ExchangeEngine>,
    config: BusConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if *shutdown_rx.borrow() {
                debug!("reader task shutting down");
                break;
            }
            if !channel.is_open() {
                debug!("reader task: channel closed");
                break;
            }

            match channel.read_available().await {
                Ok(data) if !data.is_empty() => {
                    engine.feed(&data).await;
                    // Keep draining while data is flowing.
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("reader task: read failed: {e}");
                    break;
                }
            }

            tokio::select! {
                _ = sleep(config.reader_idle_delay()) => {}
                _ = shutdown_rx.changed() => {}
            }
        }
    })
}
