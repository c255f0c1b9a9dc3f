// MIT License - Copyright (c) 2026 bolid-bridge developers

//! Single-request-in-flight exchange engine.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::codec::{Request, Response};
use crate::config::BusConfig;
use crate::error::{BolidError, Result};
use crate::transport::channel::BusChannel;
use crate::transport::reassembler::Reassembler;

/// Sends requests on the channel and hands back the responses the
/// background reader has reassembled.
///
/// The bus is half-duplex and replies carry no request identifiers, so
/// responses correlate with requests purely by program order: callers must
/// not issue a new request before the previous one has been answered or
/// timed out. The engine records each request's kind and address for the
/// reassembler but deliberately does not serialize callers itself.
pub struct ExchangeEngine {
    channel: Arc<dyn BusChannel>,
    config: BusConfig,
    /// Reassembly buffer and response queue, one mutex for both.
    state: Mutex<Reassembler>,
}

impl ExchangeEngine {
    pub fn new(channel: Arc<dyn BusChannel>, config: BusConfig) -> Self {
        Self {
            channel,
            config,
            state: Mutex::new(Reassembler::new()),
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    pub fn channel(&self) -> &Arc<dyn BusChannel> {
        &self.channel
    }

    /// Pack and write a request, then record it as the one we are waiting
    /// on. Fails if the channel is closed or the write times out.
    pub async fn send(&self, request: &Request) -> Result<()> {
        if !self.channel.is_open() {
            return Err(BolidError::ChannelClosed);
        }
        let data = request.encode();
        trace!("sending {request:?}: {data:02X?}");
        self.channel.write(&data, self.config.write_timeout()).await?;
        self.state.lock().await.note_request(request.kind(), request.addr());
        Ok(())
    }

    /// Wait up to `timeout` for a response, re-checking the queue at a
    /// short interval. With `expected_addr` given, entries from other
    /// addresses are left queued for later calls. `None` on timeout: no
    /// reply is an expected outcome, not an error.
    pub async fn get(&self, timeout: Duration, expected_addr: Option<u8>) -> Option<Response> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(response) = self.state.lock().await.pop_matching(expected_addr) {
                return Some(response);
            }
            if Instant::now() >= deadline {
                return None;
            }
            sleep(self.config.queue_poll_interval()).await;
        }
    }

    /// Drop queued responses and buffered bytes so a new logical operation
    /// cannot see stale replies.
    pub async fn clear_responses(&self) {
        debug!("clearing response queue and reassembly buffer");
        self.state.lock().await.clear();
    }

    /// Feed raw bytes from the reader task into the reassembler.
    pub(crate) async fn feed(&self, data: &[u8]) {
        self.state.lock().await.feed(data);
    }
}
