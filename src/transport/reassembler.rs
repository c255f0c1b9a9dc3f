// MIT License - Copyright (c) 2026 bolid-bridge developers

//! Streaming frame reassembly for the half-duplex bus.
//!
//! Bytes arrive in arbitrary chunks, possibly interleaved with echo and
//! line noise. The reassembler keeps a fixed rolling buffer, scans it for
//! frames addressed by the device we last queried, and resynchronises one
//! byte at a time on anything that does not parse. Recovery cost is
//! bounded by the buffer length and forward progress is guaranteed even
//! under sustained corruption.

use std::collections::VecDeque;

use tracing::trace;

use crate::codec::{decode_response, RequestKind, Response};

/// Large enough for the biggest frame the wire can carry (255-byte length
/// field plus CRC) with headroom.
pub(crate) const BUFFER_CAPACITY: usize = 270;

/// Shared reassembly state: rolling byte buffer, last-request tag and the
/// decoded-response queue. The engine keeps the whole struct behind one
/// mutex; every access is a short enqueue/dequeue/reset.
pub(crate) struct Reassembler {
    buf: [u8; BUFFER_CAPACITY],
    len: usize,
    /// Kind and address of the last request written to the bus. Frames
    /// from any other address are cross-talk and are discarded.
    last_request: Option<(RequestKind, u8)>,
    queue: VecDeque<Response>,
}

impl Reassembler {
    pub(crate) fn new() -> Self {
        Self {
            buf: [0; BUFFER_CAPACITY],
            len: 0,
            last_request: None,
            queue: VecDeque::new(),
        }
    }

    /// Record the request whose reply we are now waiting for.
    pub(crate) fn note_request(&mut self, kind: RequestKind, addr: u8) {
        self.last_request = Some((kind, addr));
    }

    /// Consume newly arrived bytes, pushing every decodable frame onto the
    /// response queue.
    pub(crate) fn feed(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        // A burst that cannot fit means we lost sync long ago; abandoning
        // the whole buffer is cheaper than trying to salvage it.
        if self.len + data.len() > BUFFER_CAPACITY {
            trace!("reassembly buffer overflow, resetting ({} + {} bytes)", self.len, data.len());
            self.len = 0;
        }
        if data.len() > BUFFER_CAPACITY {
            return;
        }
        self.buf[self.len..self.len + data.len()].copy_from_slice(data);
        self.len += data.len();

        while self.len >= 2 {
            let addr = self.buf[0];
            let length = self.buf[1] as usize;

            // The length field counts addr+len+payload, so anything below
            // the two header bytes is garbage.
            if length < 2 {
                self.slide(1);
                continue;
            }

            // Partial frame: wait for the rest.
            if self.len < length + 1 {
                break;
            }

            let Some((kind, expected_addr)) = self.last_request else {
                self.slide(1);
                continue;
            };
            if addr != expected_addr {
                trace!("dropping frame from address {addr}, expected {expected_addr}");
                self.slide(1);
                continue;
            }

            if let Some(response) = decode_response(kind, &self.buf[..length + 1]) {
                trace!("decoded response from address {addr}: {response:?}");
                self.queue.push_back(response);
            }
            // Consumed whole whether or not it decoded; a corrupt frame is
            // line noise and self-heals on the next exchange.
            self.slide(length + 1);
        }
    }

    /// Take the first queued response, optionally only from `expected_addr`.
    /// Non-matching entries stay queued for a later, differently-addressed
    /// call.
    pub(crate) fn pop_matching(&mut self, expected_addr: Option<u8>) -> Option<Response> {
        match expected_addr {
            None => self.queue.pop_front(),
            Some(addr) => {
                let idx = self.queue.iter().position(|r| r.addr() == addr)?;
                self.queue.remove(idx)
            }
        }
    }

    /// Drop buffered bytes and queued responses. Used when a new logical
    /// operation must not see stale replies.
    pub(crate) fn clear(&mut self) {
        self.len = 0;
        self.queue.clear();
    }

    fn slide(&mut self, n: usize) {
        self.buf.copy_within(n..self.len, 0);
        self.len -= n;
    }

    #[cfg(test)]
    fn queued(&self) -> usize {
        self.queue.len()
    }
}
