use std::io::Write;
use std::net::SocketAddr;

use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::udp::{DatagramSocket, Received, DEFAULT_MAX_DATAGRAM, MAX_UDP_PAYLOAD};

/// Default number of datagrams between progress events.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 300;

/// Capture sink configuration.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Receive buffer size. Must cover the largest burst the sender coalesces
    /// into one datagram; anything beyond it is cut off by the kernel.
    pub max_datagram_size: usize,
    /// Emit a progress event every N datagrams. `0` disables progress events.
    pub progress_interval: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            max_datagram_size: DEFAULT_MAX_DATAGRAM,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl SinkConfig {
    /// Reject sizes a UDP receive can never use.
    pub fn validate(&self) -> Result<()> {
        if self.max_datagram_size == 0 || self.max_datagram_size > MAX_UDP_PAYLOAD {
            return Err(TransportError::InvalidConfig(format!(
                "max datagram size must be within 1..={MAX_UDP_PAYLOAD}, got {}",
                self.max_datagram_size
            )));
        }
        Ok(())
    }
}

/// Counters kept by a running sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    /// Datagrams received and persisted.
    pub datagrams: u64,
    /// Payload bytes persisted.
    pub bytes: u64,
    /// Datagrams that lost trailing bytes to the receive buffer size.
    pub truncated: u64,
    /// Largest payload persisted.
    pub largest: usize,
}

/// Receives datagrams and appends each payload, unmodified and in arrival
/// order, to a store.
///
/// Receive and persist alternate on one thread with no queue in between.
/// While a write is in flight, arriving datagrams wait in the kernel socket
/// buffer and are dropped there if it fills up; that loss is invisible here
/// and only shows up downstream as a sequence counter gap.
pub struct CaptureSink<W> {
    socket: DatagramSocket,
    store: W,
    config: SinkConfig,
    buf: Vec<u8>,
    stats: SinkStats,
}

impl<W: Write> CaptureSink<W> {
    /// Create a sink reading from `socket` and appending to `store`.
    pub fn new(socket: DatagramSocket, store: W, config: SinkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            socket,
            store,
            buf: vec![0u8; config.max_datagram_size],
            config,
            stats: SinkStats::default(),
        })
    }

    /// Receive one datagram (blocking) and persist it.
    ///
    /// A write failure is returned as [`TransportError::Persist`]; callers must
    /// stop receiving at that point.
    pub fn step(&mut self) -> Result<Received> {
        let received = self.socket.recv_datagram(&mut self.buf)?;
        let payload = &self.buf[..received.len];

        self.store
            .write_all(payload)
            .and_then(|()| self.store.flush())
            .map_err(|source| TransportError::Persist {
                len: payload.len(),
                source,
            })?;

        self.record(&received);
        Ok(received)
    }

    /// Run the receive loop until `limit` datagrams were persisted, or forever.
    pub fn run(&mut self, limit: Option<u64>) -> Result<SinkStats> {
        debug!(
            local_addr = %self.socket.local_addr(),
            max_datagram_size = self.config.max_datagram_size,
            ?limit,
            "capture loop started"
        );

        while limit.is_none_or(|limit| self.stats.datagrams < limit) {
            self.step()?;
        }

        info!(
            datagrams = self.stats.datagrams,
            bytes = self.stats.bytes,
            truncated = self.stats.truncated,
            "capture finished"
        );
        Ok(self.stats)
    }

    fn record(&mut self, received: &Received) {
        self.stats.datagrams += 1;
        self.stats.bytes += received.len as u64;
        self.stats.largest = self.stats.largest.max(received.len);

        if received.is_truncated() {
            self.stats.truncated += 1;
            warn!(
                kept = received.len,
                sent = received.wire_len,
                peer = ?received.peer,
                "datagram truncated by undersized receive buffer"
            );
        }

        let interval = self.config.progress_interval;
        if interval > 0 && self.stats.datagrams % interval == 0 {
            info!(
                datagrams = self.stats.datagrams,
                bytes = self.stats.bytes,
                truncated = self.stats.truncated,
                "capture progress"
            );
        }
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> SinkStats {
        self.stats
    }

    /// Address the sink is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.socket.local_addr()
    }

    /// Borrow the store.
    pub fn get_ref(&self) -> &W {
        &self.store
    }
}
