//! UDP ingest and capture storage for I2S audio bridged onto datagrams.
//!
//! This is the lowest layer of i2scap:
//! - [`DatagramSocket`]: a bound UDP socket with blocking, timeout-free receives
//!   that reports truncated datagrams where the platform allows it
//! - [`CaptureStore`]: an unbuffered, append-only capture file
//! - [`CaptureSink`]: the receive → persist loop tying the two together
//! - [`DatagramSender`]: replays a byte stream as fixed-size datagrams
//!
//! Nothing here retries, reorders or buffers. Datagrams dropped by the OS
//! are not seen at this layer; they surface as sequence counter gaps once the
//! capture is decoded.

pub mod error;
pub mod sender;
pub mod sink;
pub mod store;
pub mod udp;

pub use error::{Result, TransportError};
pub use sender::{DatagramSender, SendStats};
pub use sink::{CaptureSink, SinkConfig, SinkStats, DEFAULT_PROGRESS_INTERVAL};
pub use store::{CaptureStore, StoreMode};
pub use udp::{DatagramSocket, Received, SocketOptions, DEFAULT_MAX_DATAGRAM, MAX_UDP_PAYLOAD};
