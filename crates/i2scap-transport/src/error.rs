use std::net::SocketAddr;
use std::path::PathBuf;

/// Errors that can occur while ingesting or persisting datagrams.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind the UDP listener.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to open or create the capture store.
    #[error("failed to open capture store {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A datagram receive failed.
    #[error("failed to receive datagram: {0}")]
    Receive(std::io::Error),

    /// A datagram could not be written to the capture store.
    ///
    /// Always fatal for the sink: there is no buffer to retry from.
    #[error("failed to persist datagram ({len} bytes): {source}")]
    Persist { len: usize, source: std::io::Error },

    /// A datagram could not be sent.
    #[error("failed to send datagram to {addr}: {source}")]
    Send {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Applying a socket option failed.
    #[error("failed to set socket option {option}: {source}")]
    SocketOption {
        option: &'static str,
        source: std::io::Error,
    },

    /// The sink or sender was configured with values it cannot run with.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),

    /// Any other I/O error on the socket or store.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
