use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Default receive buffer size: 40 frames of 32 bytes, the bridge's burst size.
pub const DEFAULT_MAX_DATAGRAM: usize = 1280;

/// Largest payload a UDP datagram can carry over IPv4.
pub const MAX_UDP_PAYLOAD: usize = 65_507;

/// Socket-level tuning applied at bind time.
#[derive(Debug, Clone, Default)]
pub struct SocketOptions {
    /// Requested kernel receive queue size (`SO_RCVBUF`), in bytes.
    ///
    /// `None` keeps the OS default.
    pub recv_buffer_size: Option<usize>,
}

/// Outcome of a single datagram receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Received {
    /// Bytes placed into the caller's buffer.
    pub len: usize,
    /// Length of the datagram as sent.
    ///
    /// Only Linux reports this for oversized datagrams; elsewhere it equals `len`.
    pub wire_len: usize,
    /// Sender address, when the platform reports it.
    pub peer: Option<SocketAddr>,
}

impl Received {
    /// True if trailing bytes of the datagram were dropped by an undersized buffer.
    pub fn is_truncated(&self) -> bool {
        self.wire_len > self.len
    }
}

/// A bound UDP socket receiving datagrams with blocking, timeout-free reads.
#[derive(Debug)]
pub struct DatagramSocket {
    socket: UdpSocket,
    local_addr: SocketAddr,
}

impl DatagramSocket {
    /// Bind a UDP socket at `addr` and apply `options`.
    pub fn bind(addr: SocketAddr, options: &SocketOptions) -> Result<Self> {
        let socket = UdpSocket::bind(addr).map_err(|source| TransportError::Bind { addr, source })?;

        if let Some(size) = options.recv_buffer_size {
            set_recv_buffer_size(&socket, size)?;
            debug!(
                requested = size,
                effective = ?recv_buffer_size(&socket),
                "applied socket receive buffer size"
            );
        }

        let local_addr = socket.local_addr()?;
        info!(%local_addr, "listening for datagrams");

        Ok(Self { socket, local_addr })
    }

    /// The address the socket is bound to (resolves port `0`).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Block until one datagram arrives and copy it into `buf`.
    ///
    /// A datagram larger than `buf` is truncated; see [`Received::is_truncated`].
    pub fn recv_datagram(&self, buf: &mut [u8]) -> Result<Received> {
        loop {
            match recv_impl(&self.socket, buf) {
                Ok(received) => return Ok(received),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Receive(err)),
            }
        }
    }
}

#[cfg(target_os = "linux")]
fn recv_impl(socket: &UdpSocket, buf: &mut [u8]) -> std::io::Result<Received> {
    use std::os::fd::AsRawFd;

    // SAFETY: `sockaddr_storage` is plain old data; all-zero is a valid value.
    let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
    let mut addr_len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

    // SAFETY: `buf` is a valid writable region of `buf.len()` bytes, `storage` and
    // `addr_len` are valid writable pointers sized for any socket address, and the
    // descriptor is an open UDP socket owned by `socket`. With MSG_TRUNC the kernel
    // writes at most `buf.len()` bytes and returns the full datagram length.
    let rc = unsafe {
        libc::recvfrom(
            socket.as_raw_fd(),
            buf.as_mut_ptr().cast::<libc::c_void>(),
            buf.len(),
            libc::MSG_TRUNC,
            (&mut storage as *mut libc::sockaddr_storage).cast::<libc::sockaddr>(),
            &mut addr_len,
        )
    };

    if rc < 0 {
        return Err(std::io::Error::last_os_error());
    }

    let wire_len = rc as usize;
    Ok(Received {
        len: wire_len.min(buf.len()),
        wire_len,
        peer: peer_addr(&storage),
    })
}

#[cfg(not(target_os = "linux"))]
fn recv_impl(socket: &UdpSocket, buf: &mut [u8]) -> std::io::Result<Received> {
    let (len, peer) = socket.recv_from(buf)?;
    Ok(Received {
        len,
        wire_len: len,
        peer: Some(peer),
    })
}

#[cfg(target_os = "linux")]
fn peer_addr(storage: &libc::sockaddr_storage) -> Option<SocketAddr> {
    use std::net::{Ipv4Addr, Ipv6Addr, SocketAddrV6};

    match storage.ss_family as libc::c_int {
        libc::AF_INET => {
            // SAFETY: the family tag says the storage holds a `sockaddr_in`.
            let sin = unsafe {
                &*(storage as *const libc::sockaddr_storage).cast::<libc::sockaddr_in>()
            };
            let ip = Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr));
            Some(SocketAddr::from((ip, u16::from_be(sin.sin_port))))
        }
        libc::AF_INET6 => {
            // SAFETY: the family tag says the storage holds a `sockaddr_in6`.
            let sin6 = unsafe {
                &*(storage as *const libc::sockaddr_storage).cast::<libc::sockaddr_in6>()
            };
            let ip = Ipv6Addr::from(sin6.sin6_addr.s6_addr);
            Some(SocketAddr::V6(SocketAddrV6::new(
                ip,
                u16::from_be(sin6.sin6_port),
                sin6.sin6_flowinfo,
                sin6.sin6_scope_id,
            )))
        }
        _ => None,
    }
}

#[cfg(unix)]
fn set_recv_buffer_size(socket: &UdpSocket, size: usize) -> Result<()> {
    use std::os::fd::AsRawFd;

    let value = libc::c_int::try_from(size).map_err(|_| {
        TransportError::InvalidConfig(format!("receive buffer size {size} exceeds c_int"))
    })?;

    // SAFETY: `value` is a valid readable `c_int` for the given length, and the
    // descriptor is an open socket owned by `socket`.
    let rc = unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_RCVBUF,
            (&value as *const libc::c_int).cast::<libc::c_void>(),
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };

    if rc != 0 {
        return Err(TransportError::SocketOption {
            option: "SO_RCVBUF",
            source: std::io::Error::last_os_error(),
        });
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_recv_buffer_size(_socket: &UdpSocket, size: usize) -> Result<()> {
    tracing::warn!(size, "socket receive buffer sizing is not supported on this platform");
    Ok(())
}

#[cfg(unix)]
fn recv_buffer_size(socket: &UdpSocket) -> Option<usize> {
    use std::os::fd::AsRawFd;

    let mut value: libc::c_int = 0;
    let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;

    // SAFETY: `value` and `len` are valid writable pointers for the provided sizes,
    // and the descriptor is an open socket owned by `socket`.
    let rc = unsafe {
        libc::getsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_RCVBUF,
            (&mut value as *mut libc::c_int).cast::<libc::c_void>(),
            &mut len,
        )
    };

    if rc == 0 {
        usize::try_from(value).ok()
    } else {
        None
    }
}

#[cfg(not(unix))]
fn recv_buffer_size(_socket: &UdpSocket) -> Option<usize> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[test]
    fn bind_resolves_ephemeral_port() {
        let socket = DatagramSocket::bind(loopback(), &SocketOptions::default()).unwrap();
        assert_ne!(socket.local_addr().port(), 0);
    }

    #[test]
    fn bind_conflict_is_reported_with_address() {
        let first = DatagramSocket::bind(loopback(), &SocketOptions::default()).unwrap();
        let taken = first.local_addr();

        let err = DatagramSocket::bind(taken, &SocketOptions::default()).unwrap_err();
        assert!(matches!(err, TransportError::Bind { addr, .. } if addr == taken));
    }

    #[test]
    fn receives_datagram_verbatim() {
        let socket = DatagramSocket::bind(loopback(), &SocketOptions::default()).unwrap();
        let sender = UdpSocket::bind(loopback()).unwrap();
        sender.send_to(b"\x01\x02\x03\x04", socket.local_addr()).unwrap();

        let mut buf = [0u8; 64];
        let received = socket.recv_datagram(&mut buf).unwrap();

        assert_eq!(&buf[..received.len], b"\x01\x02\x03\x04");
        assert!(!received.is_truncated());
        assert_eq!(received.peer, Some(sender.local_addr().unwrap()));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn reports_truncated_datagram() {
        let socket = DatagramSocket::bind(loopback(), &SocketOptions::default()).unwrap();
        let sender = UdpSocket::bind(loopback()).unwrap();
        sender.send_to(&[0xAB; 100], socket.local_addr()).unwrap();

        let mut buf = [0u8; 32];
        let received = socket.recv_datagram(&mut buf).unwrap();

        assert_eq!(received.len, 32);
        assert_eq!(received.wire_len, 100);
        assert!(received.is_truncated());
        assert_eq!(buf, [0xAB; 32]);
    }

    #[test]
    #[cfg(unix)]
    fn applies_recv_buffer_size() {
        let options = SocketOptions {
            recv_buffer_size: Some(256 * 1024),
        };
        let socket = DatagramSocket::bind(loopback(), &options).unwrap();
        assert!(recv_buffer_size(&socket.socket).unwrap_or(0) > 0);
    }
}
