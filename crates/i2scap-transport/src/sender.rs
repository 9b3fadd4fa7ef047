use std::io::{ErrorKind, Read};
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::udp::MAX_UDP_PAYLOAD;

/// Counters for a finished replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendStats {
    /// Datagrams sent.
    pub datagrams: u64,
    /// Payload bytes sent.
    pub bytes: u64,
}

/// Sends a byte stream as a sequence of UDP datagrams, the way the bridge
/// hardware does: fixed-size bursts, in order, with no acknowledgement.
#[derive(Debug)]
pub struct DatagramSender {
    socket: UdpSocket,
    target: SocketAddr,
}

impl DatagramSender {
    /// Bind an ephemeral local socket for sending to `target`.
    pub fn connect(target: SocketAddr) -> Result<Self> {
        let local: SocketAddr = if target.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(local).map_err(|source| TransportError::Bind {
            addr: local,
            source,
        })?;
        socket
            .connect(target)
            .map_err(|source| TransportError::Send {
                addr: target,
                source,
            })?;
        debug!(%target, "sender ready");

        Ok(Self { socket, target })
    }

    /// Destination address.
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Send one datagram.
    pub fn send(&self, payload: &[u8]) -> Result<()> {
        loop {
            match self.socket.send(payload) {
                Ok(_) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(TransportError::Send {
                        addr: self.target,
                        source,
                    })
                }
            }
        }
    }

    /// Read `input` to its end, sending every `datagram_size` bytes as one datagram.
    ///
    /// The final datagram may be shorter. `interval` pauses between datagrams to
    /// approximate the bridge's send rate.
    pub fn send_stream<R: Read>(
        &self,
        mut input: R,
        datagram_size: usize,
        interval: Option<Duration>,
    ) -> Result<SendStats> {
        if datagram_size == 0 || datagram_size > MAX_UDP_PAYLOAD {
            return Err(TransportError::InvalidConfig(format!(
                "datagram size must be within 1..={MAX_UDP_PAYLOAD}, got {datagram_size}"
            )));
        }

        let mut buf = vec![0u8; datagram_size];
        let mut stats = SendStats::default();

        loop {
            let filled = fill(&mut input, &mut buf)?;
            if filled == 0 {
                break;
            }

            self.send(&buf[..filled])?;
            stats.datagrams += 1;
            stats.bytes += filled as u64;

            if let Some(interval) = interval {
                std::thread::sleep(interval);
            }
            if filled < datagram_size {
                break;
            }
        }

        info!(
            target = %self.target,
            datagrams = stats.datagrams,
            bytes = stats.bytes,
            "replay finished"
        );
        Ok(stats)
    }
}

/// Read until `buf` is full or the input ends.
fn fill<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn splits_stream_into_fixed_datagrams() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let sender = DatagramSender::connect(receiver.local_addr().unwrap()).unwrap();

        let data: Vec<u8> = (0..100u8).collect();
        let stats = sender.send_stream(Cursor::new(data.clone()), 32, None).unwrap();
        assert_eq!(stats.datagrams, 4);
        assert_eq!(stats.bytes, 100);

        let mut buf = [0u8; 64];
        let mut got = Vec::new();
        let mut sizes = Vec::new();
        for _ in 0..4 {
            let (n, _) = receiver.recv_from(&mut buf).unwrap();
            sizes.push(n);
            got.extend_from_slice(&buf[..n]);
        }
        assert_eq!(sizes, vec![32, 32, 32, 4]);
        assert_eq!(got, data);
    }

    #[test]
    fn empty_stream_sends_nothing() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let sender = DatagramSender::connect(receiver.local_addr().unwrap()).unwrap();
        let stats = sender
            .send_stream(Cursor::new(Vec::<u8>::new()), 32, None)
            .unwrap();
        assert_eq!(stats, SendStats::default());
    }

    #[test]
    fn rejects_oversized_datagram() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let sender = DatagramSender::connect(receiver.local_addr().unwrap()).unwrap();
        let err = sender
            .send_stream(Cursor::new(vec![0u8; 4]), MAX_UDP_PAYLOAD + 1, None)
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidConfig(_)));
    }
}
