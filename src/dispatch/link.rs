//! Transient transport to one game server.
//!
//! # Responsibilities
//! - Open a UDP socket connected to the peer, or a TCP stream
//! - Send requests and receive bounded replies
//!
//! # Design Decisions
//! - A `Link` is owned by exactly one dispatch; dropping it closes the
//!   socket, so every exit path (including a timed-out future) releases it
//! - Connected UDP sockets surface ICMP port-unreachable as an error
//!   instead of waiting for the deadline

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

use crate::protocol::Transport;

#[derive(Debug)]
enum Channel {
    Udp(UdpSocket),
    Tcp(TcpStream),
}

/// A connected, single-use transport.
#[derive(Debug)]
pub struct Link {
    channel: Channel,
    peer: SocketAddr,
    max_packet: usize,
}

impl Link {
    /// Open a link of the given transport to `peer`.
    pub async fn open(
        transport: Transport,
        peer: SocketAddr,
        max_packet: usize,
    ) -> io::Result<Self> {
        let channel = match transport {
            Transport::Udp => {
                let local: SocketAddr = if peer.is_ipv4() {
                    (Ipv4Addr::UNSPECIFIED, 0).into()
                } else {
                    (Ipv6Addr::UNSPECIFIED, 0).into()
                };
                let socket = UdpSocket::bind(local).await?;
                socket.connect(peer).await?;
                Channel::Udp(socket)
            }
            Transport::Tcp => Channel::Tcp(TcpStream::connect(peer).await?),
        };

        tracing::trace!(peer = %peer, ?transport, "Link opened");
        Ok(Self {
            channel,
            peer,
            max_packet,
        })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Send one request (one datagram for UDP).
    pub async fn send(&mut self, data: &[u8]) -> io::Result<()> {
        match &mut self.channel {
            Channel::Udp(socket) => {
                socket.send(data).await?;
            }
            Channel::Tcp(stream) => stream.write_all(data).await?,
        }
        Ok(())
    }

    /// Receive one reply chunk of at most `max_packet` bytes.
    ///
    /// For UDP this is exactly one datagram. For TCP an orderly close before
    /// any byte arrives is reported as `UnexpectedEof`.
    pub async fn recv(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; self.max_packet];
        let n = match &mut self.channel {
            Channel::Udp(socket) => socket.recv(&mut buf).await?,
            Channel::Tcp(stream) => {
                let n = stream.read(&mut buf).await?;
                if n == 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "peer closed the connection",
                    ));
                }
                n
            }
        };
        buf.truncate(n);
        Ok(buf)
    }
}
