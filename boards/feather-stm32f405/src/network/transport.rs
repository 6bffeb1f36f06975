#![deny(unsafe_code)]
#![deny(warnings)]
//! Telemetry transport over embassy-net
//!
//! Implements the `hal_abstractions` network boundary on top of the W5500
//! stack: `EthLink` answers the link-up predicate, `TcpTransport` resolves
//! the collector host and opens one TCP connection per delivery attempt.

use defmt::debug;
use embassy_net::dns::DnsQueryType;
use embassy_net::{IpEndpoint, Stack};
use embassy_time::Duration;
use hal_abstractions::{LinkProbe, Transport};

use super::error::NetworkError;
use super::socket::AsyncTcpSocket;

/// TCP buffer size; one request and one bounded response fit comfortably
pub const SOCKET_BUFFER_SIZE: usize = 1024;

/// Link predicate backed by the PHY link state
#[derive(Clone, Copy)]
pub struct EthLink {
    stack: Stack<'static>,
}

impl EthLink {
    pub fn new(stack: Stack<'static>) -> Self {
        Self { stack }
    }
}

impl LinkProbe for EthLink {
    fn is_link_up(&self) -> bool {
        self.stack.is_link_up()
    }
}

/// One-connection-at-a-time TCP transport
///
/// Owns the socket buffers, so a connection borrows the transport for its
/// whole lifetime and at most one can be open.
pub struct TcpTransport {
    stack: Stack<'static>,
    rx_buffer: &'static mut [u8; SOCKET_BUFFER_SIZE],
    tx_buffer: &'static mut [u8; SOCKET_BUFFER_SIZE],
    timeout: Duration,
}

impl TcpTransport {
    pub fn new(
        stack: Stack<'static>,
        rx_buffer: &'static mut [u8; SOCKET_BUFFER_SIZE],
        tx_buffer: &'static mut [u8; SOCKET_BUFFER_SIZE],
        timeout_ms: u64,
    ) -> Self {
        Self {
            stack,
            rx_buffer,
            tx_buffer,
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

impl Transport for TcpTransport {
    type Error = NetworkError;
    type Connection<'a>
        = AsyncTcpSocket<'a>
    where
        Self: 'a;

    async fn connect(&mut self, host: &str, port: u16) -> Result<AsyncTcpSocket<'_>, NetworkError> {
        // IP literals are parsed without a DNS round trip
        let addrs = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(|_| NetworkError::DnsError)?;
        let addr = addrs.first().copied().ok_or(NetworkError::DnsError)?;
        debug!("Resolved {} to {}", host, addr);

        let mut socket = AsyncTcpSocket::new(
            self.stack,
            &mut self.rx_buffer[..],
            &mut self.tx_buffer[..],
            self.timeout,
        );
        socket.connect(IpEndpoint::new(addr, port)).await?;
        Ok(socket)
    }
}
