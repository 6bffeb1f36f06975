//! Network link and transport boundary
//!
//! Link bring-up (PHY reset, address assignment) is board plumbing. The core
//! only asks whether the link is up and, when it is, opens one connection
//! per delivery attempt.

use embedded_io_async::{Read, Write};

/// Boolean "network link is up" predicate
///
/// Must be a fast, synchronous check with no network traffic.
pub trait LinkProbe {
    fn is_link_up(&self) -> bool;
}

impl<L: LinkProbe + ?Sized> LinkProbe for &L {
    fn is_link_up(&self) -> bool {
        (**self).is_link_up()
    }
}

/// Connection-oriented byte transport
///
/// Each call to [`Transport::connect`] yields a fresh stream. The stream is
/// released when dropped, so every exit path of the caller frees it.
///
/// # Example Implementation
///
/// ```ignore
/// impl Transport for TcpTransport {
///     type Error = NetworkError;
///     type Connection<'a> = AsyncTcpSocket<'a>;
///
///     async fn connect(&mut self, host: &str, port: u16) -> Result<AsyncTcpSocket<'_>, NetworkError> {
///         let addr = self.resolve(host).await?;
///         let mut socket = AsyncTcpSocket::new(self.stack, &mut self.rx, &mut self.tx);
///         socket.connect(IpEndpoint::new(addr, port)).await?;
///         Ok(socket)
///     }
/// }
/// ```
pub trait Transport {
    /// Error reported by connect, read and write
    type Error: embedded_io_async::Error;

    /// Open stream borrowed from the transport
    type Connection<'a>: Read<Error = Self::Error> + Write<Error = Self::Error>
    where
        Self: 'a;

    /// Open a connection to `host:port`
    ///
    /// `host` may be a hostname or an IP literal.
    fn connect(
        &mut self,
        host: &str,
        port: u16,
    ) -> impl core::future::Future<Output = Result<Self::Connection<'_>, Self::Error>>;
}
