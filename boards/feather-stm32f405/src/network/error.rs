#![deny(unsafe_code)]
#![deny(warnings)]
//! Network error types

use defmt::Format;

/// Transport operation errors
#[derive(Debug, Clone, Copy, Format)]
pub enum NetworkError {
    /// DNS resolution failed
    DnsError,
    /// Socket connect error
    SocketError,
    /// Peer reset the connection mid-exchange
    ConnectionReset,
    /// Socket inactivity timeout
    Timeout,
}

impl core::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DnsError => write!(f, "DNS resolution failed"),
            Self::SocketError => write!(f, "Socket error"),
            Self::ConnectionReset => write!(f, "Connection reset"),
            Self::Timeout => write!(f, "Request timeout"),
        }
    }
}

// Implement core::error::Error for no_std compatibility
impl core::error::Error for NetworkError {}

impl embedded_io_async::Error for NetworkError {
    fn kind(&self) -> embedded_io_async::ErrorKind {
        match self {
            Self::SocketError => embedded_io_async::ErrorKind::ConnectionRefused,
            Self::ConnectionReset => embedded_io_async::ErrorKind::ConnectionReset,
            Self::Timeout => embedded_io_async::ErrorKind::TimedOut,
            Self::DnsError => embedded_io_async::ErrorKind::Other,
        }
    }
}

impl From<embassy_net::tcp::Error> for NetworkError {
    fn from(_: embassy_net::tcp::Error) -> Self {
        // ConnectionReset is the only variant
        Self::ConnectionReset
    }
}

impl From<embassy_net::tcp::ConnectError> for NetworkError {
    fn from(e: embassy_net::tcp::ConnectError) -> Self {
        match e {
            embassy_net::tcp::ConnectError::TimedOut => Self::Timeout,
            _ => Self::SocketError,
        }
    }
}
