//! Collector endpoint address
//!
//! The collector is a single fixed `http://host[:port][/path]` URL supplied
//! at boot. It is parsed once; a bad URL is a configuration error rather
//! than a per-cycle delivery failure.

/// Default HTTP port when the URL omits one
pub const DEFAULT_HTTP_PORT: u16 = 80;

const SCHEME: &str = "http://";

/// Parsed collector address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Endpoint<'a> {
    host: &'a str,
    port: u16,
    path: &'a str,
}

impl<'a> Endpoint<'a> {
    /// Parse an `http://` URL
    ///
    /// # Errors
    ///
    /// - `UnsupportedScheme` for anything other than plain `http://`
    /// - `MissingHost` when the authority is empty
    /// - `InvalidPort` when the port is not a number in `1..=65535`
    pub fn parse(url: &'a str) -> Result<Self, EndpointError> {
        let rest = match url.get(..SCHEME.len()) {
            Some(scheme) if scheme.eq_ignore_ascii_case(SCHEME) => &url[SCHEME.len()..],
            _ => return Err(EndpointError::UnsupportedScheme),
        };

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .ok()
                    .filter(|&p| p != 0)
                    .ok_or(EndpointError::InvalidPort)?;
                (host, port)
            }
            None => (authority, DEFAULT_HTTP_PORT),
        };

        if host.is_empty() {
            return Err(EndpointError::MissingHost);
        }

        Ok(Self { host, port, path })
    }

    /// Hostname or IP literal
    pub const fn host(&self) -> &'a str {
        self.host
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Request target, always starting with `/`
    pub const fn path(&self) -> &'a str {
        self.path
    }
}

/// Endpoint parsing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EndpointError {
    /// Scheme is not `http://`
    UnsupportedScheme,
    /// No host between the scheme and the path
    MissingHost,
    /// Port is not a number in `1..=65535`
    InvalidPort,
}

impl core::fmt::Display for EndpointError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnsupportedScheme => write!(f, "Unsupported URL scheme"),
            Self::MissingHost => write!(f, "Missing host"),
            Self::InvalidPort => write!(f, "Invalid port"),
        }
    }
}

impl core::error::Error for EndpointError {}
