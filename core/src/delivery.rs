//! Delivery client
//!
//! Performs exactly one bounded round trip per call: link check, connect,
//! POST, read status. It never retries; cadence belongs to the scheduler.
//!
//! ## Outcome classification
//!
//! | Result of the attempt           | Outcome                      |
//! |---------------------------------|------------------------------|
//! | link predicate false            | `LinkDown` (no network call) |
//! | status `200`                    | `Delivered(200, body)`       |
//! | any other status                | `Rejected(status)`           |
//! | connect/send/read failure       | `TransportError(code)`       |
//! | response timeout expired        | `TransportError(-11)`        |
//!
//! The connection is owned by the attempt future. It is dropped, and
//! therefore released, on every exit path including the timeout.

use embassy_futures::select::{select, Either};
use embedded_hal_async::delay::DelayNs;
use embedded_io_async::{Error as _, ErrorKind};
use hal_abstractions::{LinkProbe, Transport};
use heapless::String;

use crate::encoder::Payload;
use crate::endpoint::Endpoint;
use crate::http::{self, Response, RESPONSE_BODY_CAPACITY};

/// Response body retained from a successful delivery
pub type ResponseBody = String<RESPONSE_BODY_CAPACITY>;

/// Transport failure codes
///
/// Negative sentinels in the numbering used by the Arduino-ESP32
/// `HTTPClient`, so existing log tooling keeps matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(i16)]
pub enum TransportErrorCode {
    ConnectionRefused = -1,
    SendHeaderFailed = -2,
    SendPayloadFailed = -3,
    NotConnected = -4,
    ConnectionLost = -5,
    /// Never produced; the connection is always the response stream
    NoStream = -6,
    NoHttpServer = -7,
    TooLessRam = -8,
    Encoding = -9,
    /// Never produced; write failures report the part that failed
    StreamWrite = -10,
    ReadTimeout = -11,
}

impl TransportErrorCode {
    /// Numeric sentinel carried by `DeliveryOutcome::TransportError`
    pub const fn code(self) -> i16 {
        self as i16
    }
}

impl core::fmt::Display for TransportErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ConnectionRefused => write!(f, "Connection refused"),
            Self::SendHeaderFailed => write!(f, "Send header failed"),
            Self::SendPayloadFailed => write!(f, "Send payload failed"),
            Self::NotConnected => write!(f, "Not connected"),
            Self::ConnectionLost => write!(f, "Connection lost"),
            Self::NoStream => write!(f, "No stream"),
            Self::NoHttpServer => write!(f, "No HTTP server"),
            Self::TooLessRam => write!(f, "Not enough RAM"),
            Self::Encoding => write!(f, "Transfer encoding error"),
            Self::StreamWrite => write!(f, "Stream write error"),
            Self::ReadTimeout => write!(f, "Read timeout"),
        }
    }
}

impl core::error::Error for TransportErrorCode {}

/// Result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeliveryOutcome {
    /// Collector answered `200` with this body
    Delivered(u16, ResponseBody),
    /// Collector answered with a non-`200` status
    Rejected(u16),
    /// Link predicate was false; nothing was sent
    LinkDown,
    /// Round trip could not complete; carries a negative sentinel code
    TransportError(i16),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(..))
    }

    /// Emit the diagnostic line for this outcome
    pub fn log(&self) {
        match self {
            Self::Delivered(status, body) => {
                info!("Response Code: {}", status);
                info!("Response: {}", body.as_str());
            }
            Self::Rejected(status) => warn!("Error on sending POST: {}", status),
            Self::LinkDown => warn!("Error in Ethernet connection"),
            Self::TransportError(code) => warn!("Error on sending POST: {}", code),
        }
    }
}

impl From<Response> for DeliveryOutcome {
    fn from(response: Response) -> Self {
        if response.status == 200 {
            Self::Delivered(response.status, response.body)
        } else {
            Self::Rejected(response.status)
        }
    }
}

impl From<TransportErrorCode> for DeliveryOutcome {
    fn from(code: TransportErrorCode) -> Self {
        Self::TransportError(code.code())
    }
}

/// Single-shot delivery of payloads to the collector
///
/// Owns exactly the handles it needs: the link predicate, the transport and
/// a delay source bounding each attempt.
pub struct DeliveryClient<L, T, D> {
    link: L,
    transport: T,
    delay: D,
    timeout_ms: u32,
}

impl<L, T, D> DeliveryClient<L, T, D>
where
    L: LinkProbe,
    T: Transport,
    D: DelayNs,
{
    /// Create a client whose attempts give up after `timeout_ms`
    pub fn new(link: L, transport: T, delay: D, timeout_ms: u32) -> Self {
        Self {
            link,
            transport,
            delay,
            timeout_ms,
        }
    }

    /// Attempt one delivery of `payload` to `endpoint`
    ///
    /// Never retries. Returns `LinkDown` immediately, without touching the
    /// transport, when the link predicate is false.
    pub async fn deliver(&mut self, endpoint: &Endpoint<'_>, payload: &Payload) -> DeliveryOutcome {
        if !self.link.is_link_up() {
            let outcome = DeliveryOutcome::LinkDown;
            outcome.log();
            return outcome;
        }

        info!(
            "Connecting to collector at {}:{}",
            endpoint.host(),
            endpoint.port()
        );

        let attempt = round_trip(&mut self.transport, endpoint, payload);
        let outcome = match select(attempt, self.delay.delay_ms(self.timeout_ms)).await {
            Either::First(Ok(response)) => DeliveryOutcome::from(response),
            Either::First(Err(code)) => DeliveryOutcome::from(code),
            Either::Second(()) => DeliveryOutcome::from(TransportErrorCode::ReadTimeout),
        };

        outcome.log();
        outcome
    }

    /// Borrow the transport (diagnostics and tests)
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

async fn round_trip<T: Transport>(
    transport: &mut T,
    endpoint: &Endpoint<'_>,
    payload: &Payload,
) -> Result<Response, TransportErrorCode> {
    let mut connection = transport
        .connect(endpoint.host(), endpoint.port())
        .await
        .map_err(|e| {
            debug!("Connect to {} failed", endpoint.host());
            connect_failure(e.kind())
        })?;

    http::write_post(&mut connection, endpoint, payload.as_bytes()).await?;
    http::read_response(&mut connection).await
}

fn connect_failure(kind: ErrorKind) -> TransportErrorCode {
    match kind {
        ErrorKind::TimedOut => TransportErrorCode::ReadTimeout,
        ErrorKind::NotConnected => TransportErrorCode::NotConnected,
        _ => TransportErrorCode::ConnectionRefused,
    }
}
