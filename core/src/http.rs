//! Minimal HTTP/1.1 POST exchange
//!
//! Just enough HTTP to submit one JSON body and read back the status code
//! and a bounded prefix of the response body. Every request carries
//! `Connection: close`, so the response ends at `Content-Length`, at the
//! last chunk of a chunked body, or at end of stream.

use core::fmt::Write as _;

use embedded_io_async::{ErrorKind, Read, Write};
use heapless::{String, Vec};

use crate::delivery::TransportErrorCode;
use crate::endpoint::Endpoint;

/// Buffer for the request head and for the response status line + headers
pub const HEAD_BUFFER_SIZE: usize = 512;

/// Response body bytes retained for diagnostics
pub const RESPONSE_BODY_CAPACITY: usize = 128;

const USER_AGENT: &str = "eth-telemetry/0.1";

/// Status and body of a completed exchange
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String<RESPONSE_BODY_CAPACITY>,
}

/// Write a `POST` request carrying `body` as `application/json`
///
/// # Errors
///
/// - `TooLessRam` if the request head does not fit [`HEAD_BUFFER_SIZE`]
/// - `SendHeaderFailed` / `SendPayloadFailed` on stream write errors
pub async fn write_post<W: Write>(
    writer: &mut W,
    endpoint: &Endpoint<'_>,
    body: &[u8],
) -> Result<(), TransportErrorCode> {
    let mut head: String<HEAD_BUFFER_SIZE> = String::new();
    write!(
        head,
        "POST {} HTTP/1.1\r\n\
         Host: {}:{}\r\n\
         User-Agent: {}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n",
        endpoint.path(),
        endpoint.host(),
        endpoint.port(),
        USER_AGENT,
        body.len()
    )
    .map_err(|_| TransportErrorCode::TooLessRam)?;

    writer
        .write_all(head.as_bytes())
        .await
        .map_err(|_| TransportErrorCode::SendHeaderFailed)?;
    writer
        .write_all(body)
        .await
        .map_err(|_| TransportErrorCode::SendPayloadFailed)?;
    writer
        .flush()
        .await
        .map_err(|_| TransportErrorCode::SendPayloadFailed)
}

/// Read the status line, headers and body of a response
///
/// Bodies are delimited by `Content-Length`, by `Transfer-Encoding: chunked`
/// framing, or by end of stream.
///
/// # Errors
///
/// - `ConnectionLost` if the stream fails or closes before any byte arrives
/// - `ReadTimeout` / `NotConnected` when the socket reports that kind of failure
/// - `NoHttpServer` if the status line or header block is malformed
/// - `TooLessRam` if the header block exceeds [`HEAD_BUFFER_SIZE`]
/// - `Encoding` for an unsupported transfer coding or broken chunk framing
pub async fn read_response<R: Read>(reader: &mut R) -> Result<Response, TransportErrorCode> {
    let mut buf = [0u8; HEAD_BUFFER_SIZE];
    let mut filled = 0;

    let head_len = loop {
        if let Some(pos) = find_head_end(&buf[..filled]) {
            break pos;
        }
        if filled == buf.len() {
            return Err(TransportErrorCode::TooLessRam);
        }
        let n = reader.read(&mut buf[filled..]).await.map_err(read_failure)?;
        if n == 0 {
            return Err(if filled == 0 {
                TransportErrorCode::ConnectionLost
            } else {
                TransportErrorCode::NoHttpServer
            });
        }
        filled += n;
    };

    let head =
        core::str::from_utf8(&buf[..head_len]).map_err(|_| TransportErrorCode::NoHttpServer)?;
    let mut lines = head.split("\r\n");
    let status = parse_status_line(lines.next().unwrap_or_default())?;

    let mut content_length = None;
    let mut chunked = false;
    for (name, value) in lines.filter_map(|line| line.split_once(':')) {
        let (name, value) = (name.trim(), value.trim());
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().ok();
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            if !value.eq_ignore_ascii_case("chunked") {
                return Err(TransportErrorCode::Encoding);
            }
            chunked = true;
        }
    }

    // Body bytes already buffered after the blank line come first
    let body_start = head_len + 4;
    let mut stream = ByteStream {
        reader,
        buf,
        pos: body_start,
        end: filled,
    };
    let mut body: Vec<u8, RESPONSE_BODY_CAPACITY> = Vec::new();

    if chunked {
        read_chunked(&mut stream, &mut body).await?;
    } else {
        let expected = content_length.unwrap_or(usize::MAX);
        let mut received = 0;
        while received < expected && !body.is_full() {
            let Some(byte) = stream.next().await? else {
                break;
            };
            received += 1;
            // Cannot fail: the loop stops once the body is full
            let _ = body.push(byte);
        }
    }

    Ok(Response {
        status,
        body: utf8_prefix(&body),
    })
}

/// Classify a failed read by the kind the socket reports
fn read_failure<E: embedded_io_async::Error>(e: E) -> TransportErrorCode {
    match e.kind() {
        ErrorKind::TimedOut => TransportErrorCode::ReadTimeout,
        ErrorKind::NotConnected => TransportErrorCode::NotConnected,
        _ => TransportErrorCode::ConnectionLost,
    }
}

/// Byte-at-a-time view of the response, starting with bytes already read
struct ByteStream<'r, R> {
    reader: &'r mut R,
    buf: [u8; HEAD_BUFFER_SIZE],
    pos: usize,
    end: usize,
}

impl<R: Read> ByteStream<'_, R> {
    /// Next byte, or `None` at end of stream
    async fn next(&mut self) -> Result<Option<u8>, TransportErrorCode> {
        if self.pos == self.end {
            let n = self.reader.read(&mut self.buf).await.map_err(read_failure)?;
            if n == 0 {
                return Ok(None);
            }
            self.pos = 0;
            self.end = n;
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        Ok(Some(byte))
    }

    /// One CRLF-terminated line without its terminator
    async fn line(&mut self) -> Result<Vec<u8, CHUNK_LINE_SIZE>, TransportErrorCode> {
        let mut line = Vec::new();
        loop {
            match self.next().await? {
                Some(b'\n') => break,
                Some(byte) => line.push(byte).map_err(|_| TransportErrorCode::Encoding)?,
                None => return Err(TransportErrorCode::Encoding),
            }
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(line)
    }
}

/// Longest chunk-size line accepted, extensions included
const CHUNK_LINE_SIZE: usize = 32;

/// Decode `Transfer-Encoding: chunked` until the last chunk or a full body
async fn read_chunked<R: Read>(
    stream: &mut ByteStream<'_, R>,
    body: &mut Vec<u8, RESPONSE_BODY_CAPACITY>,
) -> Result<(), TransportErrorCode> {
    loop {
        let size_line = stream.line().await?;
        let size = parse_chunk_size(&size_line)?;
        if size == 0 {
            // Trailers are not needed; the connection closes after this
            return Ok(());
        }

        for _ in 0..size {
            if body.is_full() {
                return Ok(());
            }
            let byte = stream.next().await?.ok_or(TransportErrorCode::Encoding)?;
            // Cannot fail: checked above
            let _ = body.push(byte);
        }

        if !stream.line().await?.is_empty() {
            return Err(TransportErrorCode::Encoding);
        }
    }
}

/// Parse the hex size in front of any `;extension`
fn parse_chunk_size(line: &[u8]) -> Result<usize, TransportErrorCode> {
    let text = core::str::from_utf8(line).map_err(|_| TransportErrorCode::Encoding)?;
    let digits = text.split(';').next().unwrap_or_default().trim();
    usize::from_str_radix(digits, 16).map_err(|_| TransportErrorCode::Encoding)
}

fn find_head_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Parse `HTTP/1.x <code> <reason>`
fn parse_status_line(line: &str) -> Result<u16, TransportErrorCode> {
    let mut parts = line.split(' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(TransportErrorCode::NoHttpServer);
    }
    parts
        .next()
        .filter(|code| code.len() == 3)
        .and_then(|code| code.parse::<u16>().ok())
        .filter(|code| (100..=999).contains(code))
        .ok_or(TransportErrorCode::NoHttpServer)
}

/// Longest valid UTF-8 prefix of `bytes`
fn utf8_prefix(bytes: &[u8]) -> String<RESPONSE_BODY_CAPACITY> {
    let text = match core::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
    };
    let mut out = String::new();
    // Cannot fail: text is at most RESPONSE_BODY_CAPACITY bytes
    let _ = out.push_str(text);
    out
}
