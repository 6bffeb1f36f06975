//! Hand-written stand-ins for the hardware boundary
//!
//! Each stub counts the calls made on it so tests can assert that a code
//! path did (or did not) touch the sensor, the link or the network.

use core::cell::Cell;
use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

use embedded_hal_async::delay::DelayNs;
use embedded_io_async::{ErrorKind, ErrorType, Read, Write};
use hal_abstractions::{Clock, DigitalInputs, EnvironmentSensor, LinkProbe, LogicLevel, Transport};

/// Manually advanced clock
#[derive(Default)]
pub struct FakeClock {
    now: Cell<u64>,
}

impl FakeClock {
    pub fn at(ms: u64) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Link predicate with a probe counter
pub struct FakeLink {
    up: Cell<bool>,
    probes: Cell<usize>,
}

impl FakeLink {
    pub fn up() -> Self {
        Self {
            up: Cell::new(true),
            probes: Cell::new(0),
        }
    }

    pub fn down() -> Self {
        Self {
            up: Cell::new(false),
            probes: Cell::new(0),
        }
    }

    pub fn probes(&self) -> usize {
        self.probes.get()
    }
}

impl LinkProbe for FakeLink {
    fn is_link_up(&self) -> bool {
        self.probes.set(self.probes.get() + 1);
        self.up.get()
    }
}

/// Sensor replaying fixed values
pub struct FakeSensor {
    pub temperature: f32,
    pub humidity: f32,
    pub reads: usize,
}

impl FakeSensor {
    pub fn new(temperature: f32, humidity: f32) -> Self {
        Self {
            temperature,
            humidity,
            reads: 0,
        }
    }
}

impl EnvironmentSensor for FakeSensor {
    async fn read_humidity(&mut self) -> f32 {
        self.reads += 1;
        self.humidity
    }

    async fn read_temperature(&mut self) -> f32 {
        self.reads += 1;
        self.temperature
    }
}

/// Eight input lines indexed by pin number
#[derive(Default)]
pub struct FakeInputs {
    pub levels: [bool; 8],
}

impl DigitalInputs for FakeInputs {
    type Pin = u8;

    fn read_level(&mut self, pin: u8) -> LogicLevel {
        LogicLevel::from(self.levels[usize::from(pin)])
    }
}

/// Delay that never completes
pub struct NeverDelay;

impl DelayNs for NeverDelay {
    async fn delay_ns(&mut self, _ns: u32) {
        core::future::pending::<()>().await
    }
}

/// Delay that completes on first poll
pub struct ImmediateDelay;

impl DelayNs for ImmediateDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

/// Stream error carrying the kind a real socket would report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StubError(pub ErrorKind);

impl core::fmt::Display for StubError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Stub stream error: {:?}", self.0)
    }
}

impl core::error::Error for StubError {}

impl embedded_io_async::Error for StubError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// In-memory stream replaying one scripted chunk per read
pub struct ScriptedConnection {
    chunks: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    flushed: bool,
    fail_writes: bool,
    read_error: Option<ErrorKind>,
    hang_reads: bool,
}

impl ScriptedConnection {
    pub fn new(chunks: &[&[u8]]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_vec()).collect(),
            written: Vec::new(),
            flushed: false,
            fail_writes: false,
            read_error: None,
            hang_reads: false,
        }
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn failing_reads_after_script(self) -> Self {
        self.read_error_after_script(ErrorKind::Other)
    }

    pub fn read_error_after_script(mut self, kind: ErrorKind) -> Self {
        self.read_error = Some(kind);
        self
    }

    pub fn hanging_reads(mut self) -> Self {
        self.hang_reads = true;
        self
    }

    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }

    pub fn flushed(&self) -> bool {
        self.flushed
    }
}

impl ErrorType for ScriptedConnection {
    type Error = StubError;
}

impl Read for ScriptedConnection {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StubError> {
        if self.hang_reads {
            return core::future::pending().await;
        }
        let Some(mut chunk) = self.chunks.pop_front() else {
            return match self.read_error {
                Some(kind) => Err(StubError(kind)),
                None => Ok(0),
            };
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.chunks.push_front(chunk.split_off(n));
        }
        Ok(n)
    }
}

impl Write for ScriptedConnection {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, StubError> {
        if self.fail_writes {
            return Err(StubError(ErrorKind::BrokenPipe));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), StubError> {
        self.flushed = true;
        Ok(())
    }
}

enum StubMode {
    Respond(Vec<u8>),
    Refuse(ErrorKind),
    Hang,
}

/// Transport handing out scripted connections
///
/// Counts connects and released (dropped) connections and keeps the bytes
/// written on the most recent connection.
pub struct StubTransport {
    mode: StubMode,
    connects: usize,
    released: usize,
    last_request: String,
}

impl StubTransport {
    pub fn responding(response: &[u8]) -> Self {
        Self::with_mode(StubMode::Respond(response.to_vec()))
    }

    pub fn refusing() -> Self {
        Self::with_mode(StubMode::Refuse(ErrorKind::ConnectionRefused))
    }

    /// Connect fails with a timed-out socket error
    pub fn timing_out() -> Self {
        Self::with_mode(StubMode::Refuse(ErrorKind::TimedOut))
    }

    pub fn hanging() -> Self {
        Self::with_mode(StubMode::Hang)
    }

    fn with_mode(mode: StubMode) -> Self {
        Self {
            mode,
            connects: 0,
            released: 0,
            last_request: String::new(),
        }
    }

    pub fn connects(&self) -> usize {
        self.connects
    }

    pub fn released(&self) -> usize {
        self.released
    }

    pub fn last_request(&self) -> &str {
        &self.last_request
    }
}

/// Connection that reports back to its transport when dropped
pub struct StubConnection<'a> {
    inner: ScriptedConnection,
    owner: &'a mut StubTransport,
}

impl Drop for StubConnection<'_> {
    fn drop(&mut self) {
        self.owner.released += 1;
        self.owner.last_request = self.inner.written();
    }
}

impl ErrorType for StubConnection<'_> {
    type Error = StubError;
}

impl Read for StubConnection<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StubError> {
        self.inner.read(buf).await
    }
}

impl Write for StubConnection<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, StubError> {
        self.inner.write(buf).await
    }

    async fn flush(&mut self) -> Result<(), StubError> {
        self.inner.flush().await
    }
}

impl Transport for StubTransport {
    type Error = StubError;
    type Connection<'a>
        = StubConnection<'a>
    where
        Self: 'a;

    async fn connect(&mut self, _host: &str, _port: u16) -> Result<StubConnection<'_>, StubError> {
        self.connects += 1;
        let inner = match &self.mode {
            StubMode::Respond(response) => ScriptedConnection::new(&[response.as_slice()]),
            StubMode::Refuse(kind) => return Err(StubError(*kind)),
            StubMode::Hang => ScriptedConnection::new(&[]).hanging_reads(),
        };
        Ok(StubConnection { inner, owner: self })
    }
}
