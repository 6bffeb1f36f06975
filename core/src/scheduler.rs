//! Cycle scheduler
//!
//! A two-state machine driven by the host's main loop:
//!
//! ```text
//!    first check, or now - last_fire >= interval
//!   ┌──────┐ ───────────────────────────▶ ┌────────┐
//!   │ Idle │                              │ Firing │
//!   └──────┘ ◀─────────────────────────── └────────┘
//!             cycle done, last_fire = now
//! ```
//!
//! The host calls [`Scheduler::tick`] repeatedly. The first check after
//! construction fires straight away; later ones wait out the interval from
//! the previous fire. Missed deadlines are not queued: a late check fires once and resets the baseline to the time of
//! that check, so there are no catch-up bursts.

use embedded_hal_async::delay::DelayNs;
use hal_abstractions::{Clock, DigitalInputs, EnvironmentSensor, LinkProbe, Transport};
use heapless::Vec;

use crate::config::{ConfigError, DigitalChannel, TelemetryConfig, MAX_DIGITAL_CHANNELS};
use crate::delivery::{DeliveryClient, DeliveryOutcome};
use crate::encoder::encode;
use crate::endpoint::Endpoint;
use crate::reading::{Reading, SampleError};
use crate::source::ReadingSource;

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerState {
    /// Waiting for the next fire time
    Idle,
    /// Running one sample → encode → deliver cycle
    Firing,
}

/// What one cycle did, for the reporting boundary
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Check time that triggered the cycle
    pub fired_at_ms: u64,
    /// One outcome per configured digital channel, in order
    pub digital: Vec<DeliveryOutcome, MAX_DIGITAL_CHANNELS>,
    /// `None` when the environmental reading is not configured
    pub environment: Option<Result<DeliveryOutcome, SampleError>>,
}

/// Fixed-cadence driver of the sampling and delivery pipeline
pub struct Scheduler<'a, K, S, I, C, L, T, D>
where
    I: DigitalInputs,
{
    clock: K,
    source: ReadingSource<S, I, C>,
    client: DeliveryClient<L, T, D>,
    endpoint: Endpoint<'a>,
    interval_ms: u64,
    include_environment: bool,
    digital_channels: &'a [DigitalChannel<I::Pin>],
    last_fire_ms: Option<u64>,
    state: SchedulerState,
}

impl<'a, K, S, I, C, L, T, D> Scheduler<'a, K, S, I, C, L, T, D>
where
    K: Clock,
    S: EnvironmentSensor,
    I: DigitalInputs,
    C: Clock,
    L: LinkProbe,
    T: Transport,
    D: DelayNs,
{
    /// Create a scheduler whose first cycle fires on the first [`tick`](Self::tick)
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] reported by [`TelemetryConfig::validate`].
    pub fn new(
        clock: K,
        source: ReadingSource<S, I, C>,
        client: DeliveryClient<L, T, D>,
        config: &TelemetryConfig<'a, I::Pin>,
    ) -> Result<Self, ConfigError> {
        let endpoint = config.validate()?;
        Ok(Self {
            clock,
            source,
            client,
            endpoint,
            interval_ms: config.interval_ms,
            include_environment: config.include_environment,
            digital_channels: config.digital_channels,
            last_fire_ms: None,
            state: SchedulerState::Idle,
        })
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Time of the last cycle, `None` until the first one has run
    pub fn last_fire_ms(&self) -> Option<u64> {
        self.last_fire_ms
    }

    /// Whether a cycle is due at `now_ms`
    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.last_fire_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        }
    }

    /// Check the clock and run one full cycle if it is due
    ///
    /// Returns `None` while idle. A cycle always runs to completion before
    /// this returns, whatever the delivery outcomes.
    pub async fn tick(&mut self) -> Option<CycleReport> {
        let now_ms = self.clock.now_ms();
        if !self.is_due(now_ms) {
            return None;
        }

        self.state = SchedulerState::Firing;
        let report = self.run_cycle(now_ms).await;
        self.last_fire_ms = Some(now_ms);
        self.state = SchedulerState::Idle;

        Some(report)
    }

    async fn run_cycle(&mut self, now_ms: u64) -> CycleReport {
        debug!("Cycle fired at {} ms", now_ms);
        let mut digital = Vec::new();

        for channel in self.digital_channels {
            let reading = self.source.sample_digital(channel.pin, channel.sensor_id);
            let outcome = self.send(&reading).await;
            // Cannot fail: channel count is validated against the capacity
            let _ = digital.push(outcome);
        }

        let environment = if self.include_environment {
            Some(match self.source.sample_environment().await {
                Ok(reading) => Ok(self.send(&reading).await),
                Err(e) => Err(e),
            })
        } else {
            None
        };

        CycleReport {
            fired_at_ms: now_ms,
            digital,
            environment,
        }
    }

    async fn send(&mut self, reading: &Reading) -> DeliveryOutcome {
        let payload = encode(reading);
        info!("Sending data: {}", payload.as_str());
        self.client.deliver(&self.endpoint, &payload).await
    }

    /// Borrow the delivery client (diagnostics and tests)
    pub fn client(&self) -> &DeliveryClient<L, T, D> {
        &self.client
    }

    /// Borrow the reading source (diagnostics and tests)
    pub fn source(&self) -> &ReadingSource<S, I, C> {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::ResponseBody;
    use crate::testing::{FakeClock, FakeInputs, FakeLink, FakeSensor, NeverDelay, StubTransport};
    use embassy_futures::block_on;

    const LOGGED: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
        Content-Length: 38\r\n\r\n{\"message\":\"Data logged successfully\"}";

    const INVALID_DATA: &[u8] = b"HTTP/1.1 400 BAD REQUEST\r\nContent-Type: application/json\r\n\
        Content-Length: 24\r\n\r\n{\"error\":\"Invalid data\"}";

    type TestScheduler<'a> = Scheduler<
        'a,
        &'a FakeClock,
        FakeSensor,
        FakeInputs,
        &'a FakeClock,
        &'a FakeLink,
        StubTransport,
        NeverDelay,
    >;

    fn scheduler<'a>(
        clock: &'a FakeClock,
        link: &'a FakeLink,
        sensor: FakeSensor,
        inputs: FakeInputs,
        transport: StubTransport,
        config: &TelemetryConfig<'a, u8>,
    ) -> TestScheduler<'a> {
        let source = ReadingSource::new(sensor, inputs, clock);
        let client = DeliveryClient::new(link, transport, NeverDelay, config.response_timeout_ms);
        Scheduler::new(clock, source, client, config).unwrap()
    }

    #[test]
    fn test_first_tick_fires_immediately() {
        let clock = FakeClock::at(1500);
        let link = FakeLink::up();
        let config = TelemetryConfig::default();
        let mut sched = scheduler(
            &clock,
            &link,
            FakeSensor::new(22.5, 48.0),
            FakeInputs::default(),
            StubTransport::responding(LOGGED),
            &config,
        );
        assert_eq!(sched.last_fire_ms(), None);
        assert!(sched.is_due(1500));

        let report = block_on(sched.tick()).unwrap();

        assert_eq!(report.fired_at_ms, 1500);
        assert_eq!(
            report.environment,
            Some(Ok(DeliveryOutcome::Delivered(
                200,
                ResponseBody::try_from(r#"{"message":"Data logged successfully"}"#).unwrap()
            )))
        );
        assert!(report.digital.is_empty());
        assert_eq!(sched.state(), SchedulerState::Idle);
        assert_eq!(sched.last_fire_ms(), Some(1500));
        assert!(block_on(sched.tick()).is_none());
    }

    #[test]
    fn test_idle_until_interval_elapses() {
        let clock = FakeClock::at(0);
        let link = FakeLink::up();
        let config = TelemetryConfig::default();
        let mut sched = scheduler(
            &clock,
            &link,
            FakeSensor::new(22.5, 48.0),
            FakeInputs::default(),
            StubTransport::responding(LOGGED),
            &config,
        );
        block_on(sched.tick()).unwrap();

        clock.set(59_999);
        assert!(block_on(sched.tick()).is_none());
        assert_eq!(sched.state(), SchedulerState::Idle);
        assert_eq!(sched.client().transport().connects(), 1);

        clock.set(60_000);
        let report = block_on(sched.tick()).unwrap();
        assert_eq!(report.fired_at_ms, 60_000);
        assert_eq!(sched.last_fire_ms(), Some(60_000));
        assert_eq!(sched.client().transport().connects(), 2);
    }

    #[test]
    fn test_delivered_payload_matches_reading() {
        let clock = FakeClock::at(1000);
        let link = FakeLink::up();
        let config = TelemetryConfig::default();
        let mut sched = scheduler(
            &clock,
            &link,
            FakeSensor::new(22.5, 48.0),
            FakeInputs::default(),
            StubTransport::responding(LOGGED),
            &config,
        );

        block_on(sched.tick()).unwrap();

        assert!(sched.client().transport().last_request().ends_with(
            r#"{"sensor_id":"0x01","temperature":22.5,"humidity":48.0,"timestamp":"1000"}"#
        ));
    }

    #[test]
    fn test_no_catch_up_after_late_check() {
        let clock = FakeClock::at(0);
        let link = FakeLink::up();
        let config = TelemetryConfig::default();
        let mut sched = scheduler(
            &clock,
            &link,
            FakeSensor::new(20.0, 50.0),
            FakeInputs::default(),
            StubTransport::responding(LOGGED),
            &config,
        );
        block_on(sched.tick()).unwrap();

        // Device busy for three intervals: one cycle, baseline reset
        clock.set(185_000);
        assert!(block_on(sched.tick()).is_some());
        assert_eq!(sched.last_fire_ms(), Some(185_000));
        assert!(block_on(sched.tick()).is_none());

        clock.set(244_999);
        assert!(block_on(sched.tick()).is_none());
        clock.set(245_000);
        assert!(block_on(sched.tick()).is_some());
        assert_eq!(sched.client().transport().connects(), 3);
    }

    #[test]
    fn test_sensor_fault_skips_delivery() {
        let clock = FakeClock::at(0);
        let link = FakeLink::up();
        let config = TelemetryConfig::default();
        let mut sched = scheduler(
            &clock,
            &link,
            FakeSensor::new(f32::NAN, 48.0),
            FakeInputs::default(),
            StubTransport::responding(LOGGED),
            &config,
        );

        let report = block_on(sched.tick()).unwrap();

        assert_eq!(report.environment, Some(Err(SampleError::InvalidReading)));
        assert_eq!(link.probes(), 0);
        assert_eq!(sched.client().transport().connects(), 0);
        assert_eq!(sched.state(), SchedulerState::Idle);
        assert_eq!(sched.last_fire_ms(), Some(0));
    }

    #[test]
    fn test_failures_do_not_change_cadence() {
        let clock = FakeClock::at(0);
        let link = FakeLink::up();
        let config = TelemetryConfig::default();
        let mut sched = scheduler(
            &clock,
            &link,
            FakeSensor::new(20.0, 50.0),
            FakeInputs::default(),
            StubTransport::refusing(),
            &config,
        );

        let report = block_on(sched.tick()).unwrap();
        assert_eq!(report.environment, Some(Ok(DeliveryOutcome::TransportError(-1))));

        clock.set(59_999);
        assert!(block_on(sched.tick()).is_none());
        clock.set(60_000);
        assert!(block_on(sched.tick()).is_some());
        assert_eq!(sched.client().transport().connects(), 2);
    }

    #[test]
    fn test_link_down_cycle() {
        let clock = FakeClock::at(0);
        let link = FakeLink::down();
        let config = TelemetryConfig::default();
        let mut sched = scheduler(
            &clock,
            &link,
            FakeSensor::new(20.0, 50.0),
            FakeInputs::default(),
            StubTransport::responding(LOGGED),
            &config,
        );

        let report = block_on(sched.tick()).unwrap();

        assert_eq!(report.environment, Some(Ok(DeliveryOutcome::LinkDown)));
        assert_eq!(sched.client().transport().connects(), 0);
    }

    #[test]
    fn test_digital_channels_delivered_first() {
        static CHANNELS: [DigitalChannel<u8>; 2] =
            [DigitalChannel::new(5, 3), DigitalChannel::new(2, 4)];

        let clock = FakeClock::at(2000);
        let link = FakeLink::up();
        let mut inputs = FakeInputs::default();
        inputs.levels[5] = true;
        let config = TelemetryConfig {
            interval_ms: 2000,
            include_environment: false,
            digital_channels: &CHANNELS,
            ..TelemetryConfig::default()
        };
        let mut sched = scheduler(
            &clock,
            &link,
            FakeSensor::new(20.0, 50.0),
            inputs,
            // The collector requires temperature and humidity on every record
            StubTransport::responding(INVALID_DATA),
            &config,
        );

        let report = block_on(sched.tick()).unwrap();

        assert_eq!(report.environment, None);
        assert_eq!(
            report.digital.as_slice(),
            &[DeliveryOutcome::Rejected(400), DeliveryOutcome::Rejected(400)]
        );
        assert_eq!(sched.source().sensor().reads, 0);
        assert_eq!(sched.client().transport().connects(), 2);
        assert!(sched
            .client()
            .transport()
            .last_request()
            .ends_with(r#"{"sensor_id":4,"state":0,"timestamp":"2000"}"#));
    }

    #[test]
    fn test_freezing_reading_rejected_by_collector() {
        let clock = FakeClock::at(0);
        let link = FakeLink::up();
        let config = TelemetryConfig::default();
        let mut sched = scheduler(
            &clock,
            &link,
            FakeSensor::new(0.0, 50.0),
            FakeInputs::default(),
            StubTransport::responding(INVALID_DATA),
            &config,
        );

        let report = block_on(sched.tick()).unwrap();

        assert_eq!(report.environment, Some(Ok(DeliveryOutcome::Rejected(400))));
        assert!(sched
            .client()
            .transport()
            .last_request()
            .ends_with(r#"{"sensor_id":"0x01","temperature":0.0,"humidity":50.0,"timestamp":"0"}"#));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let clock = FakeClock::at(0);
        let link = FakeLink::up();
        let config = TelemetryConfig::<u8> {
            endpoint: "https://collector/",
            ..TelemetryConfig::default()
        };
        let source = ReadingSource::new(FakeSensor::new(0.0, 0.0), FakeInputs::default(), &clock);
        let client = DeliveryClient::new(&link, StubTransport::refusing(), NeverDelay, 1000);

        assert!(matches!(
            Scheduler::new(&clock, source, client, &config),
            Err(ConfigError::Endpoint(_))
        ));
    }
}
