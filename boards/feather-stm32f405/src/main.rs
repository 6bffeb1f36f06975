#![deny(unsafe_code)]
#![deny(warnings)]
#![no_main]
#![no_std]

use defmt_rtt as _; // global logger
use panic_probe as _;
use rtic::app;
use rtic_monotonics::stm32::prelude::*;

mod clock;
mod eth;
mod network;
mod sensors;

stm32_tim2_monotonic!(Mono, 1_000_000);

/// Sample and report the relay lines each cycle
const SAMPLE_RELAYS: bool = false;

/// Lease an address over DHCP instead of the static default
const USE_DHCP: bool = false;

#[app(device = embassy_stm32, peripherals = true, dispatchers = [USART1, USART2, USART3])]
mod app {
    use super::*;
    use defmt::{debug, error, info};
    use embassy_futures::join::join3;
    use embassy_stm32::exti::ExtiInput;
    use embassy_stm32::gpio::{Flex, Input, Level, Output, Pull, Speed};
    use embassy_stm32::peripherals;
    use embassy_stm32::rcc::{Hse, HseMode};
    use embassy_stm32::spi::{self, Spi};
    use embassy_stm32::time::Hertz;
    use telemetry_core::{
        DeliveryClient, DigitalChannel, ReadingSource, Scheduler, TelemetryConfig,
    };

    use clock::UptimeClock;
    use network::{manager, Addressing, EthLink, NetworkConfig, TcpTransport, SOCKET_BUFFER_SIZE};
    use sensors::{Dht22, Dht22Config, RelayInputs, RelayLine, RELAY_CHANNELS};

    type SpiPeripheral = embassy_stm32::Peri<'static, peripherals::SPI2>;
    type PinPB13 = embassy_stm32::Peri<'static, peripherals::PB13>;
    type PinPB15 = embassy_stm32::Peri<'static, peripherals::PB15>;
    type PinPB14 = embassy_stm32::Peri<'static, peripherals::PB14>;
    type PinPC6 = embassy_stm32::Peri<'static, peripherals::PC6>;
    type PinPC3 = embassy_stm32::Peri<'static, peripherals::PC3>;
    type PinPC2 = embassy_stm32::Peri<'static, peripherals::PC2>;
    type ExtiChannel = embassy_stm32::Peri<'static, peripherals::EXTI2>;
    type DmaTx = embassy_stm32::Peri<'static, peripherals::DMA1_CH4>;
    type DmaRx = embassy_stm32::Peri<'static, peripherals::DMA1_CH3>;

    struct NetworkPeripherals {
        spi: SpiPeripheral,
        sck: PinPB13,
        mosi: PinPB15,
        miso: PinPB14,
        cs: PinPC6,
        reset: PinPC3,
        int: PinPC2,
        exti: ExtiChannel,
        dma_tx: DmaTx,
        dma_rx: DmaRx,
    }

    /// DHT22 data line and the five relay-state lines
    struct SensorPeripherals {
        dht: embassy_stm32::Peri<'static, peripherals::PC7>,
        relay1: embassy_stm32::Peri<'static, peripherals::PB8>,
        relay2: embassy_stm32::Peri<'static, peripherals::PB9>,
        relay3: embassy_stm32::Peri<'static, peripherals::PA15>,
        relay4: embassy_stm32::Peri<'static, peripherals::PB3>,
        relay5: embassy_stm32::Peri<'static, peripherals::PB4>,
    }

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        led: Output<'static>,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local) {
        info!("Telemetry agent starting...");

        // DHT22 pulse capture is timed with the cycle counter
        let mut core = cx.core;
        core.DCB.enable_trace();
        core.DWT.enable_cycle_counter();

        // Adafruit Feather STM32F405: 12 MHz HSE
        let mut config = embassy_stm32::Config::default();
        config.rcc.hse = Some(Hse {
            freq: Hertz(12_000_000),
            mode: HseMode::Oscillator,
        });

        // HSE (12 MHz) / PREDIV(6) = 2 MHz (PLL input)
        // 2 MHz * MUL(168) = 336 MHz (VCO)
        // VCO / DIVP(4) = 84 MHz (SYSCLK)
        // VCO / DIVQ(7) = 48 MHz (USB clock)
        config.rcc.pll_src = embassy_stm32::rcc::PllSource::HSE;
        config.rcc.pll = Some(embassy_stm32::rcc::Pll {
            prediv: embassy_stm32::rcc::PllPreDiv::DIV6,
            mul: embassy_stm32::rcc::PllMul::MUL168,
            divp: Some(embassy_stm32::rcc::PllPDiv::DIV4),
            divq: Some(embassy_stm32::rcc::PllQDiv::DIV7),
            divr: None,
        });
        config.rcc.sys = embassy_stm32::rcc::Sysclk::PLL1_P;
        config.rcc.ahb_pre = embassy_stm32::rcc::AHBPrescaler::DIV1; // 84 MHz
        config.rcc.apb1_pre = embassy_stm32::rcc::APBPrescaler::DIV2; // 42 MHz
        config.rcc.apb2_pre = embassy_stm32::rcc::APBPrescaler::DIV1; // 84 MHz

        let p = embassy_stm32::init(config);

        info!("System initialized: SYSCLK=84MHz from HSE (12MHz)");

        // TIM2 on APB1: timer clock = 2*APB1 when prescaler != 1
        let timer_clock_hz = 84_000_000;
        Mono::start(timer_clock_hz);
        info!("TIM2 monotonic timer initialized at 1 MHz");

        let led = Output::new(p.PC1, Level::High, Speed::Low);

        let net_periph = NetworkPeripherals {
            spi: p.SPI2,
            sck: p.PB13,
            mosi: p.PB15,
            miso: p.PB14,
            cs: p.PC6,
            reset: p.PC3,
            int: p.PC2,
            exti: p.EXTI2,
            dma_tx: p.DMA1_CH4,
            dma_rx: p.DMA1_CH3,
        };

        let sensor_periph = SensorPeripherals {
            dht: p.PC7,
            relay1: p.PB8,
            relay2: p.PB9,
            relay3: p.PA15,
            relay4: p.PB3,
            relay5: p.PB4,
        };

        heartbeat::spawn().ok();
        network_task::spawn(net_periph, sensor_periph).ok();

        (Shared {}, Local { led })
    }

    /// Heartbeat task
    #[task(priority = 1, local = [led])]
    async fn heartbeat(cx: heartbeat::Context) {
        info!("Heartbeat task started");
        loop {
            cx.local.led.set_high();
            Mono::delay(100.millis()).await;
            cx.local.led.set_low();
            Mono::delay(4900.millis()).await;
        }
    }

    /// Network task - runs the network stack and the telemetry scheduler
    ///
    /// Stack is !Send and must remain within this task.
    #[task(priority = 1)]
    async fn network_task(
        _cx: network_task::Context,
        periph: NetworkPeripherals,
        sensor_periph: SensorPeripherals,
    ) {
        use embassy_net::StackResources;
        use static_cell::StaticCell;

        info!("Network task started");

        let mut net_config = NetworkConfig::default();
        if USE_DHCP {
            net_config.addressing = Addressing::Dhcp;
        }

        // Setup ethernet peripherals
        let mut spi_config = spi::Config::default();
        spi_config.frequency = Hertz(10_000_000); // 10 MHz for W5500

        let spi = Spi::new(
            periph.spi,
            periph.sck,
            periph.mosi,
            periph.miso,
            periph.dma_tx,
            periph.dma_rx,
            spi_config,
        );

        let cs = Output::new(periph.cs, Level::High, Speed::VeryHigh);
        let reset = Output::new(periph.reset, Level::High, Speed::Low);
        let int = ExtiInput::new(periph.int, periph.exti, Pull::Up);

        let eth_periph = eth::EthPeripherals {
            spi,
            cs,
            reset,
            int,
        };

        info!("Connecting to ethernet...");
        let (device, w5500_runner) = match eth::init_w5500(eth_periph, net_config.mac_addr).await {
            Ok(parts) => parts,
            Err(e) => {
                error!("W5500 initialization failed: {}", e);
                return;
            }
        };

        static RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
        let (stack, mut net_runner) = embassy_net::new(
            device,
            net_config.stack_config(),
            RESOURCES.init(StackResources::new()),
            net_config.seed,
        );
        info!("Network stack initialized");

        let app_logic = async {
            manager::wait_for_link(&stack).await;
            manager::wait_for_config(&stack).await;
            run_telemetry(stack, net_config.socket_timeout_ms, sensor_periph).await;
        };

        join3(w5500_runner.run(), net_runner.run(), app_logic).await;
    }

    async fn run_telemetry(
        stack: embassy_net::Stack<'static>,
        socket_timeout_ms: u64,
        periph: SensorPeripherals,
    ) {
        use static_cell::StaticCell;

        static RX_BUFFER: StaticCell<[u8; SOCKET_BUFFER_SIZE]> = StaticCell::new();
        static TX_BUFFER: StaticCell<[u8; SOCKET_BUFFER_SIZE]> = StaticCell::new();
        let transport = TcpTransport::new(
            stack,
            RX_BUFFER.init([0; SOCKET_BUFFER_SIZE]),
            TX_BUFFER.init([0; SOCKET_BUFFER_SIZE]),
            socket_timeout_ms,
        );

        let dht = Dht22::new(Flex::new(periph.dht), Dht22Config::default());
        let relays = RelayInputs::new([
            Input::new(periph.relay1, Pull::Up),
            Input::new(periph.relay2, Pull::Up),
            Input::new(periph.relay3, Pull::Down),
            Input::new(periph.relay4, Pull::Down),
            Input::new(periph.relay5, Pull::Down),
        ]);

        let channels: &'static [DigitalChannel<RelayLine>] = if SAMPLE_RELAYS {
            &RELAY_CHANNELS
        } else {
            &[]
        };
        let config = TelemetryConfig {
            digital_channels: channels,
            ..TelemetryConfig::default()
        };

        let source = ReadingSource::new(dht, relays, UptimeClock);
        let client = DeliveryClient::new(
            EthLink::new(stack),
            transport,
            embassy_time::Delay,
            config.response_timeout_ms,
        );
        let mut scheduler = match Scheduler::new(UptimeClock, source, client, &config) {
            Ok(scheduler) => scheduler,
            Err(e) => {
                error!("Invalid telemetry configuration: {}", e);
                return;
            }
        };

        info!(
            "Telemetry scheduler started: {} every {} ms",
            config.endpoint, config.interval_ms
        );

        loop {
            if let Some(report) = scheduler.tick().await {
                let delivered = report.digital.iter().filter(|o| o.is_delivered()).count()
                    + usize::from(matches!(&report.environment, Some(Ok(o)) if o.is_delivered()));
                debug!(
                    "Cycle at {} ms: {} readings delivered",
                    report.fired_at_ms, delivered
                );
            }
            Mono::delay(100.millis()).await;
        }
    }

    /// RTIC idle task - WFI sleep mode when no tasks active
    #[idle]
    fn idle(_cx: idle::Context) -> ! {
        info!("Idle task started - entering WFI loop");
        loop {
            cortex_m::asm::wfi();
        }
    }
}
