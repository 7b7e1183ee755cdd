#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

use core::cell::{Cell, RefCell};

use panic_halt as _;
use ufmt::uwrite;

use telemetry_node::application::{
    bring_up, FixedReading, LinkMonitor, TelemetrySender, Temperature, TemperatureSource,
};
use telemetry_node::config::{
    MEASURE_PERIOD_MS, RADIO_RX_PERIOD_MS, RADIO_TX_PERIOD_MS, TASK_REPORT_PERIOD_MS,
};
use telemetry_node::diagnostics::{LinkReport, TaskReport};
use telemetry_node::drivers::{Nrf24, SerialConsole};
use telemetry_node::hal::{board, BusyDelay, Spi, SpiPrescaler, SystemTimer, Uart, UartLogger, CONSOLE_RX};
use telemetry_node::os::{Duration, SYSTEM_TICKS};
use telemetry_node::protocol::{Radio, RadioConfig, Session};
use telemetry_node::rtos::Scheduler;

static LOGGER: UartLogger = UartLogger;

fn halt() -> ! {
    loop {
        avr_device::asm::sleep();
    }
}

#[avr_device::entry]
fn main() -> ! {
    let mut console = SerialConsole::new(Uart::new());
    unsafe {
        log::set_logger_racy(&LOGGER).ok();
        log::set_max_level_racy(log::LevelFilter::Info);
    }

    let _timer = SystemTimer::start();

    // Enable interrupts globally
    unsafe { avr_device::interrupt::enable() };

    console.write_line("telemetry node v0.1.0").ok();

    let (ss, sck, mosi, miso, ce, csn) = unsafe {
        (
            board::SS::steal().into_output(),
            board::SCK::steal().into_output(),
            board::MOSI::steal().into_output(),
            board::MISO::steal().into_input(),
            board::RADIO_CE::steal().into_output(),
            board::RADIO_CSN::steal().into_output(),
        )
    };
    let spi = Spi::new((ss, sck, mosi, miso), SpiPrescaler::Div16);

    let Ok(driver) = Nrf24::new(spi, ce, csn, BusyDelay) else {
        halt()
    };
    let Ok(session) = Session::new(RadioConfig::default()) else {
        halt()
    };
    let mut radio = Radio::new(driver, session);

    if let Err(e) = bring_up(&mut radio) {
        log::error!("{}", e);
        console.write_line("radio failed, halting").ok();
        halt();
    }
    radio.driver().dump_config(&mut console).ok();

    let radio = RefCell::new(radio);
    let console = RefCell::new(console);
    let reading = Cell::new(Temperature::default());
    let monitor = RefCell::new(LinkMonitor::new());
    let sender = RefCell::new(TelemetrySender::new());

    let mut console_duty = || {
        let mut console = console.borrow_mut();
        while let Some(byte) = console.writer().read_byte() {
            match byte {
                b'd' => {
                    radio.borrow_mut().driver().dump_config(&mut *console).ok();
                }
                b's' => {
                    let radio = radio.borrow();
                    uwrite!(console, "{}", LinkReport(radio.stats())).ok();
                }
                b't' => {
                    let monitor = monitor.borrow();
                    if let Some(t) = monitor.latest {
                        uwrite!(console, "remote {} ({} packets)\r\n", t, monitor.packets).ok();
                    }
                }
                _ => console.writer().write_byte(byte),
            }
        }
    };
    // no sensor fitted yet
    let mut sensor = FixedReading::PLACEHOLDER;
    let mut measure_duty = || reading.set(sensor.sample());
    let mut rx_duty = || {
        let mut radio = radio.borrow_mut();
        if monitor.borrow_mut().poll(&mut *radio).is_err() {
            log::warn!("rx: bus error");
        }
    };
    let mut tx_duty = || {
        let mut radio = radio.borrow_mut();
        match sender.borrow_mut().send(&mut *radio, reading.get()) {
            Ok(outcome) => log::info!("tx: {}", outcome.as_str()),
            Err(_) => log::warn!("tx: bus error"),
        }
    };

    let mut sched: Scheduler<'_, _> = Scheduler::new(&SYSTEM_TICKS);
    let registered = sched
        .register_signal_task(&mut console_duty, &CONSOLE_RX, true)
        .and(sched.register_time_task(&mut measure_duty, Duration::from_millis(MEASURE_PERIOD_MS), true))
        .and(sched.register_time_task(&mut rx_duty, Duration::from_millis(RADIO_RX_PERIOD_MS), true))
        .and(sched.register_time_task(&mut tx_duty, Duration::from_millis(RADIO_TX_PERIOD_MS), true));
    if let Err(e) = registered {
        log::error!("scheduler: {}", e);
        halt();
    }

    if cfg!(feature = "debug") {
        sched.run_forever_with_accounting(Duration::from_millis(TASK_REPORT_PERIOD_MS), |s| {
            let mut console = console.borrow_mut();
            uwrite!(console, "{}", TaskReport(s)).ok();
        })
    } else {
        sched.run_forever()
    }
}
