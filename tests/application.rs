mod common;

use common::{driver, radio, small_budget, Completion};
use telemetry_node::application::{
    bring_up, BringUpError, LinkMonitor, SelfTestFailure, TelemetrySender, Temperature,
};
use telemetry_node::drivers::nrf24::registers::reg;
use telemetry_node::protocol::{Radio, RadioConfig, Session, TxOutcome};

#[test]
fn bring_up_leaves_the_radio_listening() {
    let (driver, chip) = driver();
    let mut radio = Radio::new(driver, Session::new(RadioConfig::default()).unwrap());

    bring_up(&mut radio).unwrap();

    assert!(radio.is_listening());
    assert!(chip.borrow().ce);
}

#[test]
fn bring_up_stops_on_a_dead_chip() {
    let (driver, chip) = driver();
    chip.borrow_mut().stuck_tx_addr = true;
    let mut radio = Radio::new(driver, Session::new(RadioConfig::default()).unwrap());

    let result = bring_up(&mut radio);

    assert_eq!(result, Err(BringUpError::SelfTest(SelfTestFailure)));
    assert!(!radio.is_listening());
    // never configured
    assert_eq!(chip.borrow().reg(reg::RF_CH), 0x02);
}

#[test]
fn sender_encodes_the_reading() {
    let (mut radio, chip) = radio(small_budget(100));
    chip.borrow_mut().completion = Completion::Sent { after_polls: 2 };
    let mut sender = TelemetrySender::new();

    let outcome = sender.send(&mut radio, Temperature(-2)).unwrap();

    assert_eq!(outcome, TxOutcome::Success);
    assert_eq!(sender.last_outcome, Some(TxOutcome::Success));
    assert_eq!(radio.session().tx_payload(), &[0xFE, 0xFF, 0, 0, 0]);
}

#[test]
fn sender_flushes_after_max_retransmit() {
    let (mut radio, chip) = radio(small_budget(100));
    chip.borrow_mut().completion = Completion::MaxRetransmit { after_polls: 1 };
    let mut sender = TelemetrySender::new();

    let outcome = sender.send(&mut radio, Temperature(21)).unwrap();

    assert!(matches!(outcome, TxOutcome::MaxRetransmit { .. }));
    let chip = chip.borrow();
    assert_eq!(chip.tx_flushes, 1);
    assert!(chip.tx_fifo.is_empty());
}

#[test]
fn monitor_keeps_the_latest_reading() {
    let (mut radio, chip) = radio(RadioConfig::default());
    {
        let mut chip = chip.borrow_mut();
        chip.deliver(1, &[0x10, 0x00, 0, 0, 0]);
        chip.deliver(1, &[0x20, 0x00, 0, 0, 0]);
    }
    let mut monitor = LinkMonitor::new();

    assert!(monitor.poll(&mut radio).unwrap());
    assert!(monitor.poll(&mut radio).unwrap());
    assert!(!monitor.poll(&mut radio).unwrap());

    assert_eq!(monitor.latest, Some(Temperature(0x20)));
    assert_eq!(monitor.packets, 2);
    assert_eq!(monitor.last_pipe, Some(1));
}
