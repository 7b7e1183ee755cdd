//! Telemetry node core: cooperative duty scheduler and nRF24L01+ packet
//! radio transport.
//!
//! The library is `no_std` and hardware independent; board support for the
//! ATmega128 lives in [`hal`] behind the `atmega128` feature.

#![cfg_attr(not(test), no_std)]

pub mod application;
pub mod config;
pub mod diagnostics;
pub mod drivers;
pub mod os;
pub mod protocol;
pub mod rtos;

#[cfg(feature = "atmega128")]
pub mod hal;
