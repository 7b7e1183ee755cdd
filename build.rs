use std::env;

fn main() {
    // Pass CPU frequency for timing calculations
    println!("cargo:rustc-env=MCU_FREQ_HZ=16000000");
    println!("cargo:rerun-if-changed=build.rs");

    // Host builds (library + tests) need nothing else
    let target = env::var("TARGET").unwrap_or_default();
    if !target.contains("avr") {
        return;
    }

    // Configure for ATmega128
    println!("cargo:rustc-link-arg=-mmcu=atmega128");

    if env::var("PROFILE").map(|p| p == "debug").unwrap_or(false) {
        println!("cargo:warning=Building firmware for ATmega128 at 16MHz (debug profile)");
    }
}
