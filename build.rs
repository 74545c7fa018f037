use std::env;

const DEFAULT_FREQ_HZ: &str = "16000000";

fn main() {
    println!("cargo:rerun-if-env-changed=AVR_CPU_FREQUENCY_HZ");
    println!("cargo:rerun-if-changed=build.rs");

    // CPU frequency for timing calculations, parsed in config.rs
    let freq = env::var("AVR_CPU_FREQUENCY_HZ").unwrap_or_else(|_| DEFAULT_FREQ_HZ.into());
    if freq.is_empty() || !freq.bytes().all(|b| b.is_ascii_digit()) {
        panic!("AVR_CPU_FREQUENCY_HZ must be a decimal number of Hz, got {:?}", freq);
    }
    println!("cargo:rustc-env=MCU_FREQ_HZ={}", freq);

    // Only the AVR link needs the MCU argument; host builds run the unit tests
    let target = env::var("TARGET").unwrap_or_default();
    if target.contains("avr") {
        println!("cargo:rustc-link-arg=-mmcu=atmega328p");
    }
}
