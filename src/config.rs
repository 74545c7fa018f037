//! Configuration constants for ATmega328P firmware

use crate::hal::Prescaler;

/// CPU frequency in Hz, taken from `AVR_CPU_FREQUENCY_HZ` at build time
pub const CPU_FREQ_HZ: u32 = parse_u32(env!("MCU_FREQ_HZ"));

/// UART baud rate
pub const UART_BAUD: u32 = 9600;

/// Servo frame period in microseconds
pub const SERVO_FRAME_US: u32 = 20 * 1000;

/// Shortest commandable servo pulse in microseconds
pub const SERVO_MIN_US: u32 = 1000;

/// Longest commandable servo pulse in microseconds
pub const SERVO_MAX_US: u32 = 2 * 1000;

/// Timer1 prescaler used by the servo scheduler.
///
/// At 16MHz / 8 a 20ms frame is 40000 ticks and fits the 16-bit timer.
pub const SERVO_PRESCALER: Prescaler =
    Prescaler::smallest_fitting(CPU_FREQ_HZ, SERVO_FRAME_US, u16::MAX as u32);

pub const SERVO_CONFIG: ServoConfig = ServoConfig {
    cpu_hz: CPU_FREQ_HZ,
    prescaler: SERVO_PRESCALER,
    frame_us: SERVO_FRAME_US,
    min_us: SERVO_MIN_US,
    max_us: SERVO_MAX_US,
};

/// Time an ESC needs at a steady throttle command to register it
pub const ESC_ARM_DELAY_MS: u16 = 4000;

/// Console ring buffer backing lengths (one slot is always kept free)
pub const CONSOLE_TX_LEN: usize = 64;
pub const CONSOLE_RX_LEN: usize = 16;

const US_PER_SECOND: u32 = 1_000_000;

/// Physical servo timing, converted to timer ticks by [`ServoConfig::timing`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoConfig {
    pub cpu_hz: u32,
    pub prescaler: Prescaler,
    pub frame_us: u32,
    pub min_us: u32,
    pub max_us: u32,
}

impl ServoConfig {
    /// Convert microseconds to timer ticks at this clock and prescaler
    pub const fn us_to_ticks(&self, us: u32) -> u32 {
        let tick_hz = (self.cpu_hz / self.prescaler.divisor()) as u64;
        (us as u64 * tick_hz / US_PER_SECOND as u64) as u32
    }

    /// Tick values for the scheduler. Saturates at the 16-bit timer range.
    pub const fn timing(&self) -> ServoTiming {
        ServoTiming {
            frame_ticks: saturate_u16(self.us_to_ticks(self.frame_us)),
            min_ticks: saturate_u16(self.us_to_ticks(self.min_us)),
            max_ticks: saturate_u16(self.us_to_ticks(self.max_us)),
        }
    }
}

/// Frame period and pulse bounds in timer ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoTiming {
    pub frame_ticks: u16,
    pub min_ticks: u16,
    pub max_ticks: u16,
}

impl ServoTiming {
    /// Largest channel count whose pulses all fit in one frame
    pub const fn max_channels(&self) -> usize {
        if self.max_ticks == 0 {
            return 0;
        }
        (self.frame_ticks / self.max_ticks) as usize
    }
}

const fn saturate_u16(v: u32) -> u16 {
    if v > u16::MAX as u32 {
        u16::MAX
    } else {
        v as u16
    }
}

const fn parse_u32(s: &str) -> u32 {
    let bytes = s.as_bytes();
    let mut value: u32 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let digit = bytes[i];
        assert!(digit >= b'0' && digit <= b'9', "MCU_FREQ_HZ is not a number");
        value = value * 10 + (digit - b'0') as u32;
        i += 1;
    }
    value
}
