//! Timer abstractions used by the pulse and control-loop schedulers.
//!
//! The schedulers never touch timer registers. Interrupt handlers call into
//! them (`PulseScheduler::on_compare`, [`OverflowCounter::record`]) and they
//! drive the hardware back through these traits. The ATmega328P
//! implementations live in `hal::tc`.

use core::cell::Cell;
use critical_section::{CriticalSection, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prescaler {
    Direct,
    Div8,
    Div64,
    Div256,
    Div1024,
}

impl Prescaler {
    const ALL: [Prescaler; 5] = [
        Prescaler::Direct,
        Prescaler::Div8,
        Prescaler::Div64,
        Prescaler::Div256,
        Prescaler::Div1024,
    ];

    pub const fn divisor(&self) -> u32 {
        match self {
            Prescaler::Direct => 1,
            Prescaler::Div8 => 8,
            Prescaler::Div64 => 64,
            Prescaler::Div256 => 256,
            Prescaler::Div1024 => 1024,
        }
    }

    /// Clock-select bits (CSn2:0) shared by Timer0 and Timer1
    pub const fn cs_bits(&self) -> u8 {
        match self {
            Prescaler::Direct => 1,
            Prescaler::Div8 => 2,
            Prescaler::Div64 => 3,
            Prescaler::Div256 => 4,
            Prescaler::Div1024 => 5,
        }
    }

    /// Finest prescaler whose count for `period_us` still fits under `top`.
    ///
    /// Falls back to the coarsest prescaler when nothing fits.
    pub const fn smallest_fitting(cpu_hz: u32, period_us: u32, top: u32) -> Prescaler {
        let cycles = cpu_hz as u64 * period_us as u64 / 1_000_000;
        let mut i = 0;
        while i < Self::ALL.len() {
            let ticks = cycles / Self::ALL[i].divisor() as u64;
            if ticks >= 1 && ticks - 1 <= top as u64 {
                return Self::ALL[i];
            }
            i += 1;
        }
        Prescaler::Div1024
    }
}

/// A timer that raises a compare interrupt a programmable number of ticks
/// after the previous one.
pub trait CompareTimer {
    /// Start counting from zero; the first compare event fires after `ticks`.
    fn start(&mut self, ticks: u16);

    /// Program the distance to the next compare event, counted from the
    /// event currently being serviced.
    fn arm(&mut self, ticks: u16);

    /// Stop counting and mask the compare interrupt.
    fn stop(&mut self);
}

/// A counter running at the CPU clock that raises an interrupt on every
/// overflow.
pub trait FreeRunningTimer {
    /// Ticks between two overflow interrupts
    const PERIOD: u32;

    fn start(&mut self);

    fn stop(&mut self);

    /// Counter value and overflow count, both zeroed in the same critical
    /// section so no tick is lost between reads.
    fn read_and_reset(&mut self) -> (u16, u16);
}

/// Overflow count shared between a timer overflow ISR and main code.
///
/// Saturates at `u16::MAX` instead of wrapping, so a stalled caller sees too
/// little elapsed time rather than a wrapped, arbitrary one.
pub struct OverflowCounter {
    count: Mutex<Cell<u16>>,
}

impl OverflowCounter {
    pub const fn new() -> Self {
        Self {
            count: Mutex::new(Cell::new(0)),
        }
    }

    /// Called from the overflow interrupt
    #[inline]
    pub fn record(&self) {
        critical_section::with(|cs| {
            let count = self.count.borrow(cs);
            count.set(count.get().saturating_add(1));
        });
    }

    #[inline]
    pub fn get(&self) -> u16 {
        critical_section::with(|cs| self.count.borrow(cs).get())
    }

    /// Read and zero the count inside an already held critical section
    #[inline]
    pub fn take(&self, cs: CriticalSection<'_>) -> u16 {
        self.count.borrow(cs).replace(0)
    }
}

/// Overflow count for a reading taken with interrupts masked, where the
/// overflow interrupt may already be pending.
///
/// A pending flag with the counter still in the lower half of its range means
/// the wrap happened before the counter was read, so it belongs to this
/// reading. With the counter in the upper half the wrap came after the read.
pub const fn settle_overflows(count: u16, overflows: u16, pending: bool, period: u32) -> u16 {
    if pending && (count as u32) < period / 2 {
        overflows.saturating_add(1)
    } else {
        overflows
    }
}

impl Default for OverflowCounter {
    fn default() -> Self {
        Self::new()
    }
}
