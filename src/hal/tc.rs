//! ATmega328P timer/counter implementations of the timer traits.
//!
//! Timer1 (16-bit, CTC on OCR1A) paces the servo pulses, Timer2 (8-bit,
//! unprescaled) is the free-running clock for the PID loop.

use avr_device::atmega328p::{TC1, TC2};

use super::timer::{settle_overflows, CompareTimer, FreeRunningTimer, OverflowCounter, Prescaler};

// TCCR1B
const WGM12: u8 = 1 << 3;
// TIMSK1
const OCIE1A: u8 = 1 << 1;
// TCCR2B
const CS20: u8 = 1 << 0;
// TIMSK2
const TOIE2: u8 = 1 << 0;
// TIFR2
const TOV2: u8 = 1 << 0;

/// Timer1 in CTC mode, compare match A interrupt
pub struct Tc1Compare {
    tc1: TC1,
    prescaler: Prescaler,
}

impl Tc1Compare {
    pub fn new(tc1: TC1, prescaler: Prescaler) -> Self {
        // Stopped, interrupts masked until start()
        tc1.timsk1.write(|w| unsafe { w.bits(0) });
        tc1.tccr1a.write(|w| unsafe { w.bits(0) });
        tc1.tccr1b.write(|w| unsafe { w.bits(0) });
        Self { tc1, prescaler }
    }

    pub fn release(self) -> TC1 {
        self.tc1
    }
}

impl CompareTimer for Tc1Compare {
    fn start(&mut self, ticks: u16) {
        self.tc1.tcnt1.write(|w| unsafe { w.bits(0) });
        self.arm(ticks);
        self.tc1
            .tccr1b
            .write(|w| unsafe { w.bits(WGM12 | self.prescaler.cs_bits()) });
        self.tc1.timsk1.modify(|r, w| unsafe { w.bits(r.bits() | OCIE1A) });
    }

    #[inline]
    fn arm(&mut self, ticks: u16) {
        // CTC counts 0..=OCR1A, so a period of n ticks needs OCR1A = n - 1
        let top = ticks.saturating_sub(1);
        self.tc1.ocr1a.write(|w| unsafe { w.bits(top) });
    }

    fn stop(&mut self) {
        self.tc1.timsk1.modify(|r, w| unsafe { w.bits(r.bits() & !OCIE1A) });
        self.tc1.tccr1b.write(|w| unsafe { w.bits(0) });
    }
}

/// Timer2 counting at the CPU clock, overflow interrupt feeds `overflows`
pub struct Tc2FreeRunning {
    tc2: TC2,
    overflows: &'static OverflowCounter,
}

impl Tc2FreeRunning {
    pub fn new(tc2: TC2, overflows: &'static OverflowCounter) -> Self {
        tc2.timsk2.write(|w| unsafe { w.bits(0) });
        // Normal mode, counts 0..=0xFF and overflows
        tc2.tccr2a.write(|w| unsafe { w.bits(0) });
        tc2.tccr2b.write(|w| unsafe { w.bits(0) });
        Self { tc2, overflows }
    }

    pub fn release(self) -> TC2 {
        self.tc2
    }
}

impl FreeRunningTimer for Tc2FreeRunning {
    const PERIOD: u32 = 0x100;

    fn start(&mut self) {
        critical_section::with(|cs| {
            self.tc2.tcnt2.write(|w| unsafe { w.bits(0) });
            self.tc2.tifr2.write(|w| unsafe { w.bits(TOV2) });
            self.overflows.take(cs);
        });
        self.tc2.tccr2b.write(|w| unsafe { w.bits(CS20) });
        self.tc2.timsk2.modify(|r, w| unsafe { w.bits(r.bits() | TOIE2) });
    }

    fn stop(&mut self) {
        self.tc2.timsk2.modify(|r, w| unsafe { w.bits(r.bits() & !TOIE2) });
        self.tc2.tccr2b.write(|w| unsafe { w.bits(0) });
    }

    fn read_and_reset(&mut self) -> (u16, u16) {
        critical_section::with(|cs| {
            let count = self.tc2.tcnt2.read().bits() as u16;
            self.tc2.tcnt2.write(|w| unsafe { w.bits(0) });
            // An overflow that hit while interrupts were masked is still only
            // a flag; account for it here and clear it (write 1) so the ISR
            // does not charge it to the next window
            let pending = self.tc2.tifr2.read().bits() & TOV2 != 0;
            self.tc2.tifr2.write(|w| unsafe { w.bits(TOV2) });
            let overflows = settle_overflows(count, self.overflows.take(cs), pending, Self::PERIOD);
            (count, overflows)
        })
    }
}
