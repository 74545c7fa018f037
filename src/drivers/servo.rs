//! Software-multiplexed servo pulses on one compare timer.
//!
//! The frame (typically 20ms) is cut into `N` equal slots. Each slot starts
//! with its channel's pin driven high for the commanded pulse width and spends
//! the rest of the slot low, then the next channel takes over:
//!
//! ```text
//!       |<- slot 0 ->|<- slot 1 ->|<- slot 2 ->|<- slot 0
//!  ch0  ‾‾‾‾_______________________________________‾‾‾‾____
//!  ch1  _____________‾‾‾‾‾‾_________________________________
//!  ch2  __________________________‾‾________________________
//! ```
//!
//! One timer interrupt per edge, at most one pin high at any time, and the
//! frame length does not depend on the commanded widths.
//!
//! Setpoints live in a [`DutyTable`] that main code writes through `&self`
//! (usually from a `static`), while the interrupt owns the
//! [`PulseScheduler`] with the pins and the timer.

use core::cell::RefCell;
use critical_section::Mutex;
use embedded_hal::digital::v2::OutputPin;

use crate::config::ServoTiming;
use crate::error::{Error, Result};
use crate::hal::CompareTimer;

/// Per-channel pulse widths in timer ticks
pub struct DutyTable<const N: usize> {
    timing: ServoTiming,
    ticks: Mutex<RefCell<[u16; N]>>,
}

impl<const N: usize> DutyTable<N> {
    /// All channels start at the minimum pulse width
    pub const fn new(timing: ServoTiming) -> Self {
        Self {
            timing,
            ticks: Mutex::new(RefCell::new([timing.min_ticks; N])),
        }
    }

    #[inline]
    pub fn timing(&self) -> ServoTiming {
        self.timing
    }

    #[inline]
    pub const fn channels(&self) -> usize {
        N
    }

    /// Map `percent` (0.0..=1.0) onto the pulse range. Out-of-range values
    /// are clamped, NaN counts as 0.
    pub fn percent_to_ticks(&self, percent: f32) -> u16 {
        let percent = if percent > 1.0 {
            1.0
        } else if percent > 0.0 {
            percent
        } else {
            0.0
        };
        let span = self.timing.max_ticks.saturating_sub(self.timing.min_ticks);
        self.timing.min_ticks + (percent * span as f32) as u16
    }

    /// Map a full-scale byte (0x00..=0xFF) onto the pulse range
    pub fn raw_to_ticks(&self, value: u8) -> u16 {
        let span = self.timing.max_ticks.saturating_sub(self.timing.min_ticks) as u32;
        self.timing.min_ticks + (value as u32 * span / 0xFF) as u16
    }

    pub fn set_channel(&self, index: usize, percent: f32) -> Result<()> {
        self.store(index, self.percent_to_ticks(percent))
    }

    pub fn set_channel_raw(&self, index: usize, value: u8) -> Result<()> {
        self.store(index, self.raw_to_ticks(value))
    }

    pub fn set_all_channels(&self, percent: f32) {
        let ticks = self.percent_to_ticks(percent);
        for index in 0..N {
            // index < N always holds here
            let _ = self.store(index, ticks);
        }
    }

    pub fn set_all_channels_raw(&self, value: u8) {
        let ticks = self.raw_to_ticks(value);
        for index in 0..N {
            let _ = self.store(index, ticks);
        }
    }

    pub fn set_channels(&self, percents: &[f32; N]) {
        for (index, &percent) in percents.iter().enumerate() {
            let _ = self.set_channel(index, percent);
        }
    }

    pub fn set_channels_raw(&self, values: &[u8; N]) {
        for (index, &value) in values.iter().enumerate() {
            let _ = self.set_channel_raw(index, value);
        }
    }

    pub fn duty_ticks(&self, index: usize) -> Result<u16> {
        if index >= N {
            return Err(Error::IndexOutOfRange);
        }
        Ok(self.load(index))
    }

    // Ticks are 16 bits wide, so both sides go through the critical section
    fn store(&self, index: usize, ticks: u16) -> Result<()> {
        if index >= N {
            return Err(Error::IndexOutOfRange);
        }
        critical_section::with(|cs| self.ticks.borrow(cs).borrow_mut()[index] = ticks);
        Ok(())
    }

    #[inline]
    fn load(&self, index: usize) -> u16 {
        critical_section::with(|cs| self.ticks.borrow(cs).borrow()[index])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Current channel's pin is high, pulse in flight
    High,
    /// Pulse finished, waiting out the rest of the slot
    Low,
}

/// Interrupt-side state machine driving `N` pins from one compare timer
pub struct PulseScheduler<'a, P, T, const N: usize> {
    duties: &'a DutyTable<N>,
    pins: [P; N],
    timer: T,
    slot_ticks: u16,
    current: usize,
    phase: Phase,
    // Width actually emitted for the current pulse, so the low phase tops
    // the slot up exactly even if the setpoint changes mid-pulse
    active_ticks: u16,
    running: bool,
}

impl<'a, P, T, E, const N: usize> PulseScheduler<'a, P, T, N>
where
    P: OutputPin<Error = E>,
    T: CompareTimer,
{
    /// Take over the pins and the timer. Resets every setpoint to the minimum
    /// pulse; nothing is emitted until [`start`](Self::start).
    pub fn new(duties: &'a DutyTable<N>, pins: [P; N], timer: T) -> Result<Self> {
        let timing = duties.timing();
        if N == 0 {
            return Err(Error::NoChannels);
        }
        if N > timing.max_channels() {
            return Err(Error::TooManyChannels);
        }

        duties.set_all_channels_raw(0);

        Ok(Self {
            duties,
            pins,
            timer,
            slot_ticks: timing.frame_ticks / N as u16,
            current: 0,
            phase: Phase::Low,
            active_ticks: 0,
            running: false,
        })
    }

    /// Drive every pin low, raise channel 0 and arm the timer for its pulse
    pub fn start(&mut self) -> core::result::Result<(), E> {
        for pin in self.pins.iter_mut() {
            pin.set_low()?;
        }

        self.current = 0;
        self.active_ticks = self.duties.load(0).max(1);
        self.pins[0].set_high()?;
        self.phase = Phase::High;
        self.running = true;
        self.timer.start(self.active_ticks);
        Ok(())
    }

    /// Compare-match handler: advance one edge
    pub fn on_compare(&mut self) -> core::result::Result<(), E> {
        if !self.running {
            return Ok(());
        }

        match self.phase {
            Phase::High => {
                self.pins[self.current].set_low()?;
                let rest = self.slot_ticks.saturating_sub(self.active_ticks);
                if rest == 0 {
                    // Pulse filled its whole slot: the next channel starts on this edge
                    self.raise_next()?;
                } else {
                    self.timer.arm(rest);
                    self.phase = Phase::Low;
                }
            }
            Phase::Low => self.raise_next()?,
        }
        Ok(())
    }

    fn raise_next(&mut self) -> core::result::Result<(), E> {
        self.current = if self.current + 1 >= N { 0 } else { self.current + 1 };
        self.active_ticks = self.duties.load(self.current).max(1);
        self.pins[self.current].set_high()?;
        self.timer.arm(self.active_ticks);
        self.phase = Phase::High;
        Ok(())
    }

    /// Stop the timer and leave every pin low
    pub fn stop(&mut self) -> core::result::Result<(), E> {
        self.timer.stop();
        self.running = false;
        self.phase = Phase::Low;
        for pin in self.pins.iter_mut() {
            pin.set_low()?;
        }
        Ok(())
    }

    /// Level this scheduler is driving on channel `index`
    pub fn is_high(&self, index: usize) -> bool {
        self.running && self.phase == Phase::High && self.current == index
    }

    #[inline]
    pub fn current(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn slot_ticks(&self) -> u16 {
        self.slot_ticks
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn release(self) -> ([P; N], T) {
        (self.pins, self.timer)
    }
}
