//! Simulated pins and timers for host tests.
//!
//! Each double shares its state through an `Rc`, so a test keeps a handle
//! after moving the double into a scheduler and can inspect pin levels or
//! drive the virtual clock from outside.

use core::convert::Infallible;
use embedded_hal::digital::v2::OutputPin;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::hal::{CompareTimer, FreeRunningTimer};

#[derive(Clone, Default)]
pub struct SimPin {
    level: Rc<Cell<bool>>,
}

impl SimPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.level.get()
    }
}

impl OutputPin for SimPin {
    type Error = Infallible;

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.level.set(true);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.level.set(false);
        Ok(())
    }
}

/// `N` pins for the scheduler plus handles to watch them
pub fn pin_bank<const N: usize>() -> ([SimPin; N], [SimPin; N]) {
    let pins: [SimPin; N] = core::array::from_fn(|_| SimPin::new());
    (pins.clone(), pins)
}

#[derive(Default)]
struct CompareState {
    running: bool,
    armed: Option<u16>,
}

#[derive(Clone, Default)]
pub struct SimCompareTimer {
    state: Rc<RefCell<CompareState>>,
}

impl SimCompareTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticks until the next compare event, if one is scheduled
    pub fn armed(&self) -> Option<u16> {
        self.state.borrow().armed
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }
}

impl CompareTimer for SimCompareTimer {
    fn start(&mut self, ticks: u16) {
        let mut state = self.state.borrow_mut();
        state.running = true;
        state.armed = Some(ticks);
    }

    fn arm(&mut self, ticks: u16) {
        self.state.borrow_mut().armed = Some(ticks);
    }

    fn stop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.running = false;
        state.armed = None;
    }
}

#[derive(Default)]
struct FreeRunningState {
    running: bool,
    count: u32,
    overflows: u16,
}

/// 8-bit free-running counter on a virtual clock
#[derive(Clone, Default)]
pub struct SimFreeRunningTimer {
    state: Rc<RefCell<FreeRunningState>>,
}

impl SimFreeRunningTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `ticks` CPU cycles pass, overflowing as the hardware would
    pub fn advance(&self, ticks: u32) {
        let mut state = self.state.borrow_mut();
        if !state.running {
            return;
        }
        let total = state.count + ticks;
        let wraps = total / Self::PERIOD;
        state.count = total % Self::PERIOD;
        let wraps = u16::try_from(wraps).unwrap_or(u16::MAX);
        state.overflows = state.overflows.saturating_add(wraps);
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }
}

impl FreeRunningTimer for SimFreeRunningTimer {
    const PERIOD: u32 = 0x100;

    fn start(&mut self) {
        let mut state = self.state.borrow_mut();
        state.running = true;
        state.count = 0;
        state.overflows = 0;
    }

    fn stop(&mut self) {
        self.state.borrow_mut().running = false;
    }

    fn read_and_reset(&mut self) -> (u16, u16) {
        let mut state = self.state.borrow_mut();
        let reading = (state.count as u16, state.overflows);
        state.count = 0;
        state.overflows = 0;
        reading
    }
}
