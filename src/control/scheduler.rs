//! Self-timing PID loop driver
//!
//! Elapsed time between two `iterate()` calls is rebuilt from a free-running
//! counter plus its overflow count, so callers can run the loop from a busy
//! loop or at an irregular rate and still get a correct `dt`.

use super::pid::PidController;
use crate::hal::FreeRunningTimer;

pub struct ControlLoopScheduler<'c, 'a, T> {
    controllers: &'c mut [PidController<'a>],
    timer: T,
    cpu_hz: u32,
}

impl<'c, 'a, T: FreeRunningTimer> ControlLoopScheduler<'c, 'a, T> {
    /// Take the controller list and start the timer.
    ///
    /// The overflow interrupt must be enabled globally for `dt` to cover more
    /// than one timer period.
    pub fn new(controllers: &'c mut [PidController<'a>], mut timer: T, cpu_hz: u32) -> Self {
        timer.start();
        Self {
            controllers,
            timer,
            cpu_hz,
        }
    }

    /// Step every controller over the time elapsed since the previous call.
    ///
    /// Returns the elapsed ticks. When no tick has passed the controllers are
    /// left untouched.
    pub fn iterate(&mut self) -> u32 {
        let (count, overflows) = self.timer.read_and_reset();
        let ticks = (overflows as u32)
            .saturating_mul(T::PERIOD)
            .saturating_add(count as u32);

        if ticks > 0 {
            let dt = ticks as f64 / self.cpu_hz as f64;
            self.step_all(dt);
        }
        ticks
    }

    /// Step every controller with a caller-supplied `dt`, for loops paced by
    /// a fixed-rate interrupt. Non-positive or non-finite `dt` is ignored.
    pub fn iterate_fixed(&mut self, dt: f64) {
        self.step_all(dt);
    }

    fn step_all(&mut self, dt: f64) {
        for pid in self.controllers.iter_mut() {
            pid.step(dt);
        }
    }

    pub fn controllers(&mut self) -> &mut [PidController<'a>] {
        &mut *self.controllers
    }

    #[inline]
    pub fn cpu_hz(&self) -> u32 {
        self.cpu_hz
    }

    pub fn stop(&mut self) {
        self.timer.stop();
    }

    /// Stop the timer and hand it back
    pub fn release(mut self) -> T {
        self.timer.stop();
        self.timer
    }
}
