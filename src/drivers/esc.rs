//! Brushless ESC control on top of the servo pulse table
//!
//! ESCs read the same 1-2ms pulses as servos, but need to see a steady
//! command for a few seconds after power-up before they accept throttle.

use embedded_hal::blocking::delay::DelayMs;

use crate::config::ESC_ARM_DELAY_MS;
use crate::drivers::servo::DutyTable;
use crate::error::Result;

pub struct Esc<'a, const N: usize> {
    duties: &'a DutyTable<N>,
}

impl<'a, const N: usize> Esc<'a, N> {
    /// Command zero throttle and wait for the ESCs to arm
    pub fn arm<D: DelayMs<u16>>(duties: &'a DutyTable<N>, delay: &mut D) -> Self {
        duties.set_all_channels_raw(0x00);
        delay.delay_ms(ESC_ARM_DELAY_MS);
        Self { duties }
    }

    /// Teach the ESCs the throttle range: full throttle, then zero, each held
    /// long enough to register.
    ///
    /// Props off! The motors may spin up while the range is being learned.
    pub fn arm_with_calibration<D: DelayMs<u16>>(duties: &'a DutyTable<N>, delay: &mut D) -> Self {
        duties.set_all_channels_raw(0xFF);
        delay.delay_ms(ESC_ARM_DELAY_MS);

        duties.set_all_channels_raw(0x00);
        delay.delay_ms(ESC_ARM_DELAY_MS);
        Self { duties }
    }

    pub fn set_motor(&self, index: usize, percent: f32) -> Result<()> {
        self.duties.set_channel(index, percent)
    }

    pub fn set_motor_raw(&self, index: usize, value: u8) -> Result<()> {
        self.duties.set_channel_raw(index, value)
    }

    pub fn set_motors(&self, percents: &[f32; N]) {
        self.duties.set_channels(percents);
    }

    pub fn set_motors_raw(&self, values: &[u8; N]) {
        self.duties.set_channels_raw(values);
    }

    pub fn set_all_motors(&self, percent: f32) {
        self.duties.set_all_channels(percent);
    }

    pub fn set_all_motors_raw(&self, value: u8) {
        self.duties.set_all_channels_raw(value);
    }

    /// Cut throttle on every motor
    pub fn stop_all(&self) {
        self.duties.set_all_channels_raw(0x00);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServoTiming;
    use crate::error::Error;

    const TIMING: ServoTiming = ServoTiming {
        frame_ticks: 40_000,
        min_ticks: 2000,
        max_ticks: 4000,
    };

    /// Records every delay and the throttle on channel 0 when it started
    struct RecordingDelay<'t> {
        duties: &'t DutyTable<2>,
        log: Vec<(u16, u16)>,
    }

    impl DelayMs<u16> for RecordingDelay<'_> {
        fn delay_ms(&mut self, ms: u16) {
            self.log.push((ms, self.duties.duty_ticks(0).unwrap()));
        }
    }

    #[test]
    fn arm_holds_zero_throttle() {
        let table = DutyTable::<2>::new(TIMING);
        table.set_all_channels(0.8);
        let mut delay = RecordingDelay { duties: &table, log: Vec::new() };
        let _esc = Esc::arm(&table, &mut delay);
        assert_eq!(delay.log, vec![(ESC_ARM_DELAY_MS, 2000)]);
    }

    #[test]
    fn calibration_goes_full_then_zero() {
        let table = DutyTable::<2>::new(TIMING);
        let mut delay = RecordingDelay { duties: &table, log: Vec::new() };
        let _esc = Esc::arm_with_calibration(&table, &mut delay);
        assert_eq!(delay.log, vec![(ESC_ARM_DELAY_MS, 4000), (ESC_ARM_DELAY_MS, 2000)]);
        assert_eq!(table.duty_ticks(1), Ok(2000));
    }

    #[test]
    fn motor_setters_forward_to_the_table() {
        let table = DutyTable::<2>::new(TIMING);
        let mut delay = embedded_hal_mock::delay::MockNoop::new();
        let esc = Esc::arm(&table, &mut delay);

        esc.set_motor(1, 0.5).unwrap();
        assert_eq!(table.duty_ticks(1), Ok(3000));
        esc.set_motor_raw(0, 0xFF).unwrap();
        assert_eq!(table.duty_ticks(0), Ok(4000));
        assert_eq!(esc.set_motor(2, 0.1), Err(Error::IndexOutOfRange));

        esc.set_motors(&[0.25, 0.75]);
        assert_eq!(table.duty_ticks(0), Ok(2500));
        assert_eq!(table.duty_ticks(1), Ok(3500));

        esc.set_motors_raw(&[0x00, 0xFF]);
        assert_eq!(table.duty_ticks(1), Ok(4000));

        esc.set_all_motors(1.0);
        esc.stop_all();
        assert_eq!(table.duty_ticks(0), Ok(2000));
        assert_eq!(table.duty_ticks(1), Ok(2000));

        esc.set_all_motors_raw(0xFF);
        assert_eq!(table.duty_ticks(0), Ok(4000));
    }
}
