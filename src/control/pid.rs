//! PID controller over borrowed signal slots

use core::cell::Cell;

/// PID controller configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Integrator clamp, applied as `±i_max`
    pub i_max: f64,
    /// Derivative clamp (before `kd`), applied as `±d_max`
    pub d_max: f64,
    /// Output clamp, applied as `±out_max`
    pub out_max: f64,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 0.0,
            kd: 0.0,
            i_max: 50.0,
            d_max: 100.0,
            out_max: 100.0,
        }
    }
}

/// One control loop.
///
/// Reads `setpoint` and `measurement` and writes `output` on every step. The
/// slots belong to the caller, and several controllers may share one, e.g.
/// an outer loop's output feeding an inner loop's setpoint.
pub struct PidController<'a> {
    setpoint: &'a Cell<f64>,
    measurement: &'a Cell<f64>,
    output: &'a Cell<f64>,
    config: PidConfig,
    sum: f64,
    last: f64,
}

#[inline]
fn clamp(v: f64, limit: f64) -> f64 {
    if v < -limit {
        -limit
    } else if v > limit {
        limit
    } else {
        v
    }
}

impl<'a> PidController<'a> {
    pub fn new(
        setpoint: &'a Cell<f64>,
        measurement: &'a Cell<f64>,
        output: &'a Cell<f64>,
        config: PidConfig,
    ) -> Self {
        Self {
            setpoint,
            measurement,
            output,
            config,
            sum: 0.0,
            last: 0.0,
        }
    }

    /// Run one update over `dt` seconds. A zero, negative or non-finite `dt`
    /// leaves the state and the output slot untouched.
    pub fn step(&mut self, dt: f64) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }

        let error = self.setpoint.get() - self.measurement.get();

        self.sum = clamp(self.sum + error * dt, self.config.i_max);

        let derivative = clamp((error - self.last) / dt, self.config.d_max);
        self.last = error;

        let y = self.config.kp * error + self.config.ki * self.sum + self.config.kd * derivative;
        self.output.set(clamp(y, self.config.out_max));
    }

    /// Clear integrator and derivative history. Never called automatically.
    pub fn reset(&mut self) {
        self.sum = 0.0;
        self.last = 0.0;
    }

    pub fn configure(&mut self, config: PidConfig) {
        self.config = config;
    }

    #[inline]
    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    /// Integrator accumulator
    #[inline]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    #[inline]
    pub fn last_error(&self) -> f64 {
        self.last
    }
}
