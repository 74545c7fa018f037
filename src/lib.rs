//! Interrupt-driven servo/ESC pulse generation, PID control loops and ring
//! buffers for the ATmega328P.
//!
//! Register-level code is only built for `target_arch = "avr"`; the rest runs
//! unchanged on the host so it can be unit tested against simulated timers.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod hal;
pub mod ring;

#[cfg(test)]
mod testing;

pub use control::{ControlLoopScheduler, PidConfig, PidController};
pub use drivers::{DutyTable, Esc, PulseScheduler, SerialConsole};
pub use error::{Error, Result};
pub use ring::{ByteChannel, RingBuffer, SharedRing};
