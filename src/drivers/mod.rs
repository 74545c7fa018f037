pub mod esc;
pub mod serial_console;
pub mod servo;

pub use esc::Esc;
pub use serial_console::SerialConsole;
pub use servo::{DutyTable, Phase, PulseScheduler};
