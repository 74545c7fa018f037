pub mod pid;
pub mod scheduler;

pub use pid::{PidConfig, PidController};
pub use scheduler::ControlLoopScheduler;
