pub mod timer;

#[cfg(target_arch = "avr")]
pub mod gpio;
#[cfg(target_arch = "avr")]
pub mod tc;
#[cfg(target_arch = "avr")]
pub mod usart;

// Re-export commonly used types
pub use timer::{settle_overflows, CompareTimer, FreeRunningTimer, OverflowCounter, Prescaler};

#[cfg(target_arch = "avr")]
pub use gpio::{board, Port, PortPin};
#[cfg(target_arch = "avr")]
pub use tc::{Tc1Compare, Tc2FreeRunning};
#[cfg(target_arch = "avr")]
pub use usart::Usart0;
