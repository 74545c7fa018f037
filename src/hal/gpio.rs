use avr_device::atmega328p::{PORTB, PORTC, PORTD};
use core::convert::Infallible;
use embedded_hal::digital::v2::OutputPin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    B,
    C,
    D,
}

macro_rules! impl_port {
    ($($variant:ident => $PORT:ident, $port:ident, $ddr:ident;)+) => {
        impl Port {
            fn modify_port(self, f: impl FnOnce(u8) -> u8) {
                match self {
                    $(Port::$variant => unsafe {
                        (*$PORT::ptr()).$port.modify(|r, w| w.bits(f(r.bits())))
                    },)+
                }
            }

            fn modify_ddr(self, f: impl FnOnce(u8) -> u8) {
                match self {
                    $(Port::$variant => unsafe {
                        (*$PORT::ptr()).$ddr.modify(|r, w| w.bits(f(r.bits())))
                    },)+
                }
            }
        }
    };
}

impl_port! {
    B => PORTB, portb, ddrb;
    C => PORTC, portc, ddrc;
    D => PORTD, portd, ddrd;
}

/// Output pin picked at runtime (port + bit), so pins on different ports can
/// share one array in the servo scheduler.
#[derive(Debug)]
pub struct PortPin {
    port: Port,
    mask: u8,
}

impl PortPin {
    /// Configure bit `bit` (0..=7) of `port` as an output, driven low
    pub fn output(port: Port, bit: u8) -> Self {
        let mask = 1 << (bit & 0x07);
        critical_section::with(|_| {
            port.modify_port(|v| v & !mask);
            port.modify_ddr(|v| v | mask);
        });
        Self { port, mask }
    }
}

impl OutputPin for PortPin {
    type Error = Infallible;

    // The ISR rewrites the same PORTx registers, so every read-modify-write
    // happens with interrupts masked
    #[inline]
    fn set_high(&mut self) -> Result<(), Infallible> {
        let mask = self.mask;
        critical_section::with(|_| self.port.modify_port(|v| v | mask));
        Ok(())
    }

    #[inline]
    fn set_low(&mut self) -> Result<(), Infallible> {
        let mask = self.mask;
        critical_section::with(|_| self.port.modify_port(|v| v & !mask));
        Ok(())
    }
}

// Arduino Uno header pins used by the firmware binary
pub mod board {
    use super::*;

    pub fn d10() -> PortPin {
        PortPin::output(Port::B, 2)
    }
    pub fn d11() -> PortPin {
        PortPin::output(Port::B, 3)
    }
    pub fn d12() -> PortPin {
        PortPin::output(Port::B, 4)
    }
    pub fn d13() -> PortPin {
        PortPin::output(Port::B, 5)
    }
}
