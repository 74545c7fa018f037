use avr_device::atmega328p::USART0;

use crate::config::CPU_FREQ_HZ;
use crate::ring::SharedRing;

// UCSR0B
const RXCIE0: u8 = 1 << 7;
const UDRIE0: u8 = 1 << 5;
const RXEN0: u8 = 1 << 4;
const TXEN0: u8 = 1 << 3;
// UCSR0C: asynchronous, 8 data bits, no parity, 1 stop bit
const UCSZ_8N1: u8 = 0x06;

/// UBRR0 value for normal-speed asynchronous mode
pub const fn ubrr_for(baud: u32) -> u16 {
    (CPU_FREQ_HZ / (16 * baud) - 1) as u16
}

/// Interrupt-driven USART0.
///
/// Main code queues bytes into a TX [`SharedRing`] and calls [`Usart0::kick`];
/// [`on_data_register_empty`] drains it. Received bytes land in an RX ring via
/// [`on_receive`].
pub struct Usart0 {
    usart: USART0,
}

impl Usart0 {
    pub fn new(usart: USART0, baud: u32) -> Self {
        usart.ubrr0.write(|w| unsafe { w.bits(ubrr_for(baud)) });
        usart.ucsr0c.write(|w| unsafe { w.bits(UCSZ_8N1) });
        usart.ucsr0b.write(|w| unsafe { w.bits(RXEN0 | TXEN0 | RXCIE0) });
        Self { usart }
    }

    /// Enable the data-register-empty interrupt so queued bytes go out
    #[inline]
    pub fn kick(&mut self) {
        self.usart.ucsr0b.modify(|r, w| unsafe { w.bits(r.bits() | UDRIE0) });
    }

    pub fn release(self) -> USART0 {
        self.usart
    }
}

/// Body of `USART_UDRE`
pub fn on_data_register_empty<const N: usize>(tx: &SharedRing<N>) {
    let usart = unsafe { &*USART0::ptr() };
    match tx.pop() {
        Ok(byte) => usart.udr0.write(|w| unsafe { w.bits(byte) }),
        // Buffer empty - disable TX interrupt
        Err(_) => usart.ucsr0b.modify(|r, w| unsafe { w.bits(r.bits() & !UDRIE0) }),
    }
}

/// Body of `USART_RX`. Keeps the newest bytes when main falls behind.
pub fn on_receive<const N: usize>(rx: &SharedRing<N>) {
    let usart = unsafe { &*USART0::ptr() };
    let byte = usart.udr0.read().bits();
    rx.push_overwrite(byte);
}
