use core::convert::Infallible;
use ufmt::uWrite;

use crate::ring::ByteChannel;

/// Line-oriented console over a byte channel (normally the UART TX ring).
///
/// Never blocks: bytes that do not fit are dropped and counted.
pub struct SerialConsole<C> {
    channel: C,
    dropped: u16,
}

impl<C: ByteChannel> SerialConsole<C> {
    pub fn new(channel: C) -> Self {
        Self { channel, dropped: 0 }
    }

    pub fn write_byte(&mut self, byte: u8) {
        if self.channel.push(byte).is_err() {
            self.dropped = self.dropped.saturating_add(1);
        }
    }

    pub fn write_str(&mut self, s: &str) {
        for byte in s.bytes() {
            self.write_byte(byte);
        }
    }

    pub fn write_line(&mut self, s: &str) {
        self.write_str(s);
        self.write_str("\r\n");
    }

    pub fn read_byte(&mut self) -> Option<u8> {
        self.channel.pop().ok()
    }

    // Debug helper - print hex value
    pub fn write_hex(&mut self, val: u16) {
        const HEX_CHARS: [u8; 16] = *b"0123456789ABCDEF";
        for shift in [12, 8, 4, 0] {
            self.write_byte(HEX_CHARS[((val >> shift) & 0xF) as usize]);
        }
    }

    pub fn info(&mut self, msg: &str) {
        self.write_str("[INF] ");
        self.write_line(msg);
    }

    pub fn warn(&mut self, msg: &str) {
        self.write_str("[WRN] ");
        self.write_line(msg);
    }

    // Print formatted debug info, only with the `debug` feature
    pub fn debug(&mut self, msg: &str, val: u16) {
        if cfg!(feature = "debug") {
            self.write_str("[DBG] ");
            self.write_str(msg);
            self.write_str(": 0x");
            self.write_hex(val);
            self.write_str("\r\n");
        }
    }

    /// Bytes lost to a full channel since the last call
    pub fn take_dropped(&mut self) -> u16 {
        core::mem::replace(&mut self.dropped, 0)
    }

    pub fn release(self) -> C {
        self.channel
    }
}

impl<C: ByteChannel> uWrite for SerialConsole<C> {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        SerialConsole::write_str(self, s);
        Ok(())
    }
}
