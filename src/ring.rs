//! Fixed-capacity byte ring buffer
//!
//! One slot of the backing array is always kept free so that "full" and
//! "empty" can be told apart from the two indices alone: the buffer is empty
//! when `read == write` and full when advancing `write` would land on `read`.
//! A buffer with backing length `N` therefore holds at most `N - 1` bytes.
//!
//! Only the producer moves `write` and only the consumer moves `read`.
//! [`SharedRing`] puts a buffer behind a critical section for the usual
//! interrupt/main split (UART RX filled by the ISR, drained by main, and the
//! other way round for TX).

use core::cell::RefCell;
use critical_section::Mutex;

use crate::error::{Error, Result};

/// Non-blocking byte sink/source used by the buffered serial drivers
pub trait ByteChannel {
    fn push(&mut self, byte: u8) -> Result<()>;
    fn pop(&mut self) -> Result<u8>;
}

pub struct RingBuffer<const N: usize> {
    data: [u8; N],
    write_idx: usize,
    read_idx: usize,
}

impl<const N: usize> RingBuffer<N> {
    const VALID_LEN: () = assert!(N >= 2, "ring buffer needs a backing length of at least 2");

    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::VALID_LEN;
        Self {
            data: [0; N],
            write_idx: 0,
            read_idx: 0,
        }
    }

    #[inline]
    const fn next(idx: usize) -> usize {
        if idx + 1 >= N {
            0
        } else {
            idx + 1
        }
    }

    /// Usable slots (`N - 1`)
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read_idx == self.write_idx
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        Self::next(self.write_idx) == self.read_idx
    }

    /// Bytes that can be pushed before the buffer is full
    pub fn push_available(&self) -> usize {
        if self.write_idx < self.read_idx {
            self.read_idx - self.write_idx - 1
        } else {
            N - (self.write_idx - self.read_idx) - 1
        }
    }

    /// Bytes waiting to be popped
    pub fn pop_available(&self) -> usize {
        if self.read_idx <= self.write_idx {
            self.write_idx - self.read_idx
        } else {
            N - (self.read_idx - self.write_idx)
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pop_available()
    }

    pub fn push(&mut self, byte: u8) -> Result<()> {
        if self.is_full() {
            return Err(Error::Full);
        }
        self.data[self.write_idx] = byte;
        self.write_idx = Self::next(self.write_idx);
        Ok(())
    }

    /// Push even when full, dropping the oldest unread byte.
    ///
    /// Returns `true` if a byte was dropped.
    pub fn push_overwrite(&mut self, byte: u8) -> bool {
        self.data[self.write_idx] = byte;
        self.write_idx = Self::next(self.write_idx);

        if self.write_idx == self.read_idx {
            self.read_idx = Self::next(self.read_idx);
            true
        } else {
            false
        }
    }

    pub fn pop(&mut self) -> Result<u8> {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let byte = self.data[self.read_idx];
        self.read_idx = Self::next(self.read_idx);
        Ok(byte)
    }

    pub fn peek(&self) -> Result<u8> {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        Ok(self.data[self.read_idx])
    }

    /// Drop everything unread
    pub fn clear(&mut self) {
        self.read_idx = self.write_idx;
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteChannel for RingBuffer<N> {
    #[inline]
    fn push(&mut self, byte: u8) -> Result<()> {
        RingBuffer::push(self, byte)
    }

    #[inline]
    fn pop(&mut self) -> Result<u8> {
        RingBuffer::pop(self)
    }
}

impl<const N: usize> embedded_hal::serial::Read<u8> for RingBuffer<N> {
    type Error = Error;

    fn read(&mut self) -> nb::Result<u8, Error> {
        RingBuffer::pop(self).map_err(|_| nb::Error::WouldBlock)
    }
}

impl<const N: usize> embedded_hal::serial::Write<u8> for RingBuffer<N> {
    type Error = Error;

    fn write(&mut self, byte: u8) -> nb::Result<(), Error> {
        RingBuffer::push(self, byte).map_err(|_| nb::Error::WouldBlock)
    }

    fn flush(&mut self) -> nb::Result<(), Error> {
        Ok(())
    }
}

/// Ring buffer shared between an interrupt handler and main code
pub struct SharedRing<const N: usize> {
    inner: Mutex<RefCell<RingBuffer<N>>>,
}

impl<const N: usize> SharedRing<N> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(RingBuffer::new())),
        }
    }

    /// Run `f` on the buffer with interrupts masked
    pub fn with<R>(&self, f: impl FnOnce(&mut RingBuffer<N>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow(cs).borrow_mut()))
    }

    pub fn push(&self, byte: u8) -> Result<()> {
        self.with(|ring| ring.push(byte))
    }

    pub fn push_overwrite(&self, byte: u8) -> bool {
        self.with(|ring| ring.push_overwrite(byte))
    }

    pub fn pop(&self) -> Result<u8> {
        self.with(|ring| ring.pop())
    }

    pub fn peek(&self) -> Result<u8> {
        self.with(|ring| ring.peek())
    }

    /// Usable slots (`N - 1`)
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    pub fn is_empty(&self) -> bool {
        self.with(|ring| ring.is_empty())
    }

    pub fn is_full(&self) -> bool {
        self.with(|ring| ring.is_full())
    }

    pub fn len(&self) -> usize {
        self.with(|ring| ring.len())
    }

    pub fn push_available(&self) -> usize {
        self.with(|ring| ring.push_available())
    }

    pub fn pop_available(&self) -> usize {
        self.with(|ring| ring.pop_available())
    }

    pub fn clear(&self) {
        self.with(|ring| ring.clear())
    }
}

impl<const N: usize> Default for SharedRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteChannel for &SharedRing<N> {
    fn push(&mut self, byte: u8) -> Result<()> {
        SharedRing::push(*self, byte)
    }

    fn pop(&mut self) -> Result<u8> {
        SharedRing::pop(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_backing_length_minus_one() {
        let ring = RingBuffer::<8>::new();
        assert_eq!(ring.capacity(), 7);
        assert!(ring.is_empty());
        assert!(!ring.is_full());
        assert_eq!(ring.push_available(), 7);
        assert_eq!(ring.pop_available(), 0);
    }

    #[test]
    fn available_counts_always_sum_to_capacity() {
        let mut ring = RingBuffer::<5>::new();
        // Mixed pattern that wraps both indices several times
        let ops = [3, -2, 2, -3, 4, -1, -3, 2, 1, -4, 3];
        let mut next = 0u8;
        for op in ops {
            if op > 0 {
                for _ in 0..op {
                    let _ = ring.push(next);
                    next = next.wrapping_add(1);
                    assert_eq!(ring.push_available() + ring.pop_available(), ring.capacity());
                }
            } else {
                for _ in 0..-op {
                    let _ = ring.pop();
                    assert_eq!(ring.push_available() + ring.pop_available(), ring.capacity());
                }
            }
        }
    }

    #[test]
    fn pops_in_push_order() {
        let mut ring = RingBuffer::<16>::new();
        let bytes = b"hello, ring";
        for &b in bytes {
            ring.push(b).unwrap();
        }
        assert_eq!(ring.len(), bytes.len());
        for &b in bytes {
            assert_eq!(ring.pop(), Ok(b));
        }
        assert!(ring.is_empty());
    }

    #[test]
    fn fifo_order_survives_wraparound() {
        let mut ring = RingBuffer::<4>::new();
        for round in 0..10u8 {
            ring.push(round).unwrap();
            ring.push(round + 100).unwrap();
            assert_eq!(ring.pop(), Ok(round));
            assert_eq!(ring.pop(), Ok(round + 100));
        }
    }

    #[test]
    fn full_rejects_push_and_empty_rejects_pop() {
        let mut ring = RingBuffer::<4>::new();
        assert_eq!(ring.pop(), Err(Error::Empty));
        assert_eq!(ring.peek(), Err(Error::Empty));

        for b in 0..3 {
            ring.push(b).unwrap();
        }
        assert!(ring.is_full());
        assert_eq!(ring.push_available(), 0);
        assert_eq!(ring.push(9), Err(Error::Full));
        assert_eq!(ring.pop_available(), 3);
    }

    #[test]
    fn overwrite_drops_exactly_the_oldest_byte() {
        let mut ring = RingBuffer::<4>::new();
        assert!(!ring.push_overwrite(1));
        assert!(!ring.push_overwrite(2));
        assert!(!ring.push_overwrite(3));
        assert!(ring.is_full());

        // 1 was next to be popped, so 1 is the one that goes
        assert_eq!(ring.peek(), Ok(1));
        assert!(ring.push_overwrite(4));
        assert!(ring.is_full());
        assert_eq!(ring.pop(), Ok(2));
        assert_eq!(ring.pop(), Ok(3));
        assert_eq!(ring.pop(), Ok(4));
        assert_eq!(ring.pop(), Err(Error::Empty));
    }

    #[test]
    fn peek_does_not_consume() {
        let mut ring = RingBuffer::<3>::new();
        ring.push(0xAA).unwrap();
        assert_eq!(ring.peek(), Ok(0xAA));
        assert_eq!(ring.peek(), Ok(0xAA));
        assert_eq!(ring.pop(), Ok(0xAA));
    }

    #[test]
    fn smallest_buffer_holds_one_byte() {
        let mut ring = RingBuffer::<2>::new();
        assert_eq!(ring.capacity(), 1);
        ring.push(7).unwrap();
        assert!(ring.is_full());
        assert_eq!(ring.push(8), Err(Error::Full));
        assert!(ring.push_overwrite(8));
        assert_eq!(ring.pop(), Ok(8));
    }

    #[test]
    fn clear_discards_unread() {
        let mut ring = RingBuffer::<8>::new();
        ring.push(1).unwrap();
        ring.push(2).unwrap();
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.push_available(), 7);
    }

    #[test]
    fn serial_traits_report_would_block() {
        use embedded_hal::serial::{Read, Write};

        let mut ring = RingBuffer::<2>::new();
        assert!(matches!(Read::read(&mut ring), Err(nb::Error::WouldBlock)));
        Write::write(&mut ring, 0x42).unwrap();
        assert!(matches!(Write::write(&mut ring, 0x43), Err(nb::Error::WouldBlock)));
        assert_eq!(Read::read(&mut ring).unwrap(), 0x42);
    }

    #[test]
    fn shared_ring_through_byte_channel() {
        static RING: SharedRing<4> = SharedRing::new();

        let mut producer = &RING;
        let mut consumer = &RING;
        ByteChannel::push(&mut producer, b'a').unwrap();
        ByteChannel::push(&mut producer, b'b').unwrap();
        assert_eq!(RING.pop_available(), 2);
        assert_eq!(ByteChannel::pop(&mut consumer), Ok(b'a'));
        assert_eq!(RING.peek(), Ok(b'b'));
        RING.clear();
        assert!(RING.is_empty());
        assert_eq!(ByteChannel::pop(&mut consumer), Err(Error::Empty));
    }

    #[test]
    fn shared_ring_reports_capacity_and_fill() {
        static RING: SharedRing<3> = SharedRing::new();

        assert_eq!(RING.capacity(), 2);
        assert_eq!(RING.len(), 0);
        assert!(!RING.is_full());

        RING.push(1).unwrap();
        RING.push(2).unwrap();
        assert!(RING.is_full());
        assert_eq!(RING.len(), 2);
        assert_eq!(RING.push(3), Err(Error::Full));
        assert_eq!(RING.push_available() + RING.pop_available(), RING.capacity());
    }
}
