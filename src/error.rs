//! Error type shared by the buffers, schedulers and drivers

use ufmt::{uDisplay, uWrite, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Ring buffer has no free slot
    Full,
    /// Ring buffer has nothing to read
    Empty,
    /// Channel or motor index past the configured count
    IndexOutOfRange,
    /// Pulse scheduler built with zero channels
    NoChannels,
    /// More channels than pulses that fit in one frame
    TooManyChannels,
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Error::Full => "buffer full",
            Error::Empty => "buffer empty",
            Error::IndexOutOfRange => "index out of range",
            Error::NoChannels => "no channels",
            Error::TooManyChannels => "too many channels for frame",
        }
    }
}

impl uDisplay for Error {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> core::result::Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str(self.as_str())
    }
}
