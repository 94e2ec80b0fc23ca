//! The `errors` module defines the common error types.

use std::error;
use std::fmt;

use super::Result;

/// `Error` enumerates all ways an `encode`/`decode` call can fail.
///
/// All variants are fatal to the operation that produced them; none are
/// recovered internally. A failed call never hands back a partial buffer.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    /// The `StreamDescriptor` passed to `encode` has an out-of-range field
    /// (`channels`, `samplerate`, or `samples`).
    InvalidDescriptor(&'static str),
    /// The byte stream being decoded is structurally wrong: bad magic, a
    /// frame header that disagrees with the stream descriptor, a frame
    /// whose declared size overruns the buffer, or a slice count that
    /// cannot hold the declared sample count.
    Malformed(&'static str),
    /// The buffer is shorter than the bytes a read needs at this point.
    ShortRead { need: usize, have: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidDescriptor(ref msg) => write!(f, "invalid stream descriptor: {}", msg),
            Error::Malformed(ref msg) => write!(f, "malformed qoa stream: {}", msg),
            Error::ShortRead { need, have } => {
                write!(f, "short read: need {} bytes, have {}", need, have)
            }
        }
    }
}

impl error::Error for Error {}

/// function to create an invalid-descriptor error.
pub fn invalid_descriptor<T>(msg: &'static str) -> Result<T> {
    Err(Error::InvalidDescriptor(msg))
}

/// function to create a malformed-stream error.
pub fn malformed<T>(msg: &'static str) -> Result<T> {
    Err(Error::Malformed(msg))
}

/// function to create a short-read error.
pub fn short_read<T>(need: usize, have: usize) -> Result<T> {
    Err(Error::ShortRead { need, have })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_wrap_the_matching_variant() {
        assert_eq!(
            invalid_descriptor::<()>("bad"),
            Err(Error::InvalidDescriptor("bad"))
        );
        assert_eq!(malformed::<()>("bad"), Err(Error::Malformed("bad")));
        assert_eq!(
            short_read::<()>(8, 4),
            Err(Error::ShortRead { need: 8, have: 4 })
        );
    }

    #[test]
    fn display_messages_include_the_reason() {
        assert_eq!(
            Error::InvalidDescriptor("channels out of range [1, 8]").to_string(),
            "invalid stream descriptor: channels out of range [1, 8]"
        );
        assert_eq!(
            Error::Malformed("bad magic").to_string(),
            "malformed qoa stream: bad magic"
        );
        assert_eq!(
            Error::ShortRead { need: 16, have: 8 }.to_string(),
            "short read: need 16 bytes, have 8"
        );
    }
}
