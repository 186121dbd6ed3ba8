//! Result values shared by every layer.
//!
//! A raw [`Source`](crate::source::Source) primitive answers with a
//! [`Signal`]; the layers above it answer with an [`Outcome`]. Neither
//! condition is an error: callers branch on the value instead of unwinding
//! through `Err` on the common path.

use crate::error::Result;
use std::io;

/// Raw result of a source primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal<T> {
    /// The primitive made progress.
    Ready(T),
    /// No progress is possible without waiting.
    WouldBlock,
    /// The call was interrupted before making progress and may be retried.
    Interrupted,
    /// The source is exhausted.
    Eof,
}

impl Signal<usize> {
    /// Translate a `std::io` result into a signal.
    ///
    /// `WouldBlock` and `Interrupted` error kinds become signal values, a
    /// zero-byte read of a non-empty buffer becomes [`Signal::Eof`], and every
    /// other error is propagated.
    pub fn from_io_read(result: io::Result<usize>, requested: usize) -> Result<Self> {
        match result {
            Ok(0) if requested > 0 => Ok(Self::Eof),
            Ok(n) => Ok(Self::Ready(n)),
            Err(e) => Self::from_io_error(e),
        }
    }

    /// Translate a `std::io` write result into a signal.
    pub fn from_io_write(result: io::Result<usize>) -> Result<Self> {
        match result {
            Ok(n) => Ok(Self::Ready(n)),
            Err(e) => Self::from_io_error(e),
        }
    }

    fn from_io_error(e: io::Error) -> Result<Self> {
        match e.kind() {
            io::ErrorKind::WouldBlock => Ok(Self::WouldBlock),
            io::ErrorKind::Interrupted => Ok(Self::Interrupted),
            _ => Err(e.into()),
        }
    }
}

/// Result of a buffered or blocking-emulated operation.
///
/// In blocking mode [`Outcome::WouldBlock`] is never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation completed (possibly short).
    Ready(T),
    /// Nonblocking mode only: no progress without waiting.
    WouldBlock,
    /// End of stream with nothing transferred.
    Eof,
}

impl<T> Outcome<T> {
    /// Map the ready value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Ready(v) => Outcome::Ready(f(v)),
            Self::WouldBlock => Outcome::WouldBlock,
            Self::Eof => Outcome::Eof,
        }
    }

    /// The ready value, if any.
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(v) => Some(v),
            _ => None,
        }
    }

    /// Check for [`Outcome::WouldBlock`].
    pub fn is_would_block(&self) -> bool {
        matches!(self, Self::WouldBlock)
    }

    /// Check for [`Outcome::Eof`].
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }
}

/// Whether a call may wait for the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Retry would-block signals by waiting on the source.
    #[default]
    Blocking,
    /// Return [`Outcome::WouldBlock`] instead of waiting.
    NonBlocking,
}

impl Mode {
    /// Build a mode from a `nonblock` flag.
    pub fn from_nonblock(nonblock: bool) -> Self {
        if nonblock {
            Self::NonBlocking
        } else {
            Self::Blocking
        }
    }
}

/// Origin of a seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// From the start of the source.
    Set,
    /// From the current position.
    Cur,
    /// From the end of the source.
    End,
}

impl Whence {
    /// Build a `std::io::SeekFrom` for this origin.
    ///
    /// Fails when `offset` is negative with [`Whence::Set`].
    pub fn to_seek_from(self, offset: i64) -> Result<io::SeekFrom> {
        match self {
            Self::Set => u64::try_from(offset)
                .map(io::SeekFrom::Start)
                .map_err(|_| crate::OxiIoError::invalid_argument("negative absolute seek offset")),
            Self::Cur => Ok(io::SeekFrom::Current(offset)),
            Self::End => Ok(io::SeekFrom::End(offset)),
        }
    }

    /// Split a `std::io::SeekFrom` into an offset and an origin.
    pub fn split_seek_from(pos: io::SeekFrom) -> (i64, Whence) {
        match pos {
            // Offsets past i64::MAX saturate; no real source is that large.
            io::SeekFrom::Start(n) => (i64::try_from(n).unwrap_or(i64::MAX), Whence::Set),
            io::SeekFrom::Current(n) => (n, Whence::Cur),
            io::SeekFrom::End(n) => (n, Whence::End),
        }
    }
}

/// Readiness a blocking call waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    /// Wait until a read can make progress.
    Readable,
    /// Wait until a write can make progress.
    Writable,
}

impl Interest {
    /// Short name used in errors and log fields.
    pub fn name(self) -> &'static str {
        match self {
            Self::Readable => "readable",
            Self::Writable => "writable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_read() {
        assert_eq!(Signal::from_io_read(Ok(0), 4).unwrap(), Signal::Eof);
        assert_eq!(Signal::from_io_read(Ok(0), 0).unwrap(), Signal::Ready(0));
        assert_eq!(Signal::from_io_read(Ok(3), 4).unwrap(), Signal::Ready(3));

        let would_block = Err(io::Error::from(io::ErrorKind::WouldBlock));
        assert_eq!(Signal::from_io_read(would_block, 4).unwrap(), Signal::WouldBlock);

        let interrupted = Err(io::Error::from(io::ErrorKind::Interrupted));
        assert_eq!(Signal::from_io_read(interrupted, 4).unwrap(), Signal::Interrupted);

        let broken = Err(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(Signal::from_io_read(broken, 4).is_err());
    }

    #[test]
    fn test_outcome_map() {
        assert_eq!(Outcome::Ready(2).map(|n| n * 2), Outcome::Ready(4));
        assert!(Outcome::<usize>::WouldBlock.map(|n| n + 1).is_would_block());
        assert!(Outcome::<usize>::Eof.is_eof());
        assert_eq!(Outcome::Ready(7).ready(), Some(7));
    }

    #[test]
    fn test_whence_seek_from() {
        assert_eq!(Whence::Set.to_seek_from(5).unwrap(), io::SeekFrom::Start(5));
        assert_eq!(Whence::Cur.to_seek_from(-2).unwrap(), io::SeekFrom::Current(-2));
        assert!(Whence::Set.to_seek_from(-1).is_err());

        let (offset, whence) = Whence::split_seek_from(io::SeekFrom::End(-3));
        assert_eq!((offset, whence), (-3, Whence::End));
    }

    #[test]
    fn test_mode_default() {
        assert_eq!(Mode::default(), Mode::Blocking);
        assert_eq!(Mode::from_nonblock(true), Mode::NonBlocking);
    }
}
