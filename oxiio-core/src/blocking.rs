//! Blocking emulation over a raw source.
//!
//! [`BlockingIo`] turns the would-block and interrupted signals of a
//! [`Source`] into deterministic semantics:
//!
//! - **Blocking**: interrupted calls are retried immediately, would-block
//!   signals wait on the source via [`Source::wait`] and retry. The call does
//!   not return until progress is made, the source reports end of stream, or
//!   an unrecoverable condition occurs.
//! - **Nonblocking**: a would-block signal is returned to the caller as
//!   [`Outcome::WouldBlock`] on its first occurrence.
//!
//! Short transfers are never topped up: a read that yields `m > 0` bytes
//! returns exactly `m`.
//!
//! # Example
//!
//! ```
//! use oxiio_core::adapters::MemorySource;
//! use oxiio_core::blocking::BlockingIo;
//! use oxiio_core::signal::{Mode, Outcome};
//!
//! let mut io = BlockingIo::new(MemorySource::reader(b"hello".to_vec()).with_chunk_size(2));
//! let mut buf = [0u8; 8];
//! assert_eq!(io.read(&mut buf, Mode::Blocking).unwrap(), Outcome::Ready(2));
//! assert_eq!(&buf[..2], b"he");
//! ```

use crate::error::{OxiIoError, Result};
use crate::signal::{Interest, Mode, Outcome, Signal, Whence};
use crate::source::Source;
use std::time::{Duration, Instant};
use tracing::trace;

/// Blocking emulation layer owning one source.
#[derive(Debug)]
pub struct BlockingIo<S> {
    source: S,
}

impl<S: Source> BlockingIo<S> {
    /// Wrap a source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Get a reference to the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Get a mutable reference to the underlying source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consume the layer and return the source.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Read into `buf`, waiting indefinitely in blocking mode.
    pub fn read(&mut self, buf: &mut [u8], mode: Mode) -> Result<Outcome<usize>> {
        self.read_timeout(buf, mode, None)
    }

    /// Read into `buf`, waiting at most `timeout` in total in blocking mode.
    ///
    /// Fails with [`OxiIoError::TimedOut`] when the source stays unready.
    pub fn read_timeout(
        &mut self,
        buf: &mut [u8],
        mode: Mode,
        timeout: Option<Duration>,
    ) -> Result<Outcome<usize>> {
        self.source.ensure_open()?;
        if !self.source.is_readable() {
            return Err(OxiIoError::NotReadable);
        }
        if buf.is_empty() {
            return Ok(Outcome::Ready(0));
        }
        let requested = buf.len();
        self.transfer(Interest::Readable, requested, mode, timeout, |source| {
            source.read(&mut *buf)
        })
    }

    /// Write from `buf`, waiting indefinitely in blocking mode.
    pub fn write(&mut self, buf: &[u8], mode: Mode) -> Result<Outcome<usize>> {
        self.write_timeout(buf, mode, None)
    }

    /// Write from `buf`, waiting at most `timeout` in total in blocking mode.
    pub fn write_timeout(
        &mut self,
        buf: &[u8],
        mode: Mode,
        timeout: Option<Duration>,
    ) -> Result<Outcome<usize>> {
        self.source.ensure_open()?;
        if !self.source.is_writable() {
            return Err(OxiIoError::NotWritable);
        }
        if buf.is_empty() {
            return Ok(Outcome::Ready(0));
        }
        self.transfer(Interest::Writable, buf.len(), mode, timeout, |source| {
            source.write(buf)
        })
    }

    /// Reposition the source.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        self.source.seek(offset, whence)
    }

    /// Wait for readiness on the source.
    pub fn wait(&mut self, interest: Interest, timeout: Option<Duration>) -> Result<bool> {
        self.source.wait(interest, timeout)
    }

    /// Close the source.
    pub fn close(&mut self) -> Result<()> {
        self.source.close()
    }

    /// Check whether the source is closed.
    pub fn is_closed(&self) -> bool {
        self.source.is_closed()
    }

    /// Duplicate the layer over a duplicated source.
    pub fn duplicate(&self) -> Result<Self> {
        Ok(Self::new(self.source.duplicate()?))
    }

    fn transfer<F>(
        &mut self,
        interest: Interest,
        requested: usize,
        mode: Mode,
        timeout: Option<Duration>,
        mut op: F,
    ) -> Result<Outcome<usize>>
    where
        F: FnMut(&mut S) -> Result<Signal<usize>>,
    {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut waits = 0usize;

        loop {
            // A source closed out of band while we waited ends the loop here.
            self.source.ensure_open()?;

            match op(&mut self.source)? {
                Signal::Ready(n) if n > requested => {
                    return Err(OxiIoError::unexpected_result(format!(
                        "{} reported {n} bytes for a {requested}-byte request",
                        interest.name()
                    )));
                }
                Signal::Ready(0) if interest == Interest::Writable => {
                    return Err(OxiIoError::unexpected_result(
                        "write accepted zero bytes without signalling would-block",
                    ));
                }
                Signal::Ready(n) => {
                    if waits > 0 {
                        trace!(interest = interest.name(), waits, bytes = n, "transfer resumed");
                    }
                    return Ok(Outcome::Ready(n));
                }
                Signal::Eof => {
                    return match interest {
                        Interest::Readable => Ok(Outcome::Eof),
                        Interest::Writable => Err(OxiIoError::unexpected_result(
                            "write signalled end of stream",
                        )),
                    };
                }
                Signal::Interrupted => {
                    trace!(interest = interest.name(), "interrupted, retrying");
                }
                Signal::WouldBlock => {
                    if mode == Mode::NonBlocking {
                        return Ok(Outcome::WouldBlock);
                    }
                    let remaining = match deadline {
                        Some(deadline) => {
                            let now = Instant::now();
                            if now >= deadline {
                                return Err(OxiIoError::timed_out(interest.name()));
                            }
                            Some(deadline - now)
                        }
                        None => None,
                    };
                    waits += 1;
                    trace!(interest = interest.name(), waits, ?remaining, "would block, waiting");
                    if !self.source.wait(interest, remaining)? {
                        return Err(OxiIoError::timed_out(interest.name()));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemorySource, ScriptedSource, Step};

    #[test]
    fn test_short_read_is_returned_as_is() {
        let mut io = BlockingIo::new(MemorySource::reader(b"abcdef".to_vec()).with_chunk_size(4));
        let mut buf = [0u8; 16];
        assert_eq!(io.read(&mut buf, Mode::Blocking).unwrap(), Outcome::Ready(4));
        assert_eq!(io.read(&mut buf, Mode::Blocking).unwrap(), Outcome::Ready(2));
        assert_eq!(io.read(&mut buf, Mode::Blocking).unwrap(), Outcome::Eof);
    }

    #[test]
    fn test_would_block_waits_then_succeeds() {
        let source = ScriptedSource::reader(vec![
            Step::WouldBlock,
            Step::WouldBlock,
            Step::WouldBlock,
            Step::Data(b"xyz".to_vec()),
        ]);
        let mut io = BlockingIo::new(source);
        let mut buf = [0u8; 8];
        assert_eq!(io.read(&mut buf, Mode::Blocking).unwrap(), Outcome::Ready(3));
        assert_eq!(io.get_ref().waits(), 3);
    }

    #[test]
    fn test_nonblocking_returns_would_block_immediately() {
        let source = ScriptedSource::reader(vec![Step::WouldBlock, Step::Data(b"x".to_vec())]);
        let mut io = BlockingIo::new(source);
        let mut buf = [0u8; 8];
        assert_eq!(
            io.read(&mut buf, Mode::NonBlocking).unwrap(),
            Outcome::WouldBlock
        );
        assert_eq!(io.get_ref().waits(), 0);
        assert_eq!(io.read(&mut buf, Mode::NonBlocking).unwrap(), Outcome::Ready(1));
    }

    #[test]
    fn test_interrupted_is_retried_without_wait() {
        let source = ScriptedSource::reader(vec![
            Step::Interrupted,
            Step::Interrupted,
            Step::Data(b"ok".to_vec()),
        ]);
        let mut io = BlockingIo::new(source);
        let mut buf = [0u8; 8];
        assert_eq!(io.read(&mut buf, Mode::NonBlocking).unwrap(), Outcome::Ready(2));
        assert_eq!(io.get_ref().waits(), 0);
        assert_eq!(io.get_ref().read_calls(), 3);
    }

    #[test]
    fn test_capability_checks() {
        let mut io = BlockingIo::new(MemorySource::reader(b"abc".to_vec()));
        assert!(matches!(
            io.write(b"x", Mode::Blocking),
            Err(OxiIoError::NotWritable)
        ));

        io.close().unwrap();
        let mut buf = [0u8; 2];
        // Closed is reported before the capability check.
        assert!(matches!(io.read(&mut buf, Mode::Blocking), Err(OxiIoError::Closed)));
        assert!(matches!(io.write(b"x", Mode::Blocking), Err(OxiIoError::Closed)));
    }

    #[test]
    fn test_oversized_count_is_a_contract_violation() {
        let source = ScriptedSource::reader(vec![Step::Lie(10)]);
        let mut io = BlockingIo::new(source);
        let mut buf = [0u8; 4];
        let err = io.read(&mut buf, Mode::Blocking).unwrap_err();
        assert!(err.is_consistency_violation());
    }

    #[test]
    fn test_wait_timeout() {
        let source = ScriptedSource::reader(vec![Step::WouldBlock]).with_wait_result(false);
        let mut io = BlockingIo::new(source);
        let mut buf = [0u8; 4];
        let err = io
            .read_timeout(&mut buf, Mode::Blocking, Some(Duration::from_millis(5)))
            .unwrap_err();
        assert!(matches!(err, OxiIoError::TimedOut { interest: "readable" }));
    }

    #[test]
    fn test_close_during_wait_is_observed() {
        let source = ScriptedSource::reader(vec![Step::WouldBlock, Step::WouldBlock])
            .with_close_after_waits(1);
        let mut io = BlockingIo::new(source);
        let mut buf = [0u8; 4];
        assert!(matches!(io.read(&mut buf, Mode::Blocking), Err(OxiIoError::Closed)));
    }

    #[test]
    fn test_zero_length_request_does_not_touch_source() {
        let source = ScriptedSource::reader(vec![Step::WouldBlock]);
        let mut io = BlockingIo::new(source);
        assert_eq!(io.read(&mut [], Mode::Blocking).unwrap(), Outcome::Ready(0));
        assert_eq!(io.get_ref().read_calls(), 0);
    }
}
