//! The capability contract every raw source implements.
//!
//! A [`Source`] exposes unbuffered primitives only. Everything else in OxiIO
//! (buffering, blocking emulation, character decoding) is layered on top and
//! never assumes the source is an operating-system descriptor.
//!
//! # Required and optional capabilities
//!
//! `read`, `write`, `close` and `is_closed` must be implemented. The rest
//! have defaults: capabilities without a sensible universal answer fail with
//! [`OxiIoError::Unsupported`] (or [`OxiIoError::IllegalSeek`] for `seek`),
//! while `is_ready` and `is_tty` default to `true` and `false`.
//!
//! Every default checks [`Source::is_closed`] first and fails with
//! [`OxiIoError::Closed`], so a closed source never reports "unsupported".

use crate::error::{OxiIoError, Result};
use crate::signal::{Interest, Signal, Whence};
use std::time::Duration;

/// Kind of object behind a source, as reported by [`Source::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Anonymous or named pipe.
    Pipe,
    /// Network socket.
    Socket,
    /// Character device (terminals included).
    CharDevice,
    /// In-memory region.
    Memory,
    /// Anything else.
    Other,
}

/// Metadata reported by [`Source::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceStat {
    /// What the source reads from and writes to.
    pub kind: SourceKind,
    /// Size in bytes, when known.
    pub size: Option<u64>,
}

/// Raw, unbuffered data source.
///
/// Primitives may transfer fewer bytes than requested, may answer
/// [`Signal::WouldBlock`] or [`Signal::Interrupted`], and answer
/// [`Signal::Eof`] from `read` once exhausted.
pub trait Source {
    /// Read up to `buf.len()` bytes into `buf`.
    fn read(&mut self, buf: &mut [u8]) -> Result<Signal<usize>>;

    /// Write up to `buf.len()` bytes from `buf`.
    fn write(&mut self, buf: &[u8]) -> Result<Signal<usize>>;

    /// Close the source. Calling this twice is the caller's responsibility.
    fn close(&mut self) -> Result<()>;

    /// Check whether the source has been closed.
    fn is_closed(&self) -> bool;

    /// Fail with [`OxiIoError::Closed`] when closed.
    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(OxiIoError::Closed)
        } else {
            Ok(())
        }
    }

    /// Whether `read` is meaningful for this source.
    fn is_readable(&self) -> bool {
        false
    }

    /// Whether `write` is meaningful for this source.
    fn is_writable(&self) -> bool {
        false
    }

    /// Reposition the source and return the new absolute position.
    fn seek(&mut self, _offset: i64, _whence: Whence) -> Result<u64> {
        self.ensure_open()?;
        Err(OxiIoError::IllegalSeek)
    }

    /// Report metadata about the source.
    fn stat(&self) -> Result<SourceStat> {
        self.ensure_open()?;
        Err(OxiIoError::unsupported("stat"))
    }

    /// Report the operating-system descriptor behind the source.
    fn fileno(&self) -> Result<i64> {
        self.ensure_open()?;
        Err(OxiIoError::unsupported("fileno"))
    }

    /// Block until the source is ready for `interest` or `timeout` elapses.
    ///
    /// Returns `false` on timeout. `None` waits indefinitely.
    fn wait(&mut self, _interest: Interest, _timeout: Option<Duration>) -> Result<bool> {
        self.ensure_open()?;
        Err(OxiIoError::unsupported("wait"))
    }

    /// Whether a read could make progress right now.
    fn is_ready(&self) -> Result<bool> {
        self.ensure_open()?;
        Ok(true)
    }

    /// Whether the source is an interactive terminal.
    fn is_tty(&self) -> Result<bool> {
        self.ensure_open()?;
        Ok(false)
    }

    /// Switch the source's native nonblocking flag.
    fn set_nonblocking(&mut self, _nonblocking: bool) -> Result<()> {
        self.ensure_open()?;
        Err(OxiIoError::unsupported("set_nonblocking"))
    }

    /// Create an independent handle to the same underlying object.
    fn duplicate(&self) -> Result<Self>
    where
        Self: Sized,
    {
        self.ensure_open()?;
        Err(OxiIoError::unsupported("duplicate"))
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn read(&mut self, buf: &mut [u8]) -> Result<Signal<usize>> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<Signal<usize>> {
        (**self).write(buf)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }

    fn is_readable(&self) -> bool {
        (**self).is_readable()
    }

    fn is_writable(&self) -> bool {
        (**self).is_writable()
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        (**self).seek(offset, whence)
    }

    fn stat(&self) -> Result<SourceStat> {
        (**self).stat()
    }

    fn fileno(&self) -> Result<i64> {
        (**self).fileno()
    }

    fn wait(&mut self, interest: Interest, timeout: Option<Duration>) -> Result<bool> {
        (**self).wait(interest, timeout)
    }

    fn is_ready(&self) -> Result<bool> {
        (**self).is_ready()
    }

    fn is_tty(&self) -> Result<bool> {
        (**self).is_tty()
    }

    fn set_nonblocking(&mut self, nonblocking: bool) -> Result<()> {
        (**self).set_nonblocking(nonblocking)
    }
}
