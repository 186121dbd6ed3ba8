//! Fixed-capacity byte buffering over a blocking-emulated source.
//!
//! [`BufferedIo`] batches reads and writes to minimize calls into the source
//! and supports the lookahead and pushback needed by line- and
//! pattern-oriented readers.
//!
//! # Layout
//!
//! ```text
//! read region                          write region
//! ┌──────────┬───────────────┬──────┐  ┌────────┬──────────────┬──────┐
//! │ consumed │ unread bytes  │ free │  │ sent   │ pending      │ free │
//! └──────────┴───────────────┴──────┘  └────────┴──────────────┴──────┘
//! 0        start            end   cap  0      w_start       w_end   cap
//! ```
//!
//! Both regions start with the same fixed capacity. Refill compacts unread
//! bytes to the front before appending; pushback that does not fit in front
//! of `start` relocates unread bytes to the back. Only [`BufferedIo::restore`]
//! grows the read region, to take back input a reader already consumed.
//!
//! # Direction coherence
//!
//! Reading while writes are pending flushes them first. Writing while
//! read-ahead is buffered seeks the source back over the read-ahead and drops
//! it; a source that cannot seek keeps its read-ahead, because its directions
//! are independent.

use crate::blocking::BlockingIo;
use crate::error::{OxiIoError, Result};
use crate::signal::{Mode, Outcome, Whence};
use crate::source::Source;
use tracing::{debug, trace};

/// Default buffer capacity (8 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Byte buffer layer owning a [`BlockingIo`].
#[derive(Debug)]
pub struct BufferedIo<S> {
    inner: BlockingIo<S>,
    read_buf: Box<[u8]>,
    start: usize,
    end: usize,
    write_buf: Box<[u8]>,
    w_start: usize,
    w_end: usize,
}

impl<S: Source> BufferedIo<S> {
    /// Buffer `source` with [`DEFAULT_BUFFER_SIZE`].
    pub fn new(source: S) -> Self {
        Self::from_parts(BlockingIo::new(source), DEFAULT_BUFFER_SIZE)
    }

    /// Buffer `source` with the given capacity.
    ///
    /// Fails when `capacity` is zero.
    pub fn with_capacity(source: S, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(OxiIoError::invalid_argument("buffer capacity must be positive"));
        }
        Ok(Self::from_parts(BlockingIo::new(source), capacity))
    }

    fn from_parts(inner: BlockingIo<S>, capacity: usize) -> Self {
        Self {
            inner,
            read_buf: vec![0; capacity].into_boxed_slice(),
            start: 0,
            end: 0,
            write_buf: vec![0; capacity].into_boxed_slice(),
            w_start: 0,
            w_end: 0,
        }
    }

    /// Get the blocking layer.
    pub fn get_ref(&self) -> &BlockingIo<S> {
        &self.inner
    }

    /// Get the blocking layer mutably.
    ///
    /// Transfers made through it bypass the buffers.
    pub fn get_mut(&mut self) -> &mut BlockingIo<S> {
        &mut self.inner
    }

    /// Get the source.
    pub fn source(&self) -> &S {
        self.inner.get_ref()
    }

    /// Get the source mutably.
    pub fn source_mut(&mut self) -> &mut S {
        self.inner.get_mut()
    }

    /// Configured capacity of each region.
    pub fn capacity(&self) -> usize {
        self.write_buf.len()
    }

    /// Number of unread bytes buffered.
    pub fn buffered_len(&self) -> usize {
        self.end - self.start
    }

    /// Number of written bytes not yet handed to the source.
    pub fn pending_write_len(&self) -> usize {
        self.w_end - self.w_start
    }

    /// Check for buffered unread bytes.
    pub fn read_buffer_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check for pending writes.
    pub fn write_buffer_empty(&self) -> bool {
        self.w_start == self.w_end
    }

    /// Buffered, unconsumed bytes. Never touches the source.
    pub fn peek(&self) -> &[u8] {
        &self.read_buf[self.start..self.end]
    }

    /// Consume up to `n` buffered bytes and return how many were consumed.
    pub fn skip(&mut self, n: usize) -> usize {
        let n = n.min(self.buffered_len());
        self.start += n;
        if self.start == self.end {
            self.start = 0;
            self.end = 0;
        }
        n
    }

    /// Drop all buffered unread bytes.
    pub fn discard_read_buffer(&mut self) {
        self.start = 0;
        self.end = 0;
    }

    /// Append one source read to the read region.
    ///
    /// Yields the number of bytes added, [`Outcome::Eof`] when the source is
    /// exhausted, or [`Outcome::WouldBlock`] in nonblocking mode.
    pub fn refill(&mut self, mode: Mode) -> Result<Outcome<usize>> {
        if let Outcome::WouldBlock = self.flush(mode)? {
            return Ok(Outcome::WouldBlock);
        }

        if self.start > 0 {
            self.read_buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        if self.end == self.read_buf.len() {
            return Err(OxiIoError::insufficient_buffer(1, 0));
        }

        match self.inner.read(&mut self.read_buf[self.end..], mode)? {
            Outcome::Ready(0) => Err(OxiIoError::NoBytesRead),
            Outcome::Ready(n) => {
                self.end += n;
                trace!(added = n, buffered = self.end, "refilled read buffer");
                Ok(Outcome::Ready(n))
            }
            other => Ok(other),
        }
    }

    /// Insert `bytes` in front of the unread region.
    ///
    /// Fails with [`OxiIoError::InsufficientBuffer`] and leaves the buffer
    /// untouched when the bytes do not fit.
    pub fn unread(&mut self, bytes: &[u8]) -> Result<()> {
        let available = self.read_buf.len() - self.buffered_len();
        if bytes.len() > available {
            return Err(OxiIoError::insufficient_buffer(bytes.len(), available));
        }
        self.push_front(bytes);
        Ok(())
    }

    /// Put back bytes a reader consumed but could not use yet.
    ///
    /// Like [`unread`](Self::unread), but the read region grows when the
    /// bytes do not fit, so the input is never dropped.
    pub fn restore(&mut self, bytes: &[u8]) {
        let needed = self.buffered_len() + bytes.len();
        if needed > self.read_buf.len() {
            let unread = self.buffered_len();
            let mut grown = vec![0; needed].into_boxed_slice();
            grown[needed - unread..].copy_from_slice(self.peek());
            debug!(from = self.read_buf.len(), to = needed, "growing read region");
            self.read_buf = grown;
            self.start = needed - unread;
            self.end = needed;
        }
        self.push_front(bytes);
    }

    /// Insert `bytes` in front of the unread region; the caller checked room.
    fn push_front(&mut self, bytes: &[u8]) {
        let len = bytes.len();
        if len == 0 {
            return;
        }
        if len > self.start {
            let unread = self.buffered_len();
            let capacity = self.read_buf.len();
            self.read_buf.copy_within(self.start..self.end, capacity - unread);
            self.start = capacity - unread;
            self.end = capacity;
        }
        self.start -= len;
        self.read_buf[self.start..self.start + len].copy_from_slice(bytes);
    }

    /// Hand pending writes to the source.
    ///
    /// Partial progress is kept; in nonblocking mode a source that stops
    /// accepting yields [`Outcome::WouldBlock`] with the remainder pending.
    pub fn flush(&mut self, mode: Mode) -> Result<Outcome<()>> {
        while self.w_start < self.w_end {
            match self.inner.write(&self.write_buf[self.w_start..self.w_end], mode)? {
                Outcome::Ready(n) => self.w_start += n,
                Outcome::WouldBlock => return Ok(Outcome::WouldBlock),
                Outcome::Eof => {
                    return Err(OxiIoError::unexpected_result("end of stream while flushing"));
                }
            }
        }
        if self.w_end > 0 {
            trace!(flushed = self.w_end, "flushed write buffer");
        }
        self.w_start = 0;
        self.w_end = 0;
        Ok(Outcome::Ready(()))
    }

    /// Read into `buf`, serving buffered bytes first.
    ///
    /// Reads never combine buffered bytes with a fresh source read, so the
    /// result may be short. Requests at least as large as the buffer bypass
    /// it when nothing is buffered.
    pub fn read(&mut self, buf: &mut [u8], mode: Mode) -> Result<Outcome<usize>> {
        if buf.is_empty() {
            return Ok(Outcome::Ready(0));
        }
        if self.read_buffer_empty() {
            if let Outcome::WouldBlock = self.flush(mode)? {
                return Ok(Outcome::WouldBlock);
            }
            if buf.len() >= self.capacity() {
                return self.inner.read(buf, mode);
            }
            match self.refill(mode)? {
                Outcome::Ready(_) => {}
                Outcome::WouldBlock => return Ok(Outcome::WouldBlock),
                Outcome::Eof => return Ok(Outcome::Eof),
            }
        }

        let n = buf.len().min(self.buffered_len());
        buf[..n].copy_from_slice(&self.read_buf[self.start..self.start + n]);
        self.skip(n);
        Ok(Outcome::Ready(n))
    }

    /// Write `data`, buffering when it fits.
    ///
    /// Returns the number of bytes accepted, which is short only when a
    /// nonblocking flush stalls or a large write bypassing the buffer is
    /// accepted partially by the source.
    pub fn write(&mut self, data: &[u8], mode: Mode) -> Result<Outcome<usize>> {
        if data.is_empty() {
            return Ok(Outcome::Ready(0));
        }
        self.drop_read_ahead()?;

        if data.len() <= self.capacity() - self.w_end {
            self.append_pending(data);
            return Ok(Outcome::Ready(data.len()));
        }

        if let Outcome::WouldBlock = self.flush(mode)? {
            self.compact_pending();
            let room = (self.capacity() - self.w_end).min(data.len());
            if room == 0 {
                return Ok(Outcome::WouldBlock);
            }
            self.append_pending(&data[..room]);
            return Ok(Outcome::Ready(room));
        }

        if data.len() >= self.capacity() {
            return self.inner.write(data, mode);
        }
        self.append_pending(data);
        Ok(Outcome::Ready(data.len()))
    }

    /// Reposition the source, accounting for buffered bytes.
    ///
    /// Pending writes are flushed first; with [`Whence::Cur`] the offset is
    /// taken from the logical position, not the source's read-ahead position.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        self.flush(Mode::Blocking)?;
        let offset = match whence {
            Whence::Cur => offset
                .checked_sub(self.buffered_len() as i64)
                .ok_or_else(|| OxiIoError::invalid_argument("seek offset overflow"))?,
            _ => offset,
        };
        let position = self.inner.seek(offset, whence)?;
        self.discard_read_buffer();
        Ok(position)
    }

    /// Logical position: the source position adjusted for buffered bytes.
    ///
    /// Unlike `seek(0, Whence::Cur)` this keeps the buffers intact.
    pub fn position(&mut self) -> Result<u64> {
        let raw = self.inner.seek(0, Whence::Cur)?;
        (raw + self.pending_write_len() as u64)
            .checked_sub(self.buffered_len() as u64)
            .ok_or_else(|| OxiIoError::unexpected_result("source position behind read-ahead"))
    }

    /// Flush pending writes and close the source.
    ///
    /// The source is closed even when the flush fails; the flush error wins.
    pub fn close(&mut self) -> Result<()> {
        let flushed = self.flush(Mode::Blocking);
        let closed = self.inner.close();
        self.discard_read_buffer();
        self.w_start = 0;
        self.w_end = 0;
        debug!(flush_ok = flushed.is_ok(), close_ok = closed.is_ok(), "closed buffered source");
        flushed?;
        closed
    }

    /// Check whether the source is closed.
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Duplicate over a duplicated source.
    ///
    /// Pending writes are flushed first so they reach the source once. The
    /// clone gets its own copy of the unread bytes.
    pub fn try_clone(&mut self) -> Result<Self> {
        self.flush(Mode::Blocking)?;
        let mut clone = Self::from_parts(self.inner.duplicate()?, self.capacity());
        let unread = self.buffered_len();
        clone.restore(self.peek());
        debug!(capacity = self.capacity(), unread, "duplicated buffered source");
        Ok(clone)
    }

    fn drop_read_ahead(&mut self) -> Result<()> {
        if self.read_buffer_empty() {
            self.discard_read_buffer();
            return Ok(());
        }
        let unread = self.buffered_len() as i64;
        match self.inner.seek(-unread, Whence::Cur) {
            Ok(_) => {
                trace!(unread, "dropped read-ahead before write");
                self.discard_read_buffer();
                Ok(())
            }
            Err(OxiIoError::IllegalSeek | OxiIoError::Unsupported { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn append_pending(&mut self, data: &[u8]) {
        let end = self.w_end + data.len();
        self.write_buf[self.w_end..end].copy_from_slice(data);
        self.w_end = end;
    }

    fn compact_pending(&mut self) {
        if self.w_start > 0 {
            self.write_buf.copy_within(self.w_start..self.w_end, 0);
            self.w_end -= self.w_start;
            self.w_start = 0;
        }
    }
}
