//! The stream facade.
//!
//! [`Stream`] is the state machine callers use. It checks the open state and
//! direction of every operation before dispatching to the [`Pipeline`].
//!
//! ```text
//!              close_read                 close_write
//!  ReadWrite ─────────────► WriteOnly ──────────────┐
//!      │                                            ▼
//!      │ close_write                              Closed
//!      ▼                                            ▲
//!  ReadOnly ────────────────────────────────────────┘
//!              close_read          (close from any state)
//! ```
//!
//! # Byte and text operations
//!
//! Byte reads ([`read`](Stream::read), [`read_byte`](Stream::read_byte),
//! `std::io::Read`) return raw source bytes. Text reads
//! ([`read_line`](Stream::read_line), [`read_char`](Stream::read_char),
//! [`read_to_string`](Stream::read_to_string)) go through the character
//! layer: converted when an internal encoding is set, newline-normalized in
//! universal mode. A byte read while converted characters are pending fails
//! with [`OxiIoError::BufferedDataPending`].

use crate::options::StreamOptions;
use crate::pipeline::Pipeline;
use encoding_rs::Encoding;
use oxiio_core::{Interest, Mode, OxiIoError, Outcome, Result, Source, SourceStat, Whence};
use oxiio_text::encoding::{decode_string, encode_str, sniff_bom};
use oxiio_text::{CharacterIo, CharacterReader, LineOptions};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Open state of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    /// Both directions open.
    ReadWrite,
    /// Only reading is possible.
    ReadOnly,
    /// Only writing is possible.
    WriteOnly,
    /// Every operation fails.
    Closed,
}

impl StreamState {
    /// Check whether reading is allowed.
    pub fn can_read(self) -> bool {
        matches!(self, Self::ReadWrite | Self::ReadOnly)
    }

    /// Check whether writing is allowed.
    pub fn can_write(self) -> bool {
        matches!(self, Self::ReadWrite | Self::WriteOnly)
    }
}

/// A buffered, encoding-aware stream over one source.
///
/// # Example
///
/// ```
/// use oxiio_core::adapters::MemorySource;
/// use oxiio_stream::{Stream, StreamOptions};
///
/// let mut stream = Stream::open(MemorySource::reader(b"alpha\nbeta\n".to_vec())).unwrap();
/// assert_eq!(stream.read_line().unwrap().as_deref(), Some("alpha\n"));
/// assert_eq!(stream.lineno(), 1);
/// ```
#[derive(Debug)]
pub struct Stream<S: Source> {
    pipeline: Pipeline<S>,
    state: StreamState,
    options: StreamOptions,
    lineno: u64,
    bom_pending: bool,
}

impl<S: Source> Stream<S> {
    /// Open a stream with [`StreamOptions::TEXT`].
    pub fn open(source: S) -> Result<Self> {
        Self::with_options(source, StreamOptions::TEXT)
    }

    /// Open a stream with explicit options.
    ///
    /// The initial state follows the source's capabilities.
    pub fn with_options(source: S, options: StreamOptions) -> Result<Self> {
        source.ensure_open()?;
        let state = match (source.is_readable(), source.is_writable()) {
            (true, true) => StreamState::ReadWrite,
            (true, false) => StreamState::ReadOnly,
            (false, true) => StreamState::WriteOnly,
            (false, false) => {
                return Err(OxiIoError::invalid_argument(
                    "source is neither readable nor writable",
                ));
            }
        };
        let pipeline = Pipeline::new(source, &options)?;
        debug!(?state, encoding = pipeline.character().encoding_name(), "opened stream");
        Ok(Self {
            pipeline,
            state,
            bom_pending: options.sniff_bom,
            options,
            lineno: 0,
        })
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Current state.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Check whether the stream is fully closed.
    pub fn is_closed(&self) -> bool {
        self.state == StreamState::Closed
    }

    /// Options in effect.
    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    /// The layers.
    pub fn pipeline(&self) -> &Pipeline<S> {
        &self.pipeline
    }

    /// The layers, mutably.
    pub fn pipeline_mut(&mut self) -> &mut Pipeline<S> {
        &mut self.pipeline
    }

    /// The source.
    pub fn get_ref(&self) -> &S {
        self.pipeline.source()
    }

    /// Close the read half.
    ///
    /// Buffered unread data is discarded. Closing the last open half closes
    /// the stream.
    pub fn close_read(&mut self) -> Result<()> {
        match self.state {
            StreamState::Closed => Err(OxiIoError::Closed),
            StreamState::WriteOnly => Err(OxiIoError::already_closed("read")),
            StreamState::ReadOnly => self.close(),
            StreamState::ReadWrite => {
                let (chars, io) = self.pipeline.parts_mut();
                chars.clear(io);
                io.discard_read_buffer();
                self.state = StreamState::WriteOnly;
                debug!("closed read half");
                Ok(())
            }
        }
    }

    /// Close the write half, flushing pending writes first.
    ///
    /// Closing the last open half closes the stream.
    pub fn close_write(&mut self) -> Result<()> {
        match self.state {
            StreamState::Closed => Err(OxiIoError::Closed),
            StreamState::ReadOnly => Err(OxiIoError::already_closed("write")),
            StreamState::WriteOnly => self.close(),
            StreamState::ReadWrite => {
                self.flush()?;
                self.state = StreamState::ReadOnly;
                debug!("closed write half");
                Ok(())
            }
        }
    }

    /// Flush and close the stream. Closing a closed stream does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.state == StreamState::Closed {
            return Ok(());
        }
        self.state = StreamState::Closed;
        let result = self.pipeline.close();
        debug!(ok = result.is_ok(), "closed stream");
        result
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            StreamState::Closed => Err(OxiIoError::Closed),
            _ => Ok(()),
        }
    }

    pub(crate) fn ensure_readable(&mut self) -> Result<()> {
        self.ensure_open()?;
        if !self.state.can_read() {
            return Err(OxiIoError::NotReadable);
        }
        if self.bom_pending {
            self.bom_pending = false;
            self.set_encoding_by_bom()?;
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<()> {
        self.ensure_open()?;
        if !self.state.can_write() {
            return Err(OxiIoError::NotWritable);
        }
        Ok(())
    }

    fn ensure_byte_readable(&mut self, operation: &'static str) -> Result<()> {
        self.ensure_readable()?;
        if self.pipeline.character().pending_len() > 0 {
            return Err(OxiIoError::buffered_data_pending(operation));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Byte reads
    // ------------------------------------------------------------------

    /// Read exactly `n` bytes, or fewer at end of stream.
    ///
    /// Returns `None` when `n > 0` and the stream is already at its end.
    pub fn read(&mut self, n: usize) -> Result<Option<Vec<u8>>> {
        self.ensure_byte_readable("read")?;
        let mut out = vec![0; n];
        let mut filled = 0;
        while filled < n {
            match self.pipeline.buffered_mut().read(&mut out[filled..], Mode::Blocking)? {
                Outcome::Ready(m) => filled += m,
                Outcome::Eof => break,
                Outcome::WouldBlock => {
                    return Err(OxiIoError::unexpected_result("would-block in blocking read"));
                }
            }
        }
        if filled == 0 && n > 0 {
            return Ok(None);
        }
        out.truncate(filled);
        Ok(Some(out))
    }

    /// Read at least one and at most `n` bytes, waiting if necessary.
    ///
    /// Fails with [`OxiIoError::EndOfStream`] at end of stream.
    pub fn read_partial(&mut self, n: usize) -> Result<Vec<u8>> {
        match self.read_with_mode(n, Mode::Blocking)? {
            Outcome::Ready(bytes) => Ok(bytes),
            Outcome::Eof => Err(OxiIoError::EndOfStream),
            Outcome::WouldBlock => Err(OxiIoError::unexpected_result(
                "would-block in blocking read",
            )),
        }
    }

    /// Read at most `n` bytes without waiting.
    pub fn read_nonblock(&mut self, n: usize) -> Result<Outcome<Vec<u8>>> {
        self.read_with_mode(n, Mode::NonBlocking)
    }

    fn read_with_mode(&mut self, n: usize, mode: Mode) -> Result<Outcome<Vec<u8>>> {
        self.ensure_byte_readable("read_partial")?;
        let mut out = vec![0; n];
        Ok(self
            .pipeline
            .buffered_mut()
            .read(&mut out, mode)?
            .map(|m| {
                out.truncate(m);
                out
            }))
    }

    /// Fill `buf` completely.
    ///
    /// Fails with [`OxiIoError::EndOfStream`] when the stream ends first.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.ensure_byte_readable("read_exact")?;
        let mut filled = 0;
        while filled < buf.len() {
            match self.pipeline.buffered_mut().read(&mut buf[filled..], Mode::Blocking)? {
                Outcome::Ready(m) => filled += m,
                Outcome::Eof => return Err(OxiIoError::EndOfStream),
                Outcome::WouldBlock => {
                    return Err(OxiIoError::unexpected_result("would-block in blocking read"));
                }
            }
        }
        Ok(())
    }

    /// Read all remaining bytes.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>> {
        self.ensure_byte_readable("read_to_end")?;
        let mut out = Vec::new();
        let mut chunk = vec![0; self.pipeline.buffered().capacity()];
        loop {
            match self.pipeline.buffered_mut().read(&mut chunk, Mode::Blocking)? {
                Outcome::Ready(m) => out.extend_from_slice(&chunk[..m]),
                Outcome::Eof => return Ok(out),
                Outcome::WouldBlock => {
                    return Err(OxiIoError::unexpected_result("would-block in blocking read"));
                }
            }
        }
    }

    /// Read one byte.
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.read(1)?.and_then(|bytes| bytes.first().copied()))
    }

    /// Push one byte back.
    pub fn unread_byte(&mut self, byte: u8) -> Result<()> {
        self.unread(&[byte])
    }

    /// Push bytes back in front of the byte buffer.
    pub fn unread(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_byte_readable("unread")?;
        self.pipeline.buffered_mut().unread(bytes)
    }

    /// Read bytes straight from the source, bypassing the buffers.
    ///
    /// Fails with [`OxiIoError::BufferedDataPending`] while buffered read
    /// data exists.
    pub fn sys_read(&mut self, n: usize) -> Result<Option<Vec<u8>>> {
        self.ensure_byte_readable("sys_read")?;
        if !self.pipeline.buffered().read_buffer_empty() {
            return Err(OxiIoError::buffered_data_pending("sys_read"));
        }
        let mut out = vec![0; n];
        match self.pipeline.blocking_mut().read(&mut out, Mode::Blocking)? {
            Outcome::Ready(m) => {
                out.truncate(m);
                Ok(Some(out))
            }
            Outcome::Eof => Ok(None),
            Outcome::WouldBlock => Err(OxiIoError::unexpected_result(
                "would-block in blocking read",
            )),
        }
    }

    // ------------------------------------------------------------------
    // Text reads
    // ------------------------------------------------------------------

    /// Read one character.
    pub fn read_char(&mut self) -> Result<Option<String>> {
        match self.read_char_bytes()? {
            Some(bytes) => self.decode(bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Read one character as bytes in the content encoding.
    pub fn read_char_bytes(&mut self) -> Result<Option<Vec<u8>>> {
        self.ensure_readable()?;
        let newline = self.options.newline;
        match self.pipeline.text(newline, Mode::Blocking).read_char()? {
            Outcome::Ready(ch) => Ok(Some(ch)),
            Outcome::Eof => Ok(None),
            Outcome::WouldBlock => Err(OxiIoError::unexpected_result(
                "would-block in blocking read",
            )),
        }
    }

    /// Push a character back in front of the text content.
    pub fn unread_char(&mut self, ch: &str) -> Result<()> {
        self.ensure_readable()?;
        let encoding = self.pipeline.character().encoding();
        let bytes = encode_str(encoding, ch)?;
        self.pipeline
            .text(self.options.newline, Mode::Blocking)
            .unread(&bytes)
    }

    /// Read all remaining text.
    pub fn read_to_string(&mut self) -> Result<String> {
        self.ensure_readable()?;
        let newline = self.options.newline;
        let text = self.pipeline.text(newline, Mode::Blocking).read_to_end()?;
        match text {
            Outcome::Ready(bytes) => self.decode(bytes),
            Outcome::Eof | Outcome::WouldBlock => Ok(String::new()),
        }
    }

    // Content is in the internal encoding when converting.
    fn decode(&self, bytes: Vec<u8>) -> Result<String> {
        decode_string(self.pipeline.character().encoding(), bytes)
    }

    /// Read a line using the stream's default line options.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        let options = self.options.line.clone();
        self.read_line_with(&options)
    }

    /// Read a line with explicit options.
    pub fn read_line_with(&mut self, options: &LineOptions) -> Result<Option<String>> {
        match self.read_line_bytes(options)? {
            Some(bytes) => self.decode(bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Read a line as bytes in the content encoding.
    pub fn read_line_bytes(&mut self, options: &LineOptions) -> Result<Option<Vec<u8>>> {
        match self.read_line_mode(options, Mode::Blocking)? {
            Outcome::Ready(line) => Ok(Some(line)),
            Outcome::Eof => Ok(None),
            Outcome::WouldBlock => Err(OxiIoError::unexpected_result(
                "would-block in blocking read",
            )),
        }
    }

    /// Read a line without waiting.
    ///
    /// A partial line is kept buffered when the source would block.
    pub fn read_line_nonblock(&mut self, options: &LineOptions) -> Result<Outcome<Vec<u8>>> {
        self.read_line_mode(options, Mode::NonBlocking)
    }

    fn read_line_mode(&mut self, options: &LineOptions, mode: Mode) -> Result<Outcome<Vec<u8>>> {
        self.ensure_readable()?;
        let newline = self.options.newline;
        let line = self.pipeline.text(newline, mode).read_line(options)?;
        if let Outcome::Ready(_) = line {
            self.lineno += 1;
        }
        Ok(line)
    }

    /// Read all remaining lines with the default line options.
    pub fn read_lines(&mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        while let Some(line) = self.read_line()? {
            lines.push(line);
        }
        Ok(lines)
    }

    /// Number of lines read so far.
    pub fn lineno(&self) -> u64 {
        self.lineno
    }

    /// Set the line counter.
    pub fn set_lineno(&mut self, lineno: u64) {
        self.lineno = lineno;
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Write all of `data`.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.ensure_writable()?;
        let mut written = 0;
        while written < data.len() {
            match self.pipeline.buffered_mut().write(&data[written..], Mode::Blocking)? {
                Outcome::Ready(n) => written += n,
                Outcome::WouldBlock | Outcome::Eof => {
                    return Err(OxiIoError::unexpected_result("write stalled in blocking mode"));
                }
            }
        }
        self.sync_if_needed()?;
        Ok(written)
    }

    /// Write some of `data`, returning how much was accepted.
    pub fn write_partial(&mut self, data: &[u8]) -> Result<usize> {
        self.ensure_writable()?;
        let n = match self.pipeline.buffered_mut().write(data, Mode::Blocking)? {
            Outcome::Ready(n) => n,
            Outcome::WouldBlock | Outcome::Eof => {
                return Err(OxiIoError::unexpected_result("write stalled in blocking mode"));
            }
        };
        self.sync_if_needed()?;
        Ok(n)
    }

    /// Write without waiting.
    pub fn write_nonblock(&mut self, data: &[u8]) -> Result<Outcome<usize>> {
        self.ensure_writable()?;
        let outcome = self.pipeline.buffered_mut().write(data, Mode::NonBlocking)?;
        if self.options.sync {
            if let Outcome::WouldBlock = self.pipeline.buffered_mut().flush(Mode::NonBlocking)? {
                trace!("write-through flush would block");
            }
        }
        Ok(outcome)
    }

    /// Write text, translating newlines and encoding it into the external
    /// encoding.
    pub fn write_str(&mut self, text: &str) -> Result<usize> {
        self.ensure_writable()?;
        let text = self.options.newline.encode(text);
        let bytes = encode_str(self.options.external_encoding, &text)?;
        self.write(&bytes)
    }

    /// Hand pending writes to the source.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_writable()?;
        self.pipeline.buffered_mut().flush(Mode::Blocking)?;
        Ok(())
    }

    /// Write straight to the source, bypassing the buffers.
    ///
    /// Fails with [`OxiIoError::BufferedDataPending`] while writes are
    /// buffered.
    pub fn sys_write(&mut self, data: &[u8]) -> Result<usize> {
        self.ensure_writable()?;
        if !self.pipeline.buffered().write_buffer_empty() {
            return Err(OxiIoError::buffered_data_pending("sys_write"));
        }
        match self.pipeline.blocking_mut().write(data, Mode::Blocking)? {
            Outcome::Ready(n) => Ok(n),
            Outcome::WouldBlock | Outcome::Eof => Err(OxiIoError::unexpected_result(
                "write stalled in blocking mode",
            )),
        }
    }

    fn sync_if_needed(&mut self) -> Result<()> {
        if self.options.sync {
            self.pipeline.buffered_mut().flush(Mode::Blocking)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Positioning
    // ------------------------------------------------------------------

    /// Reposition the stream.
    ///
    /// Pending writes are flushed and every read buffer, converted text
    /// included, is discarded.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        self.ensure_open()?;
        let (chars, io) = self.pipeline.parts_mut();
        let position = io.seek(offset, whence)?;
        chars.clear(io);
        trace!(offset, ?whence, position, "seeked");
        Ok(position)
    }

    /// Logical byte position.
    ///
    /// Converted text still held by the character layer is not accounted
    /// for: its source bytes count as consumed.
    pub fn pos(&mut self) -> Result<u64> {
        self.ensure_open()?;
        self.pipeline.buffered_mut().position()
    }

    /// Seek to an absolute position.
    pub fn set_pos(&mut self, pos: u64) -> Result<u64> {
        let offset = i64::try_from(pos)
            .map_err(|_| OxiIoError::invalid_argument("position out of range"))?;
        self.seek(offset, Whence::Set)
    }

    /// Seek to the start and reset the line counter.
    pub fn rewind(&mut self) -> Result<()> {
        self.seek(0, Whence::Set)?;
        self.lineno = 0;
        Ok(())
    }

    /// Check for end of stream, waiting for data if necessary.
    pub fn is_eof(&mut self) -> Result<bool> {
        self.ensure_readable()?;
        let (chars, io) = self.pipeline.parts_mut();
        if !chars.is_empty(io) {
            return Ok(false);
        }
        match chars.refill(io, true, Mode::Blocking)? {
            Outcome::Ready(_) | Outcome::WouldBlock => Ok(false),
            Outcome::Eof => Ok(true),
        }
    }

    // ------------------------------------------------------------------
    // Encodings
    // ------------------------------------------------------------------

    /// Encoding of the source bytes.
    pub fn external_encoding(&self) -> Option<&'static Encoding> {
        self.options.external_encoding
    }

    /// Encoding text is converted to, if any.
    pub fn internal_encoding(&self) -> Option<&'static Encoding> {
        self.options.internal_encoding
    }

    /// Switch encodings.
    ///
    /// Fails with [`OxiIoError::BufferedDataPending`] while converted text
    /// is still buffered.
    pub fn set_encoding(
        &mut self,
        external: Option<&'static Encoding>,
        internal: Option<&'static Encoding>,
    ) -> Result<()> {
        self.ensure_open()?;
        if self.pipeline.character().pending_len() > 0 {
            return Err(OxiIoError::buffered_data_pending("set_encoding"));
        }
        let character = CharacterIo::select(external, internal)?;
        self.pipeline.set_character(character);
        self.options.external_encoding = external;
        self.options.internal_encoding = internal;
        debug!(
            external = oxiio_text::encoding::name(external),
            internal = oxiio_text::encoding::name(internal),
            "switched encoding"
        );
        Ok(())
    }

    /// Switch to binary mode: no conversion, no newline translation.
    pub fn binmode(&mut self) -> Result<()> {
        self.set_encoding(None, None)?;
        self.options.newline = oxiio_text::Newline::None;
        Ok(())
    }

    /// Detect a byte order mark, skip it and switch the external encoding.
    ///
    /// The internal encoding is kept. Returns the detected encoding.
    pub fn set_encoding_by_bom(&mut self) -> Result<Option<&'static Encoding>> {
        self.ensure_open()?;
        if !self.state.can_read() {
            return Err(OxiIoError::NotReadable);
        }
        let io = self.pipeline.buffered_mut();
        while io.buffered_len() < 3 && io.buffered_len() < io.capacity() {
            match io.refill(Mode::Blocking)? {
                Outcome::Ready(_) => {}
                Outcome::Eof | Outcome::WouldBlock => break,
            }
        }
        let Some((encoding, bom_len)) = sniff_bom(io.peek()) else {
            return Ok(None);
        };
        io.skip(bom_len);
        self.set_encoding(Some(encoding), self.options.internal_encoding)?;
        debug!(encoding = encoding.name(), "detected byte order mark");
        Ok(Some(encoding))
    }

    // ------------------------------------------------------------------
    // Source capabilities
    // ------------------------------------------------------------------

    /// Source metadata.
    pub fn stat(&self) -> Result<SourceStat> {
        self.ensure_open()?;
        self.pipeline.source().stat()
    }

    /// OS-level handle number of the source.
    pub fn fileno(&self) -> Result<i64> {
        self.ensure_open()?;
        self.pipeline.source().fileno()
    }

    /// Check whether the source is a terminal.
    pub fn is_tty(&self) -> Result<bool> {
        self.ensure_open()?;
        self.pipeline.source().is_tty()
    }

    /// Check whether a read would return without waiting.
    pub fn is_ready(&self) -> Result<bool> {
        self.ensure_open()?;
        let (character, io) = (self.pipeline.character(), self.pipeline.buffered());
        if !character.is_empty(io) {
            return Ok(true);
        }
        self.pipeline.source().is_ready()
    }

    /// Wait until the stream is readable.
    ///
    /// Returns `false` when `timeout` elapses first.
    pub fn wait_readable(&mut self, timeout: Option<Duration>) -> Result<bool> {
        self.ensure_readable()?;
        if !self.is_ready_buffered() {
            return self.pipeline.blocking_mut().wait(Interest::Readable, timeout);
        }
        Ok(true)
    }

    /// Wait until the source accepts writes.
    pub fn wait_writable(&mut self, timeout: Option<Duration>) -> Result<bool> {
        self.ensure_writable()?;
        self.pipeline.blocking_mut().wait(Interest::Writable, timeout)
    }

    /// Toggle the source's native nonblocking flag.
    pub fn set_nonblocking(&mut self, nonblocking: bool) -> Result<()> {
        self.ensure_open()?;
        self.pipeline.source_mut().set_nonblocking(nonblocking)
    }

    fn is_ready_buffered(&self) -> bool {
        !self.pipeline.character().is_empty(self.pipeline.buffered())
    }

    /// Duplicate the stream over a duplicated source.
    ///
    /// Pending writes are flushed first. The clone has its own buffers,
    /// state, options and line counter.
    pub fn try_clone(&mut self) -> Result<Self> {
        self.ensure_open()?;
        Ok(Self {
            pipeline: self.pipeline.try_clone()?,
            state: self.state,
            options: self.options.clone(),
            lineno: self.lineno,
            bom_pending: self.bom_pending,
        })
    }
}

impl<S: Source> Drop for Stream<S> {
    fn drop(&mut self) {
        if self.state.can_write() && !self.pipeline.buffered().write_buffer_empty() {
            if let Err(e) = self.pipeline.buffered_mut().flush(Mode::Blocking) {
                warn!(error = %e, "failed to flush stream on drop");
            }
        }
    }
}
