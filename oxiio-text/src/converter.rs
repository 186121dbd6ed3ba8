//! Conversion strategy: decode the external encoding into a character buffer.
//!
//! The converter pulls bytes from the byte buffer, decodes them with a
//! persistent [`encoding_rs::Decoder`] and stores the result in its own
//! buffer, re-encoded into the internal encoding when that is not UTF-8.
//!
//! ```text
//!  BufferedIo            Decoder            (Encoder)          character buffer
//! ┌──────────┐  peek   ┌─────────┐  UTF-8  ┌─────────┐  bytes  ┌──────────────┐
//! │ external ├────────►│ state   ├────────►│ staged  ├────────►│ start .. end │
//! └──────────┘  skip   └─────────┘         └─────────┘         └──────────────┘
//! ```
//!
//! Failures never discard converted output: characters produced before an
//! invalid byte sequence or an unmappable character are delivered first and
//! the failure is reported by the next refill. End of stream is handled the
//! same way after the decoder is flushed.

use crate::encoding::{CharLen, char_len, is_encodable};
use crate::reader::CharacterReader;
use encoding_rs::{Decoder, DecoderResult, Encoder, EncoderResult, Encoding, UTF_8};
use oxiio_core::{BufferedIo, Mode, OxiIoError, Outcome, Result, Source};
use std::fmt;
use tracing::{debug, trace};

/// Minimum capacity of the character buffer (128 KiB).
pub const MIN_CHARACTER_BUFFER_SIZE: usize = 128 * 1024;

/// Free space a refill needs to guarantee progress.
const MIN_REFILL_SPACE: usize = 16;

/// Number of consumed source bytes remembered for error reports.
const HISTORY_LEN: usize = 16;

/// Size of the UTF-8 staging area used before re-encoding.
const STAGE_SIZE: usize = 8 * 1024;

/// Character reader converting between encodings.
pub struct ConverterReader {
    external: &'static Encoding,
    internal: &'static Encoding,
    decoder: Decoder,
    encoder: Option<Encoder>,
    buf: Box<[u8]>,
    start: usize,
    end: usize,
    staged: String,
    scratch: Vec<u8>,
    history: Vec<u8>,
    held: Vec<u8>,
    deferred: Option<OxiIoError>,
    finished: bool,
}

impl fmt::Debug for ConverterReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterReader")
            .field("external", &self.external.name())
            .field("internal", &self.internal.name())
            .field("capacity", &self.buf.len())
            .field("start", &self.start)
            .field("end", &self.end)
            .field("staged", &self.staged.len())
            .field("deferred", &self.deferred)
            .field("finished", &self.finished)
            .finish()
    }
}

impl ConverterReader {
    /// Convert from `external` to `internal`.
    pub fn new(external: &'static Encoding, internal: &'static Encoding) -> Result<Self> {
        Self::with_capacity(external, internal, MIN_CHARACTER_BUFFER_SIZE)
    }

    /// Convert with a character buffer of at least `capacity` bytes.
    ///
    /// Capacities below [`MIN_CHARACTER_BUFFER_SIZE`] are raised to it.
    pub fn with_capacity(
        external: &'static Encoding,
        internal: &'static Encoding,
        capacity: usize,
    ) -> Result<Self> {
        if !is_encodable(internal) {
            return Err(OxiIoError::invalid_argument(format!(
                "{} cannot be used as an internal encoding",
                internal.name()
            )));
        }
        debug!(
            external = external.name(),
            internal = internal.name(),
            "creating converter"
        );
        Ok(Self {
            external,
            internal,
            decoder: external.new_decoder_without_bom_handling(),
            encoder: (internal != UTF_8).then(|| internal.new_encoder()),
            buf: vec![0; capacity.max(MIN_CHARACTER_BUFFER_SIZE)].into_boxed_slice(),
            start: 0,
            end: 0,
            staged: String::new(),
            scratch: Vec::new(),
            history: Vec::with_capacity(HISTORY_LEN),
            held: Vec::new(),
            deferred: None,
            finished: false,
        })
    }

    /// Source-side encoding.
    pub fn external(&self) -> &'static Encoding {
        self.external
    }

    /// Content encoding.
    pub fn internal(&self) -> &'static Encoding {
        self.internal
    }

    /// Capacity of the character buffer.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Converted bytes not yet consumed.
    pub fn pending_len(&self) -> usize {
        self.end - self.start
    }

    /// Check whether the source is exhausted and every converted byte and
    /// deferred failure has been delivered.
    pub fn is_drained(&self) -> bool {
        self.finished && self.start == self.end && self.staged.is_empty() && self.deferred.is_none()
    }

    /// Copy the converter for a duplicated pipeline.
    ///
    /// Converted content is copied. The new decoder is fed the bytes of an
    /// unfinished character so both copies complete it. A deferred failure
    /// stays with the original.
    pub fn duplicate(&self) -> Self {
        let mut decoder = self.external.new_decoder_without_bom_handling();
        let mut sink = [0u8; 32];
        let (_result, _read, _written) =
            decoder.decode_to_utf8_without_replacement(&self.held, &mut sink, false);
        Self {
            external: self.external,
            internal: self.internal,
            decoder,
            encoder: (self.internal != UTF_8).then(|| self.internal.new_encoder()),
            buf: self.buf.clone(),
            start: self.start,
            end: self.end,
            staged: self.staged.clone(),
            scratch: Vec::new(),
            history: self.history.clone(),
            held: self.held.clone(),
            deferred: None,
            finished: self.finished,
        }
    }

    /// Insert `bytes` in front of the content; the caller checked room.
    fn push_front(&mut self, bytes: &[u8]) {
        let len = bytes.len();
        if len > self.start {
            let pending = self.pending_len();
            let capacity = self.capacity();
            self.buf.copy_within(self.start..self.end, capacity - pending);
            self.start = capacity - pending;
            self.end = capacity;
        }
        self.start -= len;
        self.buf[self.start..self.start + len].copy_from_slice(bytes);
    }

    fn compact(&mut self) {
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
    }

    fn remember(&mut self, consumed: &[u8]) {
        if consumed.len() >= HISTORY_LEN {
            self.history.clear();
            self.history
                .extend_from_slice(&consumed[consumed.len() - HISTORY_LEN..]);
            return;
        }
        let overflow = (self.history.len() + consumed.len()).saturating_sub(HISTORY_LEN);
        self.history.drain(..overflow);
        self.history.extend_from_slice(consumed);
    }

    /// Keep the consumed bytes of a character the decoder has not finished.
    fn track_held(&mut self, consumed: &[u8]) {
        if self.external.is_single_byte() {
            return;
        }
        self.held.extend_from_slice(consumed);
        // A UTF-8 character never spans more than the last four bytes.
        let mut pos = if self.external == UTF_8 {
            self.held.len().saturating_sub(4)
        } else {
            0
        };
        while pos < self.held.len() {
            match char_len(Some(self.external), &self.held[pos..]) {
                CharLen::Complete(n) | CharLen::Invalid(n) => pos += n,
                CharLen::Incomplete => break,
            }
        }
        self.held.drain(..pos);
    }

    /// Bytes of the malformed sequence the decoder just reported.
    fn malformed_bytes(&self, bad: u8, after: u8) -> Vec<u8> {
        let end = self.history.len().saturating_sub(usize::from(after));
        let start = end.saturating_sub(usize::from(bad));
        self.history[start..end].to_vec()
    }

    fn defer_or_fail(&mut self, initial: usize, err: OxiIoError) -> Result<Outcome<usize>> {
        if self.end > initial {
            trace!(error = %err, "deferring conversion failure");
            self.deferred = Some(err);
            Ok(Outcome::Ready(self.end - initial))
        } else {
            Err(err)
        }
    }

    /// Re-encode staged UTF-8 into the character buffer.
    fn encode_staged(&mut self, last: bool) -> Result<usize> {
        let Some(encoder) = self.encoder.as_mut() else {
            return Ok(0);
        };
        if self.staged.is_empty() && !last {
            return Ok(0);
        }
        let (result, read, written) =
            encoder.encode_from_utf8_without_replacement(&self.staged, &mut self.buf[self.end..], last);
        self.staged.drain(..read);
        self.end += written;
        match result {
            EncoderResult::Unmappable(c) => {
                Err(OxiIoError::undefined_conversion(c, self.internal.name()))
            }
            EncoderResult::InputEmpty | EncoderResult::OutputFull => Ok(written),
        }
    }

    /// Decode buffered source bytes; one byte at a time unless `many`.
    fn convert<S: Source>(&mut self, io: &mut BufferedIo<S>, many: bool) -> Result<()> {
        let input = io.peek();
        let src = if many { input } else { &input[..input.len().min(1)] };

        let (result, read, written) = match self.encoder {
            None => self.decoder.decode_to_utf8_without_replacement(
                src,
                &mut self.buf[self.end..],
                false,
            ),
            Some(_) => {
                self.scratch.resize(STAGE_SIZE, 0);
                self.decoder
                    .decode_to_utf8_without_replacement(src, &mut self.scratch, false)
            }
        };
        let consumed = input[..read].to_vec();
        io.skip(read);
        self.remember(&consumed);
        self.track_held(&consumed);
        self.accept_decoded(written)?;

        match result {
            DecoderResult::Malformed(bad, after) => Err(OxiIoError::invalid_byte_sequence(
                self.malformed_bytes(bad, after),
                self.external.name(),
            )),
            DecoderResult::InputEmpty | DecoderResult::OutputFull => Ok(()),
        }
    }

    /// Move freshly decoded output into place.
    fn accept_decoded(&mut self, written: usize) -> Result<()> {
        if self.encoder.is_none() {
            self.end += written;
            return Ok(());
        }
        let text = std::str::from_utf8(&self.scratch[..written])
            .map_err(|_| OxiIoError::unexpected_result("decoder produced invalid UTF-8"))?;
        self.staged.push_str(text);
        self.encode_staged(false).map(|_| ())
    }

    /// Flush the decoder at end of source.
    fn finish(&mut self, initial: usize) -> Result<Outcome<usize>> {
        self.finished = true;
        self.held.clear();
        let (result, _read, written) = match self.encoder {
            None => self
                .decoder
                .decode_to_utf8_without_replacement(&[], &mut self.buf[self.end..], true),
            Some(_) => {
                self.scratch.resize(STAGE_SIZE, 0);
                self.decoder
                    .decode_to_utf8_without_replacement(&[], &mut self.scratch, true)
            }
        };
        let flushed = match self.encoder {
            None => {
                self.end += written;
                Ok(())
            }
            Some(_) => match std::str::from_utf8(&self.scratch[..written]) {
                Ok(text) => {
                    self.staged.push_str(text);
                    self.encode_staged(true).map(|_| ())
                }
                Err(_) => Err(OxiIoError::unexpected_result("decoder produced invalid UTF-8")),
            },
        };
        if let Err(err) = flushed {
            return self.defer_or_fail(initial, err);
        }
        if let DecoderResult::Malformed(bad, after) = result {
            let err = OxiIoError::invalid_byte_sequence(
                self.malformed_bytes(bad, after),
                self.external.name(),
            );
            return self.defer_or_fail(initial, err);
        }
        trace!(flushed = self.end - initial, "converter reached end of source");
        if self.end > initial {
            Ok(Outcome::Ready(self.end - initial))
        } else {
            Ok(Outcome::Eof)
        }
    }
}

impl CharacterReader for ConverterReader {
    fn content<'a, S: Source>(&'a self, _io: &'a BufferedIo<S>) -> &'a [u8] {
        &self.buf[self.start..self.end]
    }

    fn consume<S: Source>(&mut self, _io: &mut BufferedIo<S>, n: usize) -> usize {
        let n = n.min(self.end - self.start);
        self.start += n;
        if self.start == self.end {
            self.start = 0;
            self.end = 0;
        }
        n
    }

    fn refill<S: Source>(
        &mut self,
        io: &mut BufferedIo<S>,
        many: bool,
        mode: Mode,
    ) -> Result<Outcome<usize>> {
        if let Some(err) = self.deferred.take() {
            return Err(err);
        }
        self.compact();
        let space = self.capacity() - self.end;
        if space < MIN_REFILL_SPACE {
            return Err(OxiIoError::insufficient_buffer(MIN_REFILL_SPACE, space));
        }
        let initial = self.end;

        if !self.staged.is_empty() {
            if let Err(err) = self.encode_staged(self.finished) {
                return self.defer_or_fail(initial, err);
            }
            if self.end > initial {
                return Ok(Outcome::Ready(self.end - initial));
            }
        }
        if self.finished {
            return Ok(Outcome::Eof);
        }

        loop {
            if io.read_buffer_empty() {
                match io.refill(mode) {
                    Ok(Outcome::Ready(_)) => {}
                    Ok(Outcome::WouldBlock) => return Ok(Outcome::WouldBlock),
                    Ok(Outcome::Eof) => return self.finish(initial),
                    Err(err) => return self.defer_or_fail(initial, err),
                }
            }
            if let Err(err) = self.convert(io, many) {
                return self.defer_or_fail(initial, err);
            }
            if self.end > initial {
                return Ok(Outcome::Ready(self.end - initial));
            }
            if self.end == self.capacity() {
                return Err(OxiIoError::insufficient_buffer(MIN_REFILL_SPACE, 0));
            }
        }
    }

    fn unread<S: Source>(&mut self, _io: &mut BufferedIo<S>, bytes: &[u8]) -> Result<()> {
        let len = bytes.len();
        if len == 0 {
            return Ok(());
        }
        let available = self.capacity() - self.pending_len();
        if len > available {
            return Err(OxiIoError::insufficient_buffer(len, available));
        }
        self.push_front(bytes);
        Ok(())
    }

    fn restore<S: Source>(&mut self, _io: &mut BufferedIo<S>, bytes: &[u8]) {
        let pending = self.pending_len();
        let needed = pending + bytes.len();
        if needed > self.capacity() {
            let mut grown = vec![0; needed].into_boxed_slice();
            grown[needed - pending..].copy_from_slice(&self.buf[self.start..self.end]);
            debug!(from = self.capacity(), to = needed, "growing character buffer");
            self.buf = grown;
            self.start = needed - pending;
            self.end = needed;
        }
        self.push_front(bytes);
    }

    fn clear<S: Source>(&mut self, _io: &mut BufferedIo<S>) {
        self.decoder = self.external.new_decoder_without_bom_handling();
        self.encoder = (self.internal != UTF_8).then(|| self.internal.new_encoder());
        self.start = 0;
        self.end = 0;
        self.staged.clear();
        self.history.clear();
        self.held.clear();
        self.deferred = None;
        self.finished = false;
    }

    fn is_empty<S: Source>(&self, _io: &BufferedIo<S>) -> bool {
        self.start == self.end
    }

    fn encoding(&self) -> Option<&'static Encoding> {
        Some(self.internal)
    }
}
