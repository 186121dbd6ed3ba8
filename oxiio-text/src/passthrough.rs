//! Passthrough strategy: the byte buffer is the character buffer.

use crate::reader::CharacterReader;
use encoding_rs::Encoding;
use oxiio_core::{BufferedIo, Mode, Outcome, Result, Source};

/// Character reader that serves bytes straight from the byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassthroughReader {
    encoding: Option<&'static Encoding>,
}

impl PassthroughReader {
    /// Serve content tagged with `encoding`.
    pub fn new(encoding: Option<&'static Encoding>) -> Self {
        Self { encoding }
    }

    /// Retag the content.
    pub fn set_encoding(&mut self, encoding: Option<&'static Encoding>) {
        self.encoding = encoding;
    }
}

impl CharacterReader for PassthroughReader {
    fn content<'a, S: Source>(&'a self, io: &'a BufferedIo<S>) -> &'a [u8] {
        io.peek()
    }

    fn consume<S: Source>(&mut self, io: &mut BufferedIo<S>, n: usize) -> usize {
        io.skip(n)
    }

    fn refill<S: Source>(
        &mut self,
        io: &mut BufferedIo<S>,
        _many: bool,
        mode: Mode,
    ) -> Result<Outcome<usize>> {
        io.refill(mode)
    }

    fn unread<S: Source>(&mut self, io: &mut BufferedIo<S>, bytes: &[u8]) -> Result<()> {
        io.unread(bytes)
    }

    fn restore<S: Source>(&mut self, io: &mut BufferedIo<S>, bytes: &[u8]) {
        io.restore(bytes);
    }

    fn clear<S: Source>(&mut self, _io: &mut BufferedIo<S>) {}

    fn is_empty<S: Source>(&self, io: &BufferedIo<S>) -> bool {
        io.read_buffer_empty()
    }

    fn encoding(&self) -> Option<&'static Encoding> {
        self.encoding
    }
}
