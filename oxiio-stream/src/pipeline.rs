//! Composition of the layers around one source.
//!
//! ```text
//! Pipeline
//! ├── CharacterIo          (passthrough | converter)
//! └── BufferedIo           (read region, write region)
//!     └── BlockingIo       (wait / retry)
//!         └── Source
//! ```
//!
//! The byte buffer owns the source by value, so no second buffer can ever
//! sit over the same source. The character layer is handed the byte buffer
//! per call instead of holding on to it, which keeps duplicated pipelines
//! fully independent.

use crate::options::StreamOptions;
use oxiio_core::{BlockingIo, BufferedIo, Mode, Result, Source};
use oxiio_text::{CharacterIo, Newline, TextReader};
use tracing::debug;

/// The layers of one stream.
#[derive(Debug)]
pub struct Pipeline<S> {
    buffered: BufferedIo<S>,
    character: CharacterIo,
}

impl<S: Source> Pipeline<S> {
    /// Build the layers over `source`.
    pub fn new(source: S, options: &StreamOptions) -> Result<Self> {
        let buffered = BufferedIo::with_capacity(source, options.buffer_size)?;
        let character =
            CharacterIo::select(options.external_encoding, options.internal_encoding)?;
        Ok(Self {
            buffered,
            character,
        })
    }

    /// Byte buffer facet.
    pub fn buffered(&self) -> &BufferedIo<S> {
        &self.buffered
    }

    /// Byte buffer facet, mutably.
    pub fn buffered_mut(&mut self) -> &mut BufferedIo<S> {
        &mut self.buffered
    }

    /// Blocking emulation facet.
    pub fn blocking(&self) -> &BlockingIo<S> {
        self.buffered.get_ref()
    }

    /// Blocking emulation facet, mutably.
    ///
    /// Transfers made through it bypass both buffers.
    pub fn blocking_mut(&mut self) -> &mut BlockingIo<S> {
        self.buffered.get_mut()
    }

    /// Character facet.
    pub fn character(&self) -> &CharacterIo {
        &self.character
    }

    /// Both the character layer and the byte buffer it reads from.
    pub fn parts_mut(&mut self) -> (&mut CharacterIo, &mut BufferedIo<S>) {
        (&mut self.character, &mut self.buffered)
    }

    /// Replace the character layer.
    pub fn set_character(&mut self, character: CharacterIo) {
        self.character = character;
    }

    /// The source.
    pub fn source(&self) -> &S {
        self.buffered.source()
    }

    /// The source, mutably.
    pub fn source_mut(&mut self) -> &mut S {
        self.buffered.source_mut()
    }

    /// Borrow a line and character reader for one operation.
    pub fn text(&mut self, newline: Newline, mode: Mode) -> TextReader<'_, S> {
        TextReader::new(&mut self.character, &mut self.buffered, newline, mode)
    }

    /// Flush pending writes and close the source.
    pub fn close(&mut self) -> Result<()> {
        self.buffered.close()
    }

    /// Duplicate over a duplicated source.
    ///
    /// Pending writes are flushed first; both buffers are deep-copied.
    pub fn try_clone(&mut self) -> Result<Self> {
        let buffered = self.buffered.try_clone()?;
        let character = self.character.duplicate();
        debug!(converter = character.is_converter(), "duplicated pipeline");
        Ok(Self {
            buffered,
            character,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxiio_core::Outcome;
    use oxiio_core::adapters::MemorySource;
    use oxiio_text::{CharacterReader, LineOptions};

    #[test]
    fn test_facets_share_one_source() {
        let mut pipeline =
            Pipeline::new(MemorySource::new(b"line\n".to_vec()), &StreamOptions::TEXT).unwrap();
        assert!(!pipeline.character().is_converter());
        assert_eq!(pipeline.source().contents(), b"line\n");
        assert_eq!(pipeline.blocking().get_ref().position(), 0);

        let line = pipeline
            .text(Newline::None, Mode::Blocking)
            .read_line(&LineOptions::DEFAULT)
            .unwrap();
        assert_eq!(line, Outcome::Ready(b"line\n".to_vec()));
        assert_eq!(pipeline.source().position(), 5);
    }

    #[test]
    fn test_clone_does_not_alias_buffers() {
        let options = StreamOptions::TEXT.with_encoding(Some(encoding_rs::UTF_8), Some(encoding_rs::UTF_8));
        let mut pipeline = Pipeline::new(MemorySource::reader(b"abc".to_vec()), &options).unwrap();
        {
            let (chars, io) = pipeline.parts_mut();
            chars.refill(io, true, Mode::Blocking).unwrap();
        }
        let mut clone = pipeline.try_clone().unwrap();

        let (chars, io) = clone.parts_mut();
        let n = chars.content(io).len();
        chars.consume(io, n);
        assert!(chars.is_empty(io));

        let (chars, io) = pipeline.parts_mut();
        assert_eq!(chars.content(io), b"abc");
    }
}
