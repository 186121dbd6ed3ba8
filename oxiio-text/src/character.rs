//! Strategy selection for the character layer.

use crate::converter::ConverterReader;
use crate::encoding;
use crate::passthrough::PassthroughReader;
use crate::reader::CharacterReader;
use encoding_rs::Encoding;
use oxiio_core::{BufferedIo, Mode, OxiIoError, Outcome, Result, Source};

/// The character layer of a pipeline: one of the two strategies.
#[derive(Debug)]
pub enum CharacterIo {
    /// Bytes are served unconverted.
    Passthrough(PassthroughReader),
    /// Bytes are decoded into a separate character buffer.
    Converter(Box<ConverterReader>),
}

impl Default for CharacterIo {
    fn default() -> Self {
        Self::Passthrough(PassthroughReader::new(None))
    }
}

impl CharacterIo {
    /// Pick a strategy for the given encodings.
    ///
    /// A converter is used whenever an internal encoding is requested, even
    /// when it equals the external one, so that input is validated.
    pub fn select(
        external: Option<&'static Encoding>,
        internal: Option<&'static Encoding>,
    ) -> Result<Self> {
        match (external, internal) {
            (_, None) => Ok(Self::Passthrough(PassthroughReader::new(external))),
            (Some(external), Some(internal)) => Ok(Self::Converter(Box::new(
                ConverterReader::new(external, internal)?,
            ))),
            (None, Some(internal)) => Err(OxiIoError::invalid_argument(format!(
                "cannot convert binary data to {}",
                internal.name()
            ))),
        }
    }

    /// Check whether the converter strategy is active.
    pub fn is_converter(&self) -> bool {
        matches!(self, Self::Converter(_))
    }

    /// Encoding of the bytes read from the source.
    pub fn external_encoding(&self) -> Option<&'static Encoding> {
        match self {
            Self::Passthrough(reader) => reader.encoding(),
            Self::Converter(conv) => Some(conv.external()),
        }
    }

    /// Name of the content encoding.
    pub fn encoding_name(&self) -> &'static str {
        encoding::name(self.encoding())
    }

    /// Converted bytes held outside the byte buffer.
    pub fn pending_len(&self) -> usize {
        match self {
            Self::Passthrough(_) => 0,
            Self::Converter(conv) => conv.pending_len(),
        }
    }

    /// Copy the layer for a duplicated pipeline.
    pub fn duplicate(&self) -> Self {
        match self {
            Self::Passthrough(reader) => Self::Passthrough(*reader),
            Self::Converter(conv) => Self::Converter(Box::new(conv.duplicate())),
        }
    }
}

impl CharacterReader for CharacterIo {
    fn content<'a, S: Source>(&'a self, io: &'a BufferedIo<S>) -> &'a [u8] {
        match self {
            Self::Passthrough(reader) => reader.content(io),
            Self::Converter(conv) => conv.content(io),
        }
    }

    fn consume<S: Source>(&mut self, io: &mut BufferedIo<S>, n: usize) -> usize {
        match self {
            Self::Passthrough(reader) => reader.consume(io, n),
            Self::Converter(conv) => conv.consume(io, n),
        }
    }

    fn refill<S: Source>(
        &mut self,
        io: &mut BufferedIo<S>,
        many: bool,
        mode: Mode,
    ) -> Result<Outcome<usize>> {
        match self {
            Self::Passthrough(reader) => reader.refill(io, many, mode),
            Self::Converter(conv) => conv.refill(io, many, mode),
        }
    }

    fn unread<S: Source>(&mut self, io: &mut BufferedIo<S>, bytes: &[u8]) -> Result<()> {
        match self {
            Self::Passthrough(reader) => reader.unread(io, bytes),
            Self::Converter(conv) => conv.unread(io, bytes),
        }
    }

    fn restore<S: Source>(&mut self, io: &mut BufferedIo<S>, bytes: &[u8]) {
        match self {
            Self::Passthrough(reader) => reader.restore(io, bytes),
            Self::Converter(conv) => conv.restore(io, bytes),
        }
    }

    fn clear<S: Source>(&mut self, io: &mut BufferedIo<S>) {
        match self {
            Self::Passthrough(reader) => reader.clear(io),
            Self::Converter(conv) => conv.clear(io),
        }
    }

    fn is_empty<S: Source>(&self, io: &BufferedIo<S>) -> bool {
        match self {
            Self::Passthrough(reader) => reader.is_empty(io),
            Self::Converter(conv) => conv.is_empty(io),
        }
    }

    fn encoding(&self) -> Option<&'static Encoding> {
        match self {
            Self::Passthrough(reader) => reader.encoding(),
            Self::Converter(conv) => conv.encoding(),
        }
    }
}
