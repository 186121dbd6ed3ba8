//! The character reading interface shared by both strategies.

use encoding_rs::Encoding;
use oxiio_core::{BufferedIo, Mode, Outcome, Result, Source};

/// Character-level view over a byte buffer.
///
/// Implementations never keep a reference to the byte buffer: every call
/// receives the [`BufferedIo`] of the pipeline that owns both layers.
pub trait CharacterReader {
    /// Bytes ready to be consumed, in the [`encoding`](Self::encoding).
    fn content<'a, S: Source>(&'a self, io: &'a BufferedIo<S>) -> &'a [u8];

    /// Consume up to `n` bytes of content and return how many were consumed.
    fn consume<S: Source>(&mut self, io: &mut BufferedIo<S>, n: usize) -> usize;

    /// Produce more content.
    ///
    /// With `many` set, as much as fits is produced; otherwise at most one
    /// character is added.
    fn refill<S: Source>(
        &mut self,
        io: &mut BufferedIo<S>,
        many: bool,
        mode: Mode,
    ) -> Result<Outcome<usize>>;

    /// Push bytes back in front of the content.
    fn unread<S: Source>(&mut self, io: &mut BufferedIo<S>, bytes: &[u8]) -> Result<()>;

    /// Put back content a reader consumed but could not use yet, growing
    /// storage when it does not fit.
    fn restore<S: Source>(&mut self, io: &mut BufferedIo<S>, bytes: &[u8]);

    /// Drop conversion state and buffered content owned by this layer.
    fn clear<S: Source>(&mut self, io: &mut BufferedIo<S>);

    /// Check whether no content is buffered.
    fn is_empty<S: Source>(&self, io: &BufferedIo<S>) -> bool {
        self.content(io).is_empty()
    }

    /// Encoding of the content; `None` for binary.
    fn encoding(&self) -> Option<&'static Encoding>;
}
