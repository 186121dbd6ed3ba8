//! In-memory source.

use crate::error::{OxiIoError, Result};
use crate::signal::{Interest, Signal, Whence};
use crate::source::{Source, SourceKind, SourceStat};
use std::time::Duration;

/// A source backed by a growable byte vector.
///
/// Reads and writes share one position, like a file. An optional chunk size
/// caps every transfer so callers can exercise short-read handling.
///
/// # Example
///
/// ```
/// use oxiio_core::adapters::MemorySource;
/// use oxiio_core::signal::Signal;
/// use oxiio_core::source::Source;
///
/// let mut source = MemorySource::new(Vec::new());
/// assert_eq!(source.write(b"hi").unwrap(), Signal::Ready(2));
/// assert_eq!(source.contents(), b"hi");
/// ```
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Vec<u8>,
    position: usize,
    readable: bool,
    writable: bool,
    closed: bool,
    chunk_size: Option<usize>,
}

impl MemorySource {
    /// Create a readable and writable source over `data`.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            position: 0,
            readable: true,
            writable: true,
            closed: false,
            chunk_size: None,
        }
    }

    /// Create a read-only source over `data`.
    pub fn reader(data: Vec<u8>) -> Self {
        Self {
            writable: false,
            ..Self::new(data)
        }
    }

    /// Create an empty write-only source.
    pub fn writer() -> Self {
        Self {
            readable: false,
            ..Self::new(Vec::new())
        }
    }

    /// Cap every read and write at `chunk_size` bytes.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size.max(1));
        self
    }

    /// The full contents of the source.
    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    /// The current position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Consume the source and return its contents.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    fn cap(&self, len: usize) -> usize {
        match self.chunk_size {
            Some(chunk) => len.min(chunk),
            None => len,
        }
    }
}

impl Source for MemorySource {
    fn read(&mut self, buf: &mut [u8]) -> Result<Signal<usize>> {
        self.ensure_open()?;
        if !self.readable {
            return Err(OxiIoError::NotReadable);
        }
        if self.position >= self.data.len() {
            return Ok(Signal::Eof);
        }
        let n = self.cap(buf.len()).min(self.data.len() - self.position);
        buf[..n].copy_from_slice(&self.data[self.position..self.position + n]);
        self.position += n;
        Ok(Signal::Ready(n))
    }

    fn write(&mut self, buf: &[u8]) -> Result<Signal<usize>> {
        self.ensure_open()?;
        if !self.writable {
            return Err(OxiIoError::NotWritable);
        }
        let n = self.cap(buf.len());
        let end = self.position + n;
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[self.position..end].copy_from_slice(&buf[..n]);
        self.position = end;
        Ok(Signal::Ready(n))
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn is_readable(&self) -> bool {
        self.readable
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        self.ensure_open()?;
        let base = match whence {
            Whence::Set => 0,
            Whence::Cur => self.position as i64,
            Whence::End => self.data.len() as i64,
        };
        let target = base
            .checked_add(offset)
            .filter(|t| *t >= 0)
            .ok_or_else(|| OxiIoError::invalid_argument("seek before start of source"))?;
        self.position = target as usize;
        Ok(target as u64)
    }

    fn stat(&self) -> Result<SourceStat> {
        self.ensure_open()?;
        Ok(SourceStat {
            kind: SourceKind::Memory,
            size: Some(self.data.len() as u64),
        })
    }

    fn wait(&mut self, _interest: Interest, _timeout: Option<Duration>) -> Result<bool> {
        self.ensure_open()?;
        Ok(true)
    }

    fn duplicate(&self) -> Result<Self> {
        self.ensure_open()?;
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_seek() {
        let mut source = MemorySource::new(Vec::new());
        assert_eq!(source.write(b"hello").unwrap(), Signal::Ready(5));
        assert_eq!(source.seek(1, Whence::Set).unwrap(), 1);

        let mut buf = [0u8; 3];
        assert_eq!(source.read(&mut buf).unwrap(), Signal::Ready(3));
        assert_eq!(&buf, b"ell");
        assert_eq!(source.seek(-1, Whence::End).unwrap(), 4);
        assert_eq!(source.read(&mut buf).unwrap(), Signal::Ready(1));
        assert_eq!(source.read(&mut buf).unwrap(), Signal::Eof);
    }

    #[test]
    fn test_chunked_transfers() {
        let mut source = MemorySource::reader(b"abcdef".to_vec()).with_chunk_size(2);
        let mut buf = [0u8; 6];
        assert_eq!(source.read(&mut buf).unwrap(), Signal::Ready(2));
        assert_eq!(&buf[..2], b"ab");
    }

    #[test]
    fn test_direction_flags() {
        let mut reader = MemorySource::reader(b"x".to_vec());
        assert!(matches!(reader.write(b"y"), Err(OxiIoError::NotWritable)));

        let mut writer = MemorySource::writer();
        let mut buf = [0u8; 1];
        assert!(matches!(writer.read(&mut buf), Err(OxiIoError::NotReadable)));
    }

    #[test]
    fn test_negative_seek_rejected() {
        let mut source = MemorySource::new(b"abc".to_vec());
        assert!(source.seek(-1, Whence::Set).is_err());
        assert_eq!(source.position(), 0);
    }

    #[test]
    fn test_duplicate_is_independent() {
        let mut source = MemorySource::reader(b"abc".to_vec());
        let mut buf = [0u8; 1];
        source.read(&mut buf).unwrap();

        let mut dup = source.duplicate().unwrap();
        dup.read(&mut buf).unwrap();
        assert_eq!(dup.position(), 2);
        assert_eq!(source.position(), 1);
    }
}
