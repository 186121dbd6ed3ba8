//! A source joining a read-side source and a write-side source.

use crate::error::Result;
use crate::signal::{Interest, Signal};
use crate::source::Source;
use std::time::Duration;

/// Duplexed source: reads go to `reader`, writes go to `writer`.
///
/// Each half can be closed on its own; the duplex counts as closed once both
/// halves are. Duplexes are not seekable.
#[derive(Debug)]
pub struct DuplexSource<R, W> {
    reader: R,
    writer: W,
}

impl<R: Source, W: Source> DuplexSource<R, W> {
    /// Join two sources.
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// The read half.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// The write half.
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Report which halves are still open as `(read, write)`.
    pub fn open_halves(&self) -> (bool, bool) {
        (!self.reader.is_closed(), !self.writer.is_closed())
    }

    /// Close only the read half.
    pub fn close_read(&mut self) -> Result<()> {
        self.reader.close()
    }

    /// Close only the write half.
    pub fn close_write(&mut self) -> Result<()> {
        self.writer.close()
    }
}

impl<R: Source, W: Source> Source for DuplexSource<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> Result<Signal<usize>> {
        self.ensure_open()?;
        self.reader.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<Signal<usize>> {
        self.ensure_open()?;
        self.writer.write(buf)
    }

    fn close(&mut self) -> Result<()> {
        let read_result = if self.reader.is_closed() {
            Ok(())
        } else {
            self.reader.close()
        };
        let write_result = if self.writer.is_closed() {
            Ok(())
        } else {
            self.writer.close()
        };
        read_result.and(write_result)
    }

    fn is_closed(&self) -> bool {
        self.reader.is_closed() && self.writer.is_closed()
    }

    fn is_readable(&self) -> bool {
        !self.reader.is_closed() && self.reader.is_readable()
    }

    fn is_writable(&self) -> bool {
        !self.writer.is_closed() && self.writer.is_writable()
    }

    fn wait(&mut self, interest: Interest, timeout: Option<Duration>) -> Result<bool> {
        self.ensure_open()?;
        match interest {
            Interest::Readable => self.reader.wait(interest, timeout),
            Interest::Writable => self.writer.wait(interest, timeout),
        }
    }

    fn is_ready(&self) -> Result<bool> {
        self.ensure_open()?;
        self.reader.is_ready()
    }

    fn is_tty(&self) -> Result<bool> {
        self.ensure_open()?;
        self.reader.is_tty()
    }

    fn set_nonblocking(&mut self, nonblocking: bool) -> Result<()> {
        self.ensure_open()?;
        self.reader.set_nonblocking(nonblocking)?;
        self.writer.set_nonblocking(nonblocking)
    }

    fn duplicate(&self) -> Result<Self> {
        self.ensure_open()?;
        Ok(Self::new(self.reader.duplicate()?, self.writer.duplicate()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemorySource;
    use crate::error::OxiIoError;
    use crate::signal::Whence;

    #[test]
    fn test_duplex_routes_directions() {
        let mut duplex = DuplexSource::new(MemorySource::reader(b"in".to_vec()), MemorySource::writer());
        let mut buf = [0u8; 4];
        assert_eq!(duplex.read(&mut buf).unwrap(), Signal::Ready(2));
        assert_eq!(duplex.write(b"out").unwrap(), Signal::Ready(3));
        assert_eq!(duplex.writer().contents(), b"out");
        assert!(matches!(duplex.seek(0, Whence::Set), Err(OxiIoError::IllegalSeek)));
    }

    #[test]
    fn test_duplex_half_close() {
        let mut duplex = DuplexSource::new(MemorySource::reader(b"in".to_vec()), MemorySource::writer());
        duplex.close_read().unwrap();
        assert!(!duplex.is_readable());
        assert!(duplex.is_writable());
        assert!(!duplex.is_closed());
        assert_eq!(duplex.open_halves(), (false, true));

        duplex.close().unwrap();
        assert!(duplex.is_closed());
    }
}
