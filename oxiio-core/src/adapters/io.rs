//! Sources over arbitrary `std::io` readers and writers.
//!
//! Neither wrapper knows how to wait on its object natively, so `wait` polls:
//! it sleeps for the poll interval (bounded by the caller's timeout) and
//! reports readiness, leaving the retry to the blocking layer.

use crate::error::Result;
use crate::signal::{Interest, Signal};
use crate::source::Source;
use std::io::{Read, Write};
use std::time::Duration;

/// Default sleep between retries of a would-block `std::io` object.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

fn poll_wait(interval: Duration, timeout: Option<Duration>) -> bool {
    match timeout {
        Some(timeout) if timeout < interval => {
            std::thread::sleep(timeout);
            false
        }
        _ => {
            std::thread::sleep(interval);
            true
        }
    }
}

/// Read-only source over any [`Read`].
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: Option<R>,
    poll_interval: Duration,
}

impl<R: Read> ReaderSource<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the sleep used by `wait`.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Consume the source and return the reader, unless closed.
    pub fn into_inner(self) -> Option<R> {
        self.reader
    }
}

impl<R: Read> Source for ReaderSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<Signal<usize>> {
        self.ensure_open()?;
        let requested = buf.len();
        match self.reader.as_mut() {
            Some(reader) => Signal::from_io_read(reader.read(buf), requested),
            None => Err(crate::OxiIoError::Closed),
        }
    }

    fn write(&mut self, _buf: &[u8]) -> Result<Signal<usize>> {
        self.ensure_open()?;
        Err(crate::OxiIoError::NotWritable)
    }

    fn close(&mut self) -> Result<()> {
        self.reader = None;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.reader.is_none()
    }

    fn is_readable(&self) -> bool {
        true
    }

    fn wait(&mut self, _interest: Interest, timeout: Option<Duration>) -> Result<bool> {
        self.ensure_open()?;
        Ok(poll_wait(self.poll_interval, timeout))
    }
}

/// Write-only source over any [`Write`].
///
/// Every accepted write is followed by a flush of the writer so that bytes
/// handed to the source are not held in a second buffer.
#[derive(Debug)]
pub struct WriterSource<W: Write> {
    writer: Option<W>,
    poll_interval: Duration,
}

impl<W: Write> WriterSource<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the sleep used by `wait`.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Get a reference to the writer, unless closed.
    pub fn get_ref(&self) -> Option<&W> {
        self.writer.as_ref()
    }
}

impl<W: Write> Source for WriterSource<W> {
    fn read(&mut self, _buf: &mut [u8]) -> Result<Signal<usize>> {
        self.ensure_open()?;
        Err(crate::OxiIoError::NotReadable)
    }

    fn write(&mut self, buf: &[u8]) -> Result<Signal<usize>> {
        let writer = self.writer.as_mut().ok_or(crate::OxiIoError::Closed)?;
        let signal = Signal::from_io_write(writer.write(buf))?;
        if let Signal::Ready(n) = signal {
            if n > 0 {
                writer.flush()?;
            }
        }
        Ok(signal)
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn wait(&mut self, _interest: Interest, timeout: Option<Duration>) -> Result<bool> {
        self.ensure_open()?;
        Ok(poll_wait(self.poll_interval, timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OxiIoError;
    use std::io::Cursor;

    #[test]
    fn test_reader_source() {
        let mut source = ReaderSource::new(Cursor::new(b"abc".to_vec()));
        let mut buf = [0u8; 8];
        assert_eq!(source.read(&mut buf).unwrap(), Signal::Ready(3));
        assert_eq!(source.read(&mut buf).unwrap(), Signal::Eof);
        assert!(matches!(source.write(b"x"), Err(OxiIoError::NotWritable)));
        source.close().unwrap();
        assert!(matches!(source.read(&mut buf), Err(OxiIoError::Closed)));
    }

    #[test]
    fn test_writer_source() {
        let mut source = WriterSource::new(Vec::new());
        assert_eq!(source.write(b"abc").unwrap(), Signal::Ready(3));
        assert_eq!(source.get_ref().unwrap(), b"abc");
        assert!(source.wait(Interest::Writable, None).unwrap());
    }

    #[test]
    fn test_poll_wait_timeout() {
        assert!(!poll_wait(Duration::from_millis(5), Some(Duration::ZERO)));
        assert!(poll_wait(Duration::ZERO, None));
    }
}
