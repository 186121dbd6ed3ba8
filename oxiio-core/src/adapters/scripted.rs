//! A source that replays a script of signals.
//!
//! Used to drive the blocking and buffering layers through would-block,
//! interrupted and contract-violating sequences deterministically.

use crate::error::{OxiIoError, Result};
use crate::signal::{Interest, Signal};
use crate::source::Source;
use std::collections::VecDeque;
use std::time::Duration;

/// One scripted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Read: deliver these bytes (a partial delivery keeps the remainder).
    Data(Vec<u8>),
    /// Write: accept at most this many bytes.
    Accept(usize),
    /// Answer [`Signal::WouldBlock`].
    WouldBlock,
    /// Answer [`Signal::Interrupted`].
    Interrupted,
    /// Answer [`Signal::Eof`].
    Eof,
    /// Answer `Ready(n)` regardless of the buffer size.
    Lie(usize),
}

/// Scripted source with call counters.
///
/// Reads answer from the read script and report end of stream once it runs
/// out. Writes answer from the write script and accept everything once it
/// runs out; accepted bytes are recorded.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    reads: VecDeque<Step>,
    writes: VecDeque<Step>,
    written: Vec<u8>,
    readable: bool,
    writable: bool,
    closed: bool,
    wait_result: bool,
    close_after_waits: Option<usize>,
    waits: usize,
    read_calls: usize,
    write_calls: usize,
}

impl ScriptedSource {
    /// Create a readable and writable source.
    pub fn new(reads: Vec<Step>, writes: Vec<Step>) -> Self {
        Self {
            reads: reads.into(),
            writes: writes.into(),
            readable: true,
            writable: true,
            wait_result: true,
            ..Self::default()
        }
    }

    /// Create a read-only source.
    pub fn reader(reads: Vec<Step>) -> Self {
        Self {
            writable: false,
            ..Self::new(reads, Vec::new())
        }
    }

    /// Create a write-only source.
    pub fn writer(writes: Vec<Step>) -> Self {
        Self {
            readable: false,
            ..Self::new(Vec::new(), writes)
        }
    }

    /// Make every `wait` answer `result`.
    pub fn with_wait_result(mut self, result: bool) -> Self {
        self.wait_result = result;
        self
    }

    /// Close the source after `waits` calls to `wait`.
    pub fn with_close_after_waits(mut self, waits: usize) -> Self {
        self.close_after_waits = Some(waits);
        self
    }

    /// Number of `wait` calls so far.
    pub fn waits(&self) -> usize {
        self.waits
    }

    /// Number of `read` calls so far.
    pub fn read_calls(&self) -> usize {
        self.read_calls
    }

    /// Number of `write` calls so far.
    pub fn write_calls(&self) -> usize {
        self.write_calls
    }

    /// Bytes accepted by `write` so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }
}

impl Source for ScriptedSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<Signal<usize>> {
        self.ensure_open()?;
        self.read_calls += 1;
        match self.reads.pop_front() {
            None | Some(Step::Eof) => Ok(Signal::Eof),
            Some(Step::WouldBlock) => Ok(Signal::WouldBlock),
            Some(Step::Interrupted) => Ok(Signal::Interrupted),
            Some(Step::Lie(n)) => Ok(Signal::Ready(n)),
            Some(Step::Accept(_)) => Err(OxiIoError::invalid_argument("accept step in read script")),
            Some(Step::Data(data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    self.reads.push_front(Step::Data(data[n..].to_vec()));
                }
                Ok(Signal::Ready(n))
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<Signal<usize>> {
        self.ensure_open()?;
        self.write_calls += 1;
        let accepted = match self.writes.pop_front() {
            None => buf.len(),
            Some(Step::Accept(n)) => n.min(buf.len()),
            Some(Step::WouldBlock) => return Ok(Signal::WouldBlock),
            Some(Step::Interrupted) => return Ok(Signal::Interrupted),
            Some(Step::Eof) => return Ok(Signal::Eof),
            Some(Step::Lie(n)) => return Ok(Signal::Ready(n)),
            Some(Step::Data(_)) => {
                return Err(OxiIoError::invalid_argument("data step in write script"));
            }
        };
        self.written.extend_from_slice(&buf[..accepted]);
        Ok(Signal::Ready(accepted))
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

    fn wait(&mut self, _interest: Interest, _timeout: Option<Duration>) -> Result<bool> {
        self.ensure_open()?;
        self.waits += 1;
        if self.close_after_waits.is_some_and(|limit| self.waits >= limit) {
            self.closed = true;
        }
        Ok(self.wait_result)
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
    fn test_partial_data_step_keeps_remainder() {
        let mut source = ScriptedSource::reader(vec![Step::Data(b"abcdef".to_vec())]);
        let mut buf = [0u8; 4];
        assert_eq!(source.read(&mut buf).unwrap(), Signal::Ready(4));
        assert_eq!(source.read(&mut buf).unwrap(), Signal::Ready(2));
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(source.read(&mut buf).unwrap(), Signal::Eof);
        assert_eq!(source.read_calls(), 3);
    }

    #[test]
    fn test_write_script() {
        let mut source = ScriptedSource::writer(vec![Step::Accept(2), Step::WouldBlock]);
        assert_eq!(source.write(b"abcd").unwrap(), Signal::Ready(2));
        assert_eq!(source.write(b"cd").unwrap(), Signal::WouldBlock);
        assert_eq!(source.write(b"cd").unwrap(), Signal::Ready(2));
        assert_eq!(source.written(), b"abcd");
    }
}
