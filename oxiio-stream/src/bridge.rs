//! `std::io` trait implementations for [`Stream`].
//!
//! `Read`, `Write` and `Seek` use the byte operations, and `Read` returns
//! short reads as the source delivers them. `BufRead` reads
//! through the character layer, so `lines()` and `read_line` observe
//! conversion and universal newlines except for CR normalization, which
//! needs lookahead `fill_buf` cannot express.

use crate::stream::Stream;
use oxiio_core::{Mode, OxiIoError, Outcome, Source, Whence};
use oxiio_text::CharacterReader;
use std::io;

impl<S: Source> io::Read for Stream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.read_partial(buf.len()) {
            Ok(bytes) => {
                buf[..bytes.len()].copy_from_slice(&bytes);
                Ok(bytes.len())
            }
            Err(OxiIoError::EndOfStream) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl<S: Source> io::BufRead for Stream<S> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.ensure_readable()?;
        let (chars, io) = self.pipeline_mut().parts_mut();
        if chars.is_empty(io) {
            match chars.refill(io, true, Mode::Blocking)? {
                Outcome::Ready(_) | Outcome::Eof => {}
                Outcome::WouldBlock => return Err(io::ErrorKind::WouldBlock.into()),
            }
        }
        let (chars, io) = self.pipeline_mut().parts_mut();
        Ok(chars.content(io))
    }

    fn consume(&mut self, amt: usize) {
        let (chars, io) = self.pipeline_mut().parts_mut();
        chars.consume(io, amt);
    }
}

impl<S: Source> io::Write for Stream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_partial(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(Stream::flush(self)?)
    }
}

impl<S: Source> io::Seek for Stream<S> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let (offset, whence) = Whence::split_seek_from(pos);
        Ok(Stream::seek(self, offset, whence)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Stream, StreamOptions};
    use oxiio_core::adapters::{MemorySource, ScriptedSource, Step};
    use std::io::{BufRead, Read, Seek, SeekFrom, Write};

    #[test]
    fn test_read_and_seek() {
        let mut stream = Stream::open(MemorySource::reader(b"hello world".to_vec())).unwrap();
        let mut buf = [0u8; 5];
        Read::read_exact(&mut stream, &mut buf).unwrap();
        assert_eq!(&buf, b"hello");
        assert_eq!(Seek::seek(&mut stream, SeekFrom::Current(1)).unwrap(), 6);
        let mut rest = String::new();
        Read::read_to_string(&mut stream, &mut rest).unwrap();
        assert_eq!(rest, "world");
    }

    #[test]
    fn test_read_returns_short_reads() {
        let source = ScriptedSource::reader(vec![
            Step::Data(b"ab".to_vec()),
            Step::Data(b"cd".to_vec()),
        ]);
        let mut stream = Stream::with_options(source, StreamOptions::BINARY).unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(Read::read(&mut stream, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ab");
        assert_eq!(Read::read(&mut stream, &mut buf).unwrap(), 2);
        assert_eq!(Read::read(&mut stream, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_buf_read_converts() {
        let options =
            StreamOptions::TEXT.with_encoding(Some(encoding_rs::SHIFT_JIS), Some(encoding_rs::UTF_8));
        let data = b"\x93\xfa\x96\x7b\n\x8c\xea\n".to_vec();
        let stream = Stream::with_options(MemorySource::reader(data), options).unwrap();
        let lines: Vec<String> = stream.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["日本", "語"]);
    }

    #[test]
    fn test_write_and_flush() {
        let mut stream = Stream::open(MemorySource::writer()).unwrap();
        write!(stream, "{}-{}", 1, 2).unwrap();
        Write::flush(&mut stream).unwrap();
        assert_eq!(stream.get_ref().contents(), b"1-2");
    }
}
