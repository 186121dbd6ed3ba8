//! Line and character reading over a character layer.
//!
//! [`TextReader`] borrows a pipeline's character layer and byte buffer for
//! the duration of one operation. Separators are matched as bytes are
//! consumed, so a separator split across two refills is still found.
//!
//! # Newline normalization
//!
//! With [`Newline::Universal`], CRLF and lone CR read as LF. A CR at the end
//! of the buffered content triggers a refill to look at the next byte; a CR
//! at end of stream reads as LF.
//!
//! # Paragraph mode
//!
//! Leading newlines are skipped. A paragraph ends at two consecutive
//! newlines (each optionally preceded by CR); the line includes those two,
//! and any further newlines in the run are discarded. With chomp the
//! terminating newlines are removed.

use crate::character::CharacterIo;
use crate::encoding::{CharLen, char_len, has_incomplete_tail};
use crate::newline::Newline;
use crate::reader::CharacterReader;
use oxiio_core::{BufferedIo, Mode, Outcome, Result, Source};
use tracing::trace;

/// Line terminator used by line reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Separator {
    /// A single LF.
    #[default]
    Newline,
    /// An arbitrary non-empty byte string.
    Custom(Vec<u8>),
    /// Paragraphs: two or more consecutive newlines.
    Paragraph,
    /// No separator: read to end of stream.
    None,
}

impl Separator {
    /// Build from raw bytes: empty selects paragraph mode.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match bytes {
            [] => Self::Paragraph,
            b"\n" => Self::Newline,
            _ => Self::Custom(bytes.to_vec()),
        }
    }
}

/// Options for one line read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LineOptions {
    /// Line terminator.
    pub separator: Separator,
    /// Maximum line length in bytes, extended to finish a partial character.
    pub limit: Option<usize>,
    /// Remove the terminator from the returned line.
    pub chomp: bool,
}

impl LineOptions {
    /// LF-terminated lines, terminator kept.
    pub const DEFAULT: Self = Self {
        separator: Separator::Newline,
        limit: None,
        chomp: false,
    };

    /// LF-terminated lines, terminator removed.
    pub const CHOMP: Self = Self {
        separator: Separator::Newline,
        limit: None,
        chomp: true,
    };

    /// Paragraphs, terminator kept.
    pub const PARAGRAPH: Self = Self {
        separator: Separator::Paragraph,
        limit: None,
        chomp: false,
    };

    /// Create default options.
    pub fn new() -> Self {
        Self::DEFAULT
    }

    /// Set the separator.
    pub fn with_separator(mut self, separator: Separator) -> Self {
        self.separator = separator;
        self
    }

    /// Set the length limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set chomping.
    pub fn with_chomp(mut self, chomp: bool) -> Self {
        self.chomp = chomp;
        self
    }
}

/// One-operation view combining the character layer and its byte buffer.
#[derive(Debug)]
pub struct TextReader<'a, S> {
    chars: &'a mut CharacterIo,
    io: &'a mut BufferedIo<S>,
    newline: Newline,
    mode: Mode,
}

impl<'a, S: Source> TextReader<'a, S> {
    /// Borrow a pipeline's layers.
    pub fn new(
        chars: &'a mut CharacterIo,
        io: &'a mut BufferedIo<S>,
        newline: Newline,
        mode: Mode,
    ) -> Self {
        Self {
            chars,
            io,
            newline,
            mode,
        }
    }

    /// Read one line.
    ///
    /// Yields [`Outcome::Eof`] when nothing is left. On would-block or
    /// failure the partial line is put back, however long, so the next read
    /// sees it again.
    pub fn read_line(&mut self, options: &LineOptions) -> Result<Outcome<Vec<u8>>> {
        let mut line = Vec::new();
        let mut raw = Vec::new();
        let result = self.line_inner(options, &mut line, &mut raw);
        if !matches!(result, Ok(Outcome::Ready(_)) | Ok(Outcome::Eof)) {
            self.restore(&raw);
        }
        result
    }

    /// Read one character.
    pub fn read_char(&mut self) -> Result<Outcome<Vec<u8>>> {
        let encoding = self.chars.encoding();
        loop {
            let content = self.chars.content(self.io);
            if content.is_empty() {
                match self.chars.refill(self.io, false, self.mode)? {
                    Outcome::Ready(_) => continue,
                    Outcome::Eof => return Ok(Outcome::Eof),
                    Outcome::WouldBlock => return Ok(Outcome::WouldBlock),
                }
            }
            if content[0] == b'\r' && self.newline.normalizes_reads() {
                let mut raw = Vec::new();
                return Ok(self.next_byte(&mut raw)?.map(|b| b.into_iter().collect()));
            }
            match char_len(encoding, content) {
                CharLen::Complete(n) | CharLen::Invalid(n) => {
                    let ch = content[..n].to_vec();
                    self.chars.consume(self.io, n);
                    return Ok(Outcome::Ready(ch));
                }
                CharLen::Incomplete => match self.chars.refill(self.io, false, self.mode)? {
                    Outcome::Ready(_) => {}
                    Outcome::WouldBlock => return Ok(Outcome::WouldBlock),
                    Outcome::Eof => {
                        let rest = self.chars.content(self.io).to_vec();
                        self.chars.consume(self.io, rest.len());
                        return Ok(Outcome::Ready(rest));
                    }
                },
            }
        }
    }

    /// Push text back in front of the content.
    pub fn unread(&mut self, bytes: &[u8]) -> Result<()> {
        self.chars.unread(self.io, bytes)
    }

    /// Read all remaining text.
    ///
    /// Text gathered before a would-block is returned; would-block is only
    /// reported when nothing was read.
    pub fn read_to_end(&mut self) -> Result<Outcome<Vec<u8>>> {
        let mut out = Vec::new();
        if self.newline.normalizes_reads() {
            let mut raw = Vec::new();
            loop {
                match self.next_byte(&mut raw)? {
                    Outcome::Ready(Some(b)) => out.push(b),
                    Outcome::Ready(None) => return Ok(Outcome::Ready(out)),
                    Outcome::WouldBlock | Outcome::Eof => break,
                }
            }
        } else {
            loop {
                let content = self.chars.content(self.io);
                if !content.is_empty() {
                    out.extend_from_slice(content);
                    let n = content.len();
                    self.chars.consume(self.io, n);
                }
                match self.chars.refill(self.io, true, self.mode)? {
                    Outcome::Ready(_) => {}
                    Outcome::Eof => return Ok(Outcome::Ready(out)),
                    Outcome::WouldBlock => break,
                }
            }
        }
        if out.is_empty() {
            Ok(Outcome::WouldBlock)
        } else {
            Ok(Outcome::Ready(out))
        }
    }

    fn line_inner(
        &mut self,
        options: &LineOptions,
        line: &mut Vec<u8>,
        raw: &mut Vec<u8>,
    ) -> Result<Outcome<Vec<u8>>> {
        if options.limit == Some(0) {
            return Ok(Outcome::Ready(Vec::new()));
        }
        let encoding = self.chars.encoding();

        if options.separator == Separator::Paragraph {
            match self.skip_newlines(raw)? {
                Outcome::WouldBlock => return Ok(Outcome::WouldBlock),
                Outcome::Ready(_) | Outcome::Eof => {}
            }
        }

        loop {
            if let Some(limit) = options.limit {
                if line.len() >= limit && !has_incomplete_tail(encoding, line) {
                    break;
                }
            }
            let b = match self.next_byte(raw)? {
                Outcome::Ready(Some(b)) => b,
                Outcome::Ready(None) | Outcome::Eof => {
                    if line.is_empty() {
                        return Ok(Outcome::Eof);
                    }
                    if options.chomp {
                        chomp_at_eof(&options.separator, line);
                    }
                    return Ok(Outcome::Ready(std::mem::take(line)));
                }
                Outcome::WouldBlock => return Ok(Outcome::WouldBlock),
            };
            line.push(b);

            let terminated = match &options.separator {
                Separator::Newline => b == b'\n',
                Separator::Custom(sep) => line.ends_with(sep),
                Separator::Paragraph => b == b'\n' && ends_with_paragraph_break(line),
                Separator::None => false,
            };
            if terminated {
                if options.separator == Separator::Paragraph {
                    // The rest of the newline run belongs to no paragraph.
                    if let Outcome::WouldBlock = self.skip_newlines(raw)? {
                        return Ok(Outcome::WouldBlock);
                    }
                }
                break;
            }
        }

        if options.chomp {
            chomp(&options.separator, line);
        }
        trace!(len = line.len(), "read line");
        Ok(Outcome::Ready(std::mem::take(line)))
    }

    /// Consume a run of newlines at the front of the content.
    fn skip_newlines(&mut self, raw: &mut Vec<u8>) -> Result<Outcome<usize>> {
        let mut skipped = 0;
        loop {
            match self.newline_len()? {
                Outcome::Ready(0) | Outcome::Eof => return Ok(Outcome::Ready(skipped)),
                Outcome::Ready(n) => {
                    let content = self.chars.content(self.io);
                    raw.extend_from_slice(&content[..n]);
                    self.chars.consume(self.io, n);
                    skipped += n;
                }
                Outcome::WouldBlock => return Ok(Outcome::WouldBlock),
            }
        }
    }

    /// Raw length of the newline at the front of the content, 0 if none.
    fn newline_len(&mut self) -> Result<Outcome<usize>> {
        match self.peek_at(0)? {
            Outcome::Ready(Some(b'\n')) => Ok(Outcome::Ready(1)),
            Outcome::Ready(Some(b'\r')) => match self.peek_at(1)? {
                Outcome::Ready(Some(b'\n')) => Ok(Outcome::Ready(2)),
                Outcome::WouldBlock => Ok(Outcome::WouldBlock),
                _ if self.newline.normalizes_reads() => Ok(Outcome::Ready(1)),
                _ => Ok(Outcome::Ready(0)),
            },
            Outcome::Ready(_) | Outcome::Eof => Ok(Outcome::Ready(0)),
            Outcome::WouldBlock => Ok(Outcome::WouldBlock),
        }
    }

    /// Next byte of content, normalizing CR when enabled.
    ///
    /// Every consumed raw byte is appended to `raw`.
    fn next_byte(&mut self, raw: &mut Vec<u8>) -> Result<Outcome<Option<u8>>> {
        let b = match self.peek_at(0)? {
            Outcome::Ready(Some(b)) => b,
            other => return Ok(other),
        };
        if b == b'\r' && self.newline.normalizes_reads() {
            let n = match self.peek_at(1)? {
                Outcome::Ready(Some(b'\n')) => 2,
                Outcome::WouldBlock => return Ok(Outcome::WouldBlock),
                _ => 1,
            };
            raw.extend_from_slice(&self.chars.content(self.io)[..n]);
            self.chars.consume(self.io, n);
            return Ok(Outcome::Ready(Some(b'\n')));
        }
        raw.push(b);
        self.chars.consume(self.io, 1);
        Ok(Outcome::Ready(Some(b)))
    }

    /// Byte at offset `k` of the content, refilling as needed.
    fn peek_at(&mut self, k: usize) -> Result<Outcome<Option<u8>>> {
        loop {
            if let Some(&b) = self.chars.content(self.io).get(k) {
                return Ok(Outcome::Ready(Some(b)));
            }
            match self.chars.refill(self.io, true, self.mode)? {
                Outcome::Ready(_) => {}
                Outcome::Eof => return Ok(Outcome::Ready(None)),
                Outcome::WouldBlock => return Ok(Outcome::WouldBlock),
            }
        }
    }

    fn restore(&mut self, raw: &[u8]) {
        if !raw.is_empty() {
            self.chars.restore(self.io, raw);
        }
    }
}

fn ends_with_paragraph_break(line: &[u8]) -> bool {
    line.ends_with(b"\n\n") || line.ends_with(b"\n\r\n")
}

fn strip_newline_run(line: &mut Vec<u8>) {
    loop {
        if line.ends_with(b"\r\n") {
            line.truncate(line.len() - 2);
        } else if line.ends_with(b"\n") {
            line.truncate(line.len() - 1);
        } else {
            return;
        }
    }
}

fn chomp(separator: &Separator, line: &mut Vec<u8>) {
    match separator {
        Separator::Newline => {
            if line.ends_with(b"\r\n") {
                line.truncate(line.len() - 2);
            } else if line.ends_with(b"\n") {
                line.truncate(line.len() - 1);
            }
        }
        Separator::Custom(sep) => {
            if line.ends_with(sep) {
                line.truncate(line.len() - sep.len());
            }
        }
        Separator::Paragraph => strip_newline_run(line),
        Separator::None => {}
    }
}

fn chomp_at_eof(separator: &Separator, line: &mut Vec<u8>) {
    match separator {
        Separator::Paragraph => strip_newline_run(line),
        other => chomp(other, line),
    }
}
