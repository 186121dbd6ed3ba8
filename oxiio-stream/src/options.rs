//! Stream configuration.

use encoding_rs::{Encoding, UTF_8_INIT};
use oxiio_core::{DEFAULT_BUFFER_SIZE, Result};
use oxiio_text::encoding::lookup;
use oxiio_text::{LineOptions, Newline};

/// Options applied when a stream is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOptions {
    /// Capacity of each byte buffer region.
    pub buffer_size: usize,
    /// Encoding of the source bytes; `None` for binary.
    pub external_encoding: Option<&'static Encoding>,
    /// Encoding text is converted to on read; `None` disables conversion.
    pub internal_encoding: Option<&'static Encoding>,
    /// Newline translation.
    pub newline: Newline,
    /// Defaults for [`Stream::read_line`](crate::Stream::read_line).
    pub line: LineOptions,
    /// Flush after every write.
    pub sync: bool,
    /// Detect a byte order mark before the first read.
    pub sniff_bom: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self::TEXT
    }
}

impl StreamOptions {
    /// UTF-8 text without conversion or newline translation.
    pub const TEXT: Self = Self {
        buffer_size: DEFAULT_BUFFER_SIZE,
        external_encoding: Some(&UTF_8_INIT),
        internal_encoding: None,
        newline: Newline::None,
        line: LineOptions::DEFAULT,
        sync: false,
        sniff_bom: false,
    };

    /// Raw bytes.
    pub const BINARY: Self = Self {
        buffer_size: DEFAULT_BUFFER_SIZE,
        external_encoding: None,
        internal_encoding: None,
        newline: Newline::None,
        line: LineOptions::DEFAULT,
        sync: false,
        sniff_bom: false,
    };

    /// UTF-8 text with universal newlines.
    pub const UNIVERSAL: Self = Self {
        buffer_size: DEFAULT_BUFFER_SIZE,
        external_encoding: Some(&UTF_8_INIT),
        internal_encoding: None,
        newline: Newline::Universal,
        line: LineOptions::DEFAULT,
        sync: false,
        sniff_bom: false,
    };

    /// Create default options.
    pub fn new() -> Self {
        Self::TEXT
    }

    /// Parse an `"external[:internal]"` encoding spec such as
    /// `"Shift_JIS:UTF-8"` into default options.
    pub fn from_encoding_spec(spec: &str) -> Result<Self> {
        let (external, internal) = match spec.split_once(':') {
            Some((external, internal)) => (lookup(external)?, lookup(internal)?),
            None => (lookup(spec)?, None),
        };
        Ok(Self::new().with_encoding(external, internal))
    }

    /// Set the buffer size.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set external and internal encodings.
    pub fn with_encoding(
        mut self,
        external: Option<&'static Encoding>,
        internal: Option<&'static Encoding>,
    ) -> Self {
        self.external_encoding = external;
        self.internal_encoding = internal;
        self
    }

    /// Set the newline mode.
    pub fn with_newline(mut self, newline: Newline) -> Self {
        self.newline = newline;
        self
    }

    /// Set the default line options.
    pub fn with_line_options(mut self, line: LineOptions) -> Self {
        self.line = line;
        self
    }

    /// Enable or disable write-through.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Enable or disable byte order mark detection.
    pub fn with_bom(mut self, sniff_bom: bool) -> Self {
        self.sniff_bom = sniff_bom;
        self
    }

    /// Switch to binary: no encodings, no newline translation.
    pub fn binmode(mut self) -> Self {
        self.external_encoding = None;
        self.internal_encoding = None;
        self.newline = Newline::None;
        self
    }
}
