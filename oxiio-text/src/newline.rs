//! Newline conversion modes.

use std::borrow::Cow;

/// How line endings are translated.
///
/// `Universal` applies to text reads; `Crlf` and `Cr` apply to text writes.
/// Byte-oriented reads and writes are never translated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Newline {
    /// No translation.
    #[default]
    None,
    /// Read CRLF and lone CR as LF.
    Universal,
    /// Write LF as CRLF.
    Crlf,
    /// Write LF as CR.
    Cr,
}

impl Newline {
    /// Parse a mode name (`none`, `universal`, `crlf`, `cr`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" | "lf" => Some(Self::None),
            "universal" => Some(Self::Universal),
            "crlf" => Some(Self::Crlf),
            "cr" => Some(Self::Cr),
            _ => None,
        }
    }

    /// Check whether text reads normalize line endings.
    pub fn normalizes_reads(self) -> bool {
        self == Self::Universal
    }

    /// Translate LF in text about to be written.
    pub fn encode<'a>(self, text: &'a str) -> Cow<'a, str> {
        match self {
            Self::Crlf if text.contains('\n') => Cow::Owned(text.replace('\n', "\r\n")),
            Self::Cr if text.contains('\n') => Cow::Owned(text.replace('\n', "\r")),
            _ => Cow::Borrowed(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Newline::from_name("CRLF"), Some(Newline::Crlf));
        assert_eq!(Newline::from_name("universal"), Some(Newline::Universal));
        assert_eq!(Newline::from_name("dos"), None);
    }

    #[test]
    fn test_encode() {
        assert_eq!(Newline::Crlf.encode("a\nb\n"), "a\r\nb\r\n");
        assert_eq!(Newline::Cr.encode("a\nb"), "a\rb");
        assert!(matches!(Newline::Universal.encode("a\n"), Cow::Borrowed(_)));
    }
}
