//! Encoding lookup and character boundary helpers.
//!
//! An encoding is carried as `Option<&'static Encoding>`: `None` stands for
//! binary data, where every byte is one character and no conversion applies.

use encoding_rs::{DecoderResult, EncoderResult, Encoding, UTF_16BE, UTF_16LE, UTF_8};
use oxiio_core::{OxiIoError, Result};
use std::borrow::Cow;

/// Name reported for binary data.
pub const BINARY_NAME: &str = "BINARY";

/// Resolve an encoding label.
///
/// `"binary"` and `"ascii-8bit"` resolve to `None`; every other label is
/// looked up with the WHATWG label rules.
pub fn lookup(label: &str) -> Result<Option<&'static Encoding>> {
    let trimmed = label.trim();
    if trimmed.eq_ignore_ascii_case("binary") || trimmed.eq_ignore_ascii_case("ascii-8bit") {
        return Ok(None);
    }
    Encoding::for_label(trimmed.as_bytes())
        .map(Some)
        .ok_or_else(|| OxiIoError::invalid_argument(format!("unknown encoding: {trimmed}")))
}

/// Display name of an encoding.
pub fn name(encoding: Option<&'static Encoding>) -> &'static str {
    encoding.map_or(BINARY_NAME, Encoding::name)
}

/// Check whether `encoding` can be produced by an encoder.
///
/// UTF-16 variants decode but never encode.
pub fn is_encodable(encoding: &'static Encoding) -> bool {
    encoding.output_encoding() == encoding
}

/// Detect a byte order mark at the start of `bytes`.
///
/// Returns the marked encoding and the length of the mark.
pub fn sniff_bom(bytes: &[u8]) -> Option<(&'static Encoding, usize)> {
    Encoding::for_bom(bytes)
}

/// Encode UTF-8 text into `encoding`.
///
/// Binary and UTF-8 targets borrow the input. Characters the target cannot
/// represent fail with [`OxiIoError::UndefinedConversion`].
pub fn encode_str<'a>(encoding: Option<&'static Encoding>, text: &'a str) -> Result<Cow<'a, [u8]>> {
    let enc = match encoding {
        None => return Ok(Cow::Borrowed(text.as_bytes())),
        Some(enc) if enc == UTF_8 => return Ok(Cow::Borrowed(text.as_bytes())),
        Some(enc) if enc == UTF_16LE => {
            return Ok(Cow::Owned(text.encode_utf16().flat_map(u16::to_le_bytes).collect()));
        }
        Some(enc) if enc == UTF_16BE => {
            return Ok(Cow::Owned(text.encode_utf16().flat_map(u16::to_be_bytes).collect()));
        }
        Some(enc) => enc,
    };

    let mut encoder = enc.new_encoder();
    let max = encoder
        .max_buffer_length_from_utf8_without_replacement(text.len())
        .ok_or_else(|| OxiIoError::invalid_argument("text too long to encode"))?;
    let mut out = vec![0; max];
    let (result, _read, written) = encoder.encode_from_utf8_without_replacement(text, &mut out, true);
    match result {
        EncoderResult::InputEmpty => {
            out.truncate(written);
            Ok(Cow::Owned(out))
        }
        EncoderResult::Unmappable(c) => Err(OxiIoError::undefined_conversion(c, enc.name())),
        EncoderResult::OutputFull => Err(OxiIoError::unexpected_result(
            "encoder output exceeded its own bound",
        )),
    }
}

/// Decode bytes in `encoding` into a string without replacement.
///
/// Invalid input fails with [`OxiIoError::InvalidByteSequence`] carrying the
/// first offending bytes.
pub fn decode_string(encoding: Option<&'static Encoding>, bytes: Vec<u8>) -> Result<String> {
    match encoding {
        Some(enc) if enc != UTF_8 => {
            match enc.decode_without_bom_handling_and_without_replacement(&bytes) {
                Some(text) => Ok(text.into_owned()),
                None => Err(OxiIoError::invalid_byte_sequence(
                    first_malformed(enc, &bytes),
                    enc.name(),
                )),
            }
        }
        _ => String::from_utf8(bytes).map_err(|e| {
            let start = e.utf8_error().valid_up_to();
            let len = e.utf8_error().error_len().unwrap_or(e.as_bytes().len() - start);
            let bad = e.as_bytes()[start..start + len].to_vec();
            OxiIoError::invalid_byte_sequence(bad, name(encoding))
        }),
    }
}

/// The first malformed sequence of `bytes` in `encoding`.
fn first_malformed(encoding: &'static Encoding, bytes: &[u8]) -> Vec<u8> {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let len = decoder
        .max_utf8_buffer_length_without_replacement(bytes.len())
        .unwrap_or(bytes.len().saturating_mul(3));
    let mut scratch = vec![0; len];
    let (result, read, _written) =
        decoder.decode_to_utf8_without_replacement(bytes, &mut scratch, true);
    match result {
        DecoderResult::Malformed(bad, after) => {
            let end = read.saturating_sub(usize::from(after));
            bytes[end.saturating_sub(usize::from(bad))..end].to_vec()
        }
        DecoderResult::InputEmpty | DecoderResult::OutputFull => bytes.to_vec(),
    }
}

/// Length classification of the first character in a byte slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharLen {
    /// A complete character of this many bytes.
    Complete(usize),
    /// The slice ends inside a character.
    Incomplete,
    /// An invalid sequence of this many bytes.
    Invalid(usize),
}

impl CharLen {
    /// Byte count to advance past this character, treating an incomplete
    /// tail as one unit.
    pub fn advance(self, available: usize) -> usize {
        match self {
            Self::Complete(n) | Self::Invalid(n) => n,
            Self::Incomplete => available,
        }
    }
}

/// Classify the first character of `bytes` in `encoding`.
///
/// `bytes` must not be empty.
pub fn char_len(encoding: Option<&'static Encoding>, bytes: &[u8]) -> CharLen {
    debug_assert!(!bytes.is_empty());
    match encoding {
        None => CharLen::Complete(1),
        Some(enc) if enc == UTF_8 => utf8_char_len(bytes),
        Some(enc) if enc.is_single_byte() => CharLen::Complete(1),
        Some(enc) => trial_char_len(enc, bytes),
    }
}

fn utf8_char_len(bytes: &[u8]) -> CharLen {
    let window = &bytes[..bytes.len().min(4)];
    match std::str::from_utf8(window) {
        Ok(s) => CharLen::Complete(s.chars().next().map_or(1, char::len_utf8)),
        Err(e) if e.valid_up_to() > 0 => {
            // The prefix up to `valid_up_to` is valid, so its first char is complete.
            let lead = &window[..e.valid_up_to()];
            let first = std::str::from_utf8(lead)
                .ok()
                .and_then(|s| s.chars().next())
                .map_or(1, char::len_utf8);
            CharLen::Complete(first)
        }
        Err(e) => match e.error_len() {
            Some(n) => CharLen::Invalid(n),
            None if bytes.len() < 4 => CharLen::Incomplete,
            None => CharLen::Invalid(1),
        },
    }
}

fn trial_char_len(encoding: &'static Encoding, bytes: &[u8]) -> CharLen {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let mut scratch = [0u8; 16];
    for (i, byte) in bytes.iter().take(8).enumerate() {
        let (result, _read, written) =
            decoder.decode_to_utf8_without_replacement(std::slice::from_ref(byte), &mut scratch, false);
        if let DecoderResult::Malformed(bad, _) = result {
            return CharLen::Invalid(usize::from(bad).clamp(1, i + 1));
        }
        if written > 0 {
            return CharLen::Complete(i + 1);
        }
    }
    if bytes.len() < 8 {
        CharLen::Incomplete
    } else {
        CharLen::Invalid(1)
    }
}

/// Check whether `bytes` ends inside a character.
pub fn has_incomplete_tail(encoding: Option<&'static Encoding>, bytes: &[u8]) -> bool {
    let mut pos = 0;
    while pos < bytes.len() {
        match char_len(encoding, &bytes[pos..]) {
            CharLen::Complete(n) | CharLen::Invalid(n) => pos += n,
            CharLen::Incomplete => return true,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{SHIFT_JIS, UTF_16LE, WINDOWS_1252};

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("utf-8").unwrap(), Some(UTF_8));
        assert_eq!(lookup(" Shift_JIS ").unwrap(), Some(SHIFT_JIS));
        assert_eq!(lookup("BINARY").unwrap(), None);
        assert!(matches!(
            lookup("klingon"),
            Err(OxiIoError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_names() {
        assert_eq!(name(None), "BINARY");
        assert_eq!(name(Some(UTF_8)), "UTF-8");
        assert!(!is_encodable(UTF_16LE));
        assert!(is_encodable(SHIFT_JIS));
    }

    #[test]
    fn test_sniff_bom() {
        assert_eq!(sniff_bom(b"\xEF\xBB\xBFabc"), Some((UTF_8, 3)));
        assert_eq!(sniff_bom(b"\xFF\xFEa\x00"), Some((UTF_16LE, 2)));
        assert_eq!(sniff_bom(b"abc"), None);
    }

    #[test]
    fn test_utf8_char_len() {
        assert_eq!(char_len(Some(UTF_8), b"a"), CharLen::Complete(1));
        assert_eq!(char_len(Some(UTF_8), "è!".as_bytes()), CharLen::Complete(2));
        assert_eq!(char_len(Some(UTF_8), "日本".as_bytes()), CharLen::Complete(3));
        assert_eq!(char_len(Some(UTF_8), b"\xE6\x97"), CharLen::Incomplete);
        assert_eq!(char_len(Some(UTF_8), b"\xFFa"), CharLen::Invalid(1));
        assert_eq!(char_len(None, b"\xFF"), CharLen::Complete(1));
        assert_eq!(char_len(Some(WINDOWS_1252), b"\xE8"), CharLen::Complete(1));
    }

    #[test]
    fn test_trial_char_len() {
        // "日" in Shift_JIS is 0x93 0xFA.
        assert_eq!(char_len(Some(SHIFT_JIS), b"\x93\xFAx"), CharLen::Complete(2));
        assert_eq!(char_len(Some(SHIFT_JIS), b"\x93"), CharLen::Incomplete);
        assert_eq!(char_len(Some(SHIFT_JIS), b"A"), CharLen::Complete(1));
    }

    #[test]
    fn test_encode_str() {
        assert_eq!(encode_str(None, "è").unwrap(), "è".as_bytes());
        assert_eq!(encode_str(Some(SHIFT_JIS), "日").unwrap(), &b"\x93\xfa"[..]);
        assert_eq!(encode_str(Some(UTF_16LE), "a").unwrap(), &b"a\x00"[..]);
        assert!(matches!(
            encode_str(Some(WINDOWS_1252), "日"),
            Err(OxiIoError::UndefinedConversion { character: '日', .. })
        ));
    }

    #[test]
    fn test_decode_string() {
        assert_eq!(decode_string(Some(UTF_8), b"ok".to_vec()).unwrap(), "ok");
        assert_eq!(decode_string(Some(SHIFT_JIS), b"\x93\xfa".to_vec()).unwrap(), "日");
        assert!(matches!(
            decode_string(Some(SHIFT_JIS), b"abc\x93".to_vec()),
            Err(OxiIoError::InvalidByteSequence { ref bytes, encoding: "Shift_JIS" }) if bytes == b"\x93"
        ));
        assert!(matches!(
            decode_string(None, b"a\xFFb".to_vec()),
            Err(OxiIoError::InvalidByteSequence { ref bytes, encoding: "BINARY" }) if bytes == b"\xFF"
        ));
    }

    #[test]
    fn test_incomplete_tail() {
        assert!(has_incomplete_tail(Some(UTF_8), b"ab\xC3"));
        assert!(!has_incomplete_tail(Some(UTF_8), "abè".as_bytes()));
        assert!(!has_incomplete_tail(None, b"ab\xC3"));
    }
}
