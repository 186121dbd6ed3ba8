//! Integration tests for character and line reading.

use encoding_rs::{SHIFT_JIS, UTF_8};
use oxiio_core::adapters::{MemorySource, ScriptedSource, Step};
use oxiio_core::{BufferedIo, Mode, OxiIoError, Outcome, Source};
use oxiio_text::{CharacterIo, LineOptions, Newline, Separator, TextReader};

fn collect_lines<S: Source>(
    io: &mut BufferedIo<S>,
    chars: &mut CharacterIo,
    newline: Newline,
    options: &LineOptions,
) -> Vec<Vec<u8>> {
    let mut reader = TextReader::new(chars, io, newline, Mode::Blocking);
    let mut out = Vec::new();
    while let Outcome::Ready(line) = reader.read_line(options).unwrap() {
        out.push(line);
    }
    out
}

fn one_byte_reads(data: &[u8]) -> ScriptedSource {
    ScriptedSource::reader(data.iter().map(|b| Step::Data(vec![*b])).collect())
}

// ============================================================================
// Character reads through the converter
// ============================================================================

#[test]
fn test_italian_line_character_count() {
    let data = b"Qui \xC3\xA8 la linea due.\n".to_vec();
    let mut io = BufferedIo::new(MemorySource::reader(data));
    let mut chars = CharacterIo::select(Some(UTF_8), Some(UTF_8)).unwrap();

    let mut seen = Vec::new();
    {
        let mut reader = TextReader::new(&mut chars, &mut io, Newline::None, Mode::Blocking);
        while let Outcome::Ready(ch) = reader.read_char().unwrap() {
            seen.push(String::from_utf8(ch).unwrap());
        }
    }

    assert_eq!(seen.len(), 20);
    assert_eq!(seen[4], "è");
    assert_eq!(seen[15..].concat(), "due.\n");
    match &chars {
        CharacterIo::Converter(conv) => assert!(conv.is_drained()),
        CharacterIo::Passthrough(_) => panic!("expected converter"),
    }
}

#[test]
fn test_shift_jis_lines_one_byte_at_a_time() {
    // "日本\n語\n" in Shift_JIS.
    let data = b"\x93\xfa\x96\x7b\n\x8c\xea\n";
    let mut io = BufferedIo::new(one_byte_reads(data));
    let mut chars = CharacterIo::select(Some(SHIFT_JIS), Some(UTF_8)).unwrap();
    let got = collect_lines(&mut io, &mut chars, Newline::None, &LineOptions::CHOMP);
    assert_eq!(got, vec!["日本".as_bytes().to_vec(), "語".as_bytes().to_vec()]);
}

#[test]
fn test_invalid_byte_error_keeps_partial_line() {
    let mut io = BufferedIo::new(MemorySource::reader(b"ab\xFFcd\n".to_vec()));
    let mut chars = CharacterIo::select(Some(UTF_8), Some(UTF_8)).unwrap();
    let mut reader = TextReader::new(&mut chars, &mut io, Newline::None, Mode::Blocking);

    let err = reader.read_line(&LineOptions::DEFAULT).unwrap_err();
    assert!(matches!(err, OxiIoError::InvalidByteSequence { ref bytes, .. } if bytes == b"\xFF"));
    assert_eq!(
        reader.read_line(&LineOptions::DEFAULT).unwrap(),
        Outcome::Ready(b"abcd\n".to_vec())
    );
}

// ============================================================================
// Separators spanning refills
// ============================================================================

#[test]
fn test_multibyte_separator_across_reads() {
    let mut io = BufferedIo::new(one_byte_reads(b"left--|--right--|--"));
    let mut chars = CharacterIo::default();
    let options = LineOptions::new()
        .with_separator(Separator::from_bytes(b"--|--"))
        .with_chomp(true);
    let got = collect_lines(&mut io, &mut chars, Newline::None, &options);
    assert_eq!(got, vec![b"left".to_vec(), b"right".to_vec()]);
}

#[test]
fn test_crlf_split_across_reads() {
    let source = ScriptedSource::reader(vec![
        Step::Data(b"one\r".to_vec()),
        Step::Data(b"\ntwo\r".to_vec()),
        Step::Data(b"three".to_vec()),
    ]);
    let mut io = BufferedIo::new(source);
    let mut chars = CharacterIo::default();
    let got = collect_lines(&mut io, &mut chars, Newline::Universal, &LineOptions::DEFAULT);
    assert_eq!(
        got,
        vec![b"one\n".to_vec(), b"two\n".to_vec(), b"three".to_vec()]
    );
}

#[test]
fn test_paragraph_run_split_across_reads() {
    let mut io = BufferedIo::new(one_byte_reads(b"a\n\n\nb\n"));
    let mut chars = CharacterIo::default();
    let options = LineOptions::PARAGRAPH.with_chomp(true);
    let got = collect_lines(&mut io, &mut chars, Newline::None, &options);
    assert_eq!(got, vec![b"a".to_vec(), b"b".to_vec()]);
}

// ============================================================================
// Nonblocking reads
// ============================================================================

#[test]
fn test_would_block_mid_line_loses_nothing() {
    let source = ScriptedSource::reader(vec![
        Step::Data(b"par".to_vec()),
        Step::WouldBlock,
        Step::Data(b"tial\n".to_vec()),
    ]);
    let mut io = BufferedIo::new(source);
    let mut chars = CharacterIo::default();
    let mut reader = TextReader::new(&mut chars, &mut io, Newline::None, Mode::NonBlocking);

    assert_eq!(reader.read_line(&LineOptions::DEFAULT).unwrap(), Outcome::WouldBlock);
    assert_eq!(
        reader.read_line(&LineOptions::DEFAULT).unwrap(),
        Outcome::Ready(b"partial\n".to_vec())
    );
}
