//! Integration tests for the stream facade.

use encoding_rs::{SHIFT_JIS, UTF_8};
use oxiio_core::adapters::{DuplexSource, MemorySource, ScriptedSource, Step};
use oxiio_core::{OxiIoError, Outcome};
use oxiio_stream::{Stream, StreamOptions, StreamState};
use oxiio_text::{LineOptions, Newline, Separator};
use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_ansi(false)
            .try_init();
    });
}

fn one_byte_reads(data: &[u8]) -> ScriptedSource {
    ScriptedSource::reader(data.iter().map(|b| Step::Data(vec![*b])).collect())
}

// ============================================================================
// Open state machine
// ============================================================================

#[test]
fn test_half_close_then_everything_fails() {
    init_logging();
    let duplex = DuplexSource::new(
        MemorySource::reader(b"request\n".to_vec()),
        MemorySource::writer(),
    );
    let mut stream = Stream::open(duplex).unwrap();

    assert_eq!(stream.read_line().unwrap().as_deref(), Some("request\n"));
    stream.close_read().unwrap();
    assert!(matches!(stream.read_line(), Err(OxiIoError::NotReadable)));
    assert!(matches!(stream.read_char(), Err(OxiIoError::NotReadable)));

    stream.write_str("response\n").unwrap();
    stream.close_write().unwrap();
    assert_eq!(stream.state(), StreamState::Closed);
    assert_eq!(stream.get_ref().writer().contents(), b"response\n");

    assert!(matches!(stream.read(1), Err(OxiIoError::Closed)));
    assert!(matches!(stream.write(b"late"), Err(OxiIoError::Closed)));
    assert!(matches!(stream.close_read(), Err(OxiIoError::Closed)));
    assert!(matches!(stream.close_write(), Err(OxiIoError::Closed)));
    assert!(matches!(stream.pos(), Err(OxiIoError::Closed)));
    assert!(stream.close().is_ok());
}

#[test]
fn test_write_only_stream_rejects_reads() {
    let mut stream = Stream::open(MemorySource::writer()).unwrap();
    assert!(matches!(stream.read(1), Err(OxiIoError::NotReadable)));
    assert!(matches!(stream.is_eof(), Err(OxiIoError::NotReadable)));
    stream.write(b"ok").unwrap();
    assert!(matches!(
        stream.close_read(),
        Err(OxiIoError::AlreadyClosed { half: "read" })
    ));
}

// ============================================================================
// Text reads
// ============================================================================

#[test]
fn test_shift_jis_lines_byte_by_byte() {
    init_logging();
    let options = StreamOptions::TEXT.with_encoding(Some(SHIFT_JIS), Some(UTF_8));
    let source = one_byte_reads(b"\x93\xfa\x96\x7b\n\x8c\xea\n");
    let mut stream = Stream::with_options(source, options).unwrap();
    assert_eq!(stream.read_lines().unwrap(), vec!["日本\n", "語\n"]);
    assert_eq!(stream.lineno(), 2);
    assert!(stream.is_eof().unwrap());
}

#[test]
fn test_italian_character_count() {
    let options = StreamOptions::TEXT.with_encoding(Some(UTF_8), Some(UTF_8));
    let source = MemorySource::reader(b"Qui \xC3\xA8 la linea due.\n".to_vec());
    let mut stream = Stream::with_options(source, options).unwrap();
    let mut chars = Vec::new();
    while let Some(ch) = stream.read_char().unwrap() {
        chars.push(ch);
    }
    assert_eq!(chars.len(), 20);
    assert_eq!(chars[4], "è");
    assert_eq!(chars[15..].concat(), "due.\n");
}

#[test]
fn test_universal_newlines() {
    let source = MemorySource::reader(b"a\r\nb\rc\n".to_vec());
    let mut stream = Stream::with_options(source, StreamOptions::UNIVERSAL).unwrap();
    assert_eq!(stream.read_lines().unwrap(), vec!["a\n", "b\n", "c\n"]);
}

#[test]
fn test_paragraph_mode() {
    let options = StreamOptions::TEXT
        .with_line_options(LineOptions::new().with_separator(Separator::Paragraph));
    let source = MemorySource::reader(b"\n\na\nb\n\n\n\nc\n".to_vec());
    let mut stream = Stream::with_options(source, options).unwrap();
    assert_eq!(stream.read_line().unwrap().as_deref(), Some("a\nb\n\n"));
    assert_eq!(stream.read_line().unwrap().as_deref(), Some("c\n"));
    assert_eq!(stream.read_line().unwrap(), None);
}

#[test]
fn test_unread_char_then_read_line() {
    let mut stream = Stream::open(MemorySource::reader(b"ello\n".to_vec())).unwrap();
    stream.unread_char("h").unwrap();
    assert_eq!(stream.read_line().unwrap().as_deref(), Some("hello\n"));
}

#[test]
fn test_invalid_bytes_reported_after_valid_prefix() {
    let options = StreamOptions::TEXT.with_encoding(Some(UTF_8), Some(UTF_8));
    let source = MemorySource::reader(b"ok\n\xFF\n".to_vec());
    let mut stream = Stream::with_options(source, options).unwrap();
    assert_eq!(stream.read_line().unwrap().as_deref(), Some("ok\n"));
    assert!(matches!(
        stream.read_line(),
        Err(OxiIoError::InvalidByteSequence { .. })
    ));
}

// ============================================================================
// Nonblocking and blocking emulation
// ============================================================================

#[test]
fn test_nonblocking_line_keeps_partial_input() {
    init_logging();
    let source = ScriptedSource::reader(vec![
        Step::Data(b"par".to_vec()),
        Step::WouldBlock,
        Step::Data(b"tial\n".to_vec()),
    ]);
    let mut stream = Stream::open(source).unwrap();
    assert_eq!(
        stream.read_line_nonblock(&LineOptions::DEFAULT).unwrap(),
        Outcome::WouldBlock
    );
    assert_eq!(stream.lineno(), 0);
    assert_eq!(
        stream.read_line_nonblock(&LineOptions::DEFAULT).unwrap(),
        Outcome::Ready(b"partial\n".to_vec())
    );
    assert_eq!(stream.lineno(), 1);
}

#[test]
fn test_nonblocking_line_longer_than_buffer() {
    let source = ScriptedSource::reader(vec![
        Step::Data(b"abcdefgh".to_vec()),
        Step::WouldBlock,
        Step::Data(b"\n".to_vec()),
    ]);
    let mut stream =
        Stream::with_options(source, StreamOptions::TEXT.with_buffer_size(4)).unwrap();
    assert_eq!(
        stream.read_line_nonblock(&LineOptions::DEFAULT).unwrap(),
        Outcome::WouldBlock
    );
    assert_eq!(
        stream.read_line_nonblock(&LineOptions::DEFAULT).unwrap(),
        Outcome::Ready(b"abcdefgh\n".to_vec())
    );
    assert_eq!(stream.read_line().unwrap(), None);
}

#[test]
fn test_read_nonblock_and_blocking_retry() {
    let source = ScriptedSource::reader(vec![Step::WouldBlock, Step::Data(b"data".to_vec())]);
    let mut stream = Stream::with_options(source, StreamOptions::BINARY).unwrap();
    assert_eq!(stream.read_nonblock(4).unwrap(), Outcome::WouldBlock);
    assert_eq!(stream.read_partial(4).unwrap(), b"data");
    assert_eq!(stream.read_nonblock(4).unwrap(), Outcome::Eof);
}

#[test]
fn test_blocking_write_waits_through_would_block() {
    let source = ScriptedSource::writer(vec![Step::WouldBlock, Step::Accept(2)]);
    let mut stream = Stream::with_options(source, StreamOptions::BINARY.with_sync(true)).unwrap();
    assert_eq!(stream.write(b"abcdef").unwrap(), 6);
    assert_eq!(stream.get_ref().written(), b"abcdef");
    assert_eq!(stream.get_ref().waits(), 1);
}

// ============================================================================
// Encodings
// ============================================================================

#[test]
fn test_bom_switches_external_encoding() {
    let options = StreamOptions::TEXT
        .with_encoding(Some(UTF_8), Some(UTF_8))
        .with_bom(true);
    let source = MemorySource::reader(b"\xFF\xFEh\x00i\x00".to_vec());
    let mut stream = Stream::with_options(source, options).unwrap();
    assert_eq!(stream.read_to_string().unwrap(), "hi");
    assert_eq!(stream.external_encoding(), Some(encoding_rs::UTF_16LE));
    assert_eq!(stream.internal_encoding(), Some(UTF_8));
}

#[test]
fn test_binmode_returns_raw_bytes() {
    let mut stream = Stream::open(MemorySource::reader(b"a\r\nb".to_vec())).unwrap();
    stream.binmode().unwrap();
    assert_eq!(stream.external_encoding(), None);
    assert_eq!(stream.options().newline, Newline::None);
    assert_eq!(stream.read_to_end().unwrap(), b"a\r\nb");
}

#[test]
fn test_unmappable_write_is_rejected() {
    let options = StreamOptions::TEXT.with_encoding(Some(encoding_rs::WINDOWS_1252), None);
    let mut stream = Stream::with_options(MemorySource::writer(), options).unwrap();
    assert!(matches!(
        stream.write_str("日"),
        Err(OxiIoError::UndefinedConversion { character: '日', .. })
    ));
    stream.write_str("è").unwrap();
    stream.flush().unwrap();
    assert_eq!(stream.get_ref().contents(), b"\xE8");
}

// ============================================================================
// Duplication and unbuffered access
// ============================================================================

#[test]
fn test_try_clone_is_independent() {
    let mut stream = Stream::open(MemorySource::reader(b"one\ntwo\nthree\n".to_vec())).unwrap();
    assert_eq!(stream.read_line().unwrap().as_deref(), Some("one\n"));

    let mut clone = stream.try_clone().unwrap();
    assert_eq!(clone.lineno(), 1);
    assert_eq!(clone.read_line().unwrap().as_deref(), Some("two\n"));
    assert_eq!(clone.read_line().unwrap().as_deref(), Some("three\n"));

    assert_eq!(stream.read_line().unwrap().as_deref(), Some("two\n"));
    clone.close().unwrap();
    assert_eq!(stream.read_line().unwrap().as_deref(), Some("three\n"));
}

#[test]
fn test_try_clone_mid_character() {
    let options = StreamOptions::TEXT.with_encoding(Some(UTF_8), Some(UTF_8));
    let source = MemorySource::reader("aè".as_bytes().to_vec()).with_chunk_size(2);
    let mut stream = Stream::with_options(source, options).unwrap();
    assert!(!stream.is_eof().unwrap());

    let mut clone = stream.try_clone().unwrap();
    assert_eq!(stream.read_to_string().unwrap(), "aè");
    assert_eq!(clone.read_to_string().unwrap(), "aè");
}

#[test]
fn test_sys_io_rules() {
    let mut stream = Stream::open(MemorySource::new(Vec::new())).unwrap();
    assert_eq!(stream.sys_write(b"raw").unwrap(), 3);
    stream.write(b"buf").unwrap();
    assert!(matches!(
        stream.sys_write(b"x"),
        Err(OxiIoError::BufferedDataPending { operation: "sys_write" })
    ));
    stream.flush().unwrap();
    stream.rewind().unwrap();
    assert_eq!(stream.sys_read(3).unwrap(), Some(b"raw".to_vec()));
    assert_eq!(stream.read(1).unwrap(), Some(b"b".to_vec()));
    assert!(matches!(
        stream.sys_read(1),
        Err(OxiIoError::BufferedDataPending { operation: "sys_read" })
    ));
}

#[test]
fn test_capability_passthroughs() {
    let stream = Stream::open(MemorySource::reader(b"12345".to_vec())).unwrap();
    assert_eq!(stream.stat().unwrap().size, Some(5));
    assert!(!stream.is_tty().unwrap());
    assert!(matches!(
        stream.fileno(),
        Err(OxiIoError::Unsupported { .. })
    ));
}
