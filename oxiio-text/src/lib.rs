//! # OxiIO Text
//!
//! The character layer of the OxiIO stream stack.
//!
//! Two strategies sit on top of a [`BufferedIo`](oxiio_core::BufferedIo):
//!
//! - [`PassthroughReader`]: serves bytes straight from the byte buffer
//! - [`ConverterReader`]: decodes the external encoding with `encoding_rs`
//!   into its own character buffer
//!
//! [`CharacterIo`] selects between them, and [`TextReader`] reads lines and
//! characters through either one, with separator matching, length limits,
//! chomping, paragraph mode and universal newline normalization.
//!
//! ## Example
//!
//! ```rust
//! use oxiio_core::adapters::MemorySource;
//! use oxiio_core::{BufferedIo, Mode, Outcome};
//! use oxiio_text::{CharacterIo, LineOptions, Newline, TextReader};
//!
//! let mut io = BufferedIo::new(MemorySource::reader(b"first\r\nsecond\n".to_vec()));
//! let mut chars = CharacterIo::select(Some(encoding_rs::UTF_8), Some(encoding_rs::UTF_8)).unwrap();
//! let mut reader = TextReader::new(&mut chars, &mut io, Newline::Universal, Mode::Blocking);
//!
//! let line = reader.read_line(&LineOptions::CHOMP).unwrap();
//! assert_eq!(line, Outcome::Ready(b"first".to_vec()));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod character;
pub mod converter;
pub mod encoding;
pub mod lines;
pub mod newline;
pub mod passthrough;
pub mod reader;

// Re-exports for convenience
pub use character::CharacterIo;
pub use converter::{ConverterReader, MIN_CHARACTER_BUFFER_SIZE};
pub use encoding::{CharLen, char_len};
pub use lines::{LineOptions, Separator, TextReader};
pub use newline::Newline;
pub use passthrough::PassthroughReader;
pub use reader::CharacterReader;
