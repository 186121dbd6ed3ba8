//! # OxiIO Stream
//!
//! The stream facade of OxiIO.
//!
//! This crate composes the layers of [`oxiio_core`] and [`oxiio_text`] into
//! one object per source:
//!
//! - [`stream`]: [`Stream`], the open-state machine and every operation
//! - [`pipeline`]: Ownership of the byte and character layers
//! - [`options`]: Buffer size, encodings, newline mode and line defaults
//! - [`bridge`]: `std::io::{Read, BufRead, Write, Seek}` for [`Stream`]
//!
//! ## Example
//!
//! ```rust
//! use oxiio_core::adapters::MemorySource;
//! use oxiio_stream::{Stream, StreamOptions};
//!
//! let options = StreamOptions::from_encoding_spec("Shift_JIS:UTF-8").unwrap();
//! let source = MemorySource::reader(b"\x93\xfa\x96\x7b\n".to_vec());
//! let mut stream = Stream::with_options(source, options).unwrap();
//!
//! assert_eq!(stream.read_line().unwrap().as_deref(), Some("日本\n"));
//! assert_eq!(stream.read_line().unwrap(), None);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bridge;
pub mod options;
pub mod pipeline;
pub mod stream;

// Re-exports for convenience
pub use options::StreamOptions;
pub use pipeline::Pipeline;
pub use stream::{Stream, StreamState};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::options::StreamOptions;
    pub use crate::stream::{Stream, StreamState};
    pub use oxiio_core::prelude::*;
    pub use oxiio_text::{LineOptions, Newline, Separator};
}
