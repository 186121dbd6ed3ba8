//! # OxiIO Core
//!
//! Core layers of the OxiIO stream library.
//!
//! This crate provides the byte-level half of the stream stack:
//!
//! - [`source`]: The raw I/O capability a stream is built on
//! - [`blocking`]: Blocking emulation over would-block sources
//! - [`buffered`]: Fixed-capacity read/write buffering with pushback
//! - [`adapters`]: Ready-made sources (memory, files, `std::io` objects)
//! - [`signal`]: Transfer signals, outcomes and modes
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! OxiIO is designed as a layered pipeline:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: Stream facade                                       │
//! │     Stream, StreamOptions, std::io bridges, CLI        │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Character                                           │
//! │     Passthrough / encoding converter, line reader      │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Buffered (this crate)                               │
//! │     BufferedIo: read-ahead, pushback, write batching   │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Blocking + Source (this crate)                      │
//! │     BlockingIo, Source trait, adapters                 │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxiio_core::adapters::MemorySource;
//! use oxiio_core::{BufferedIo, Mode, Outcome};
//!
//! let mut io = BufferedIo::new(MemorySource::reader(b"hello world".to_vec()));
//! assert_eq!(io.refill(Mode::Blocking).unwrap(), Outcome::Ready(11));
//! assert_eq!(io.peek(), b"hello world");
//!
//! // Consume, then push the bytes back.
//! let mut word = [0u8; 5];
//! io.read(&mut word, Mode::Blocking).unwrap();
//! io.unread(&word).unwrap();
//! assert_eq!(io.peek(), b"hello world");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod adapters;
pub mod blocking;
pub mod buffered;
pub mod error;
pub mod signal;
pub mod source;

// Re-exports for convenience
pub use blocking::BlockingIo;
pub use buffered::{BufferedIo, DEFAULT_BUFFER_SIZE};
pub use error::{OxiIoError, Result};
pub use signal::{Interest, Mode, Outcome, Signal, Whence};
pub use source::{Source, SourceKind, SourceStat};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::adapters::{FileSource, MemorySource, ReaderSource, WriterSource};
    pub use crate::blocking::BlockingIo;
    pub use crate::buffered::BufferedIo;
    pub use crate::error::{OxiIoError, Result};
    pub use crate::signal::{Interest, Mode, Outcome, Signal, Whence};
    pub use crate::source::Source;
}
