//! Concrete sources.
//!
//! - [`MemorySource`]: growable in-memory region, optional chunked transfers
//! - [`FileSource`]: `std::fs::File`
//! - [`ReaderSource`] / [`WriterSource`]: any `std::io::Read` / `Write`
//! - [`DuplexSource`]: separate read and write sources behind one handle
//! - [`ScriptedSource`]: replays scripted signals, for tests

pub mod duplex;
pub mod file;
pub mod io;
pub mod memory;
pub mod scripted;

pub use duplex::DuplexSource;
pub use file::FileSource;
pub use io::{ReaderSource, WriterSource};
pub use memory::MemorySource;
pub use scripted::{ScriptedSource, Step};
