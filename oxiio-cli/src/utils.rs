//! Utility functions for the CLI.

use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use oxiio_core::Source;
use oxiio_core::adapters::{FileSource, ReaderSource, WriterSource};
use oxiio_stream::{Stream, StreamOptions};
use oxiio_text::{CharacterReader, LineOptions, Newline};
use std::path::Path;

/// A stream over any source the CLI can open.
pub type DynStream = Stream<Box<dyn Source>>;

/// Bytes of text moved per read when copying.
pub const COPY_CHUNK: usize = 64 * 1024;

/// Newline translation selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NewlineArg {
    /// Leave newlines alone
    None,
    /// Read CRLF and CR as LF
    Universal,
    /// Write LF as CRLF
    Crlf,
    /// Write LF as CR
    Cr,
}

impl From<NewlineArg> for Newline {
    fn from(arg: NewlineArg) -> Self {
        match arg {
            NewlineArg::None => Newline::None,
            NewlineArg::Universal => Newline::Universal,
            NewlineArg::Crlf => Newline::Crlf,
            NewlineArg::Cr => Newline::Cr,
        }
    }
}

fn is_stdio(path: Option<&Path>) -> bool {
    path.is_none_or(|p| p.as_os_str() == "-")
}

/// Open a file, or stdin for `None` and `-`.
pub fn open_input(path: Option<&Path>, options: StreamOptions) -> oxiio_core::Result<DynStream> {
    let source: Box<dyn Source> = match path {
        Some(path) if !is_stdio(Some(path)) => Box::new(FileSource::open(path)?),
        _ => Box::new(ReaderSource::new(std::io::stdin())),
    };
    Stream::with_options(source, options)
}

/// Create a file, or use stdout for `None` and `-`.
pub fn open_output(path: Option<&Path>, options: StreamOptions) -> oxiio_core::Result<DynStream> {
    let source: Box<dyn Source> = match path {
        Some(path) if !is_stdio(Some(path)) => Box::new(FileSource::create(path)?),
        _ => Box::new(WriterSource::new(std::io::stdout())),
    };
    Stream::with_options(source, options)
}

/// Copy the remaining text of `input` into `output`.
///
/// Text is read in bounded line-sized pieces so large inputs never sit in
/// memory at once. `on_progress` receives the input position after each
/// piece. Returns the number of text bytes copied.
pub fn copy_text(
    input: &mut DynStream,
    output: &mut DynStream,
    mut on_progress: impl FnMut(u64),
) -> oxiio_core::Result<u64> {
    let piece = LineOptions::DEFAULT.with_limit(COPY_CHUNK);
    let mut copied = 0u64;
    if input.pipeline().character().encoding().is_none() {
        while let Some(bytes) = input.read(COPY_CHUNK)? {
            copied += bytes.len() as u64;
            output.write(&bytes)?;
            on_progress(input.pos()?);
        }
    } else {
        while let Some(text) = input.read_line_with(&piece)? {
            copied += text.len() as u64;
            output.write_str(&text)?;
            on_progress(input.pos()?);
        }
    }
    output.flush()?;
    Ok(copied)
}

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    pb.set_style(style);
    pb
}
