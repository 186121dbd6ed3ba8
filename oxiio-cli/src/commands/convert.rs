//! Convert command implementation.

use crate::utils::{copy_text, create_progress_bar, open_input, open_output};
use encoding_rs::UTF_8;
use oxiio_stream::StreamOptions;
use oxiio_text::Newline;
use oxiio_text::encoding::{lookup, name};
use std::path::Path;

/// Options for transcoding a file.
pub struct ConvertOptions<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub from: &'a str,
    pub to: &'a str,
    pub newline: Newline,
    pub progress: bool,
}

pub fn cmd_convert(options: &ConvertOptions) -> Result<(), Box<dyn std::error::Error>> {
    let from = lookup(options.from)?;
    let to = lookup(options.to)?;
    if from.is_none() != to.is_none() {
        return Err("binary can only be converted to binary".into());
    }

    // Decode into UTF-8 so malformed input is caught before it is written.
    let mut input_options = StreamOptions::TEXT
        .with_encoding(from, from.map(|_| UTF_8))
        .with_bom(from.is_some());
    if options.newline == Newline::Universal {
        input_options = input_options.with_newline(Newline::Universal);
    }
    let output_options = StreamOptions::BINARY
        .with_encoding(to, None)
        .with_newline(options.newline);

    let mut input = open_input(Some(options.input), input_options)?;
    let total = input.stat()?.size.unwrap_or(0);

    println!(
        "Converting {} ({}) to {} ({})",
        options.input.display(),
        name(from),
        options.output.display(),
        name(to)
    );

    let mut output = open_output(Some(options.output), output_options)?;
    let pb = create_progress_bar(total, options.progress);
    let copied = copy_text(&mut input, &mut output, |pos| pb.set_position(pos))?;
    pb.finish_with_message("done");

    if let Some(detected) = input.external_encoding().filter(|enc| Some(*enc) != from) {
        println!("  Byte order mark selected {}", detected.name());
    }
    let written = output.stat()?.size.unwrap_or(0);
    input.close()?;
    output.close()?;
    println!("  Read {} bytes of text, wrote {} bytes", copied, written);

    Ok(())
}
