//! Cat command implementation.

use crate::utils::{copy_text, open_input, open_output};
use oxiio_stream::StreamOptions;
use oxiio_text::Newline;
use oxiio_text::encoding::lookup;
use std::path::PathBuf;
use tracing::debug;

/// Options for printing files.
pub struct CatOptions<'a> {
    pub files: &'a [PathBuf],
    pub encoding: &'a str,
    pub output_encoding: Option<&'a str>,
    pub universal: bool,
    pub newline: Newline,
}

pub fn cmd_cat(options: &CatOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut input_options = StreamOptions::from_encoding_spec(options.encoding)?;
    if options.universal || options.newline == Newline::Universal {
        input_options = input_options.with_newline(Newline::Universal);
    }

    // Text leaves in the content encoding unless told otherwise.
    let output_encoding = match options.output_encoding {
        Some(label) => lookup(label)?,
        None => input_options
            .internal_encoding
            .or(input_options.external_encoding),
    };
    let output_options = StreamOptions::BINARY
        .with_encoding(output_encoding, None)
        .with_newline(options.newline);
    let mut output = open_output(None, output_options)?;

    let stdin_only = [PathBuf::from("-")];
    let files = if options.files.is_empty() {
        &stdin_only[..]
    } else {
        options.files
    };

    for file in files {
        let mut input = open_input(Some(file.as_path()), input_options.clone())?;
        let copied = copy_text(&mut input, &mut output, |_| {})?;
        debug!(file = %file.display(), copied, "printed file");
        input.close()?;
    }

    output.close()?;
    Ok(())
}
