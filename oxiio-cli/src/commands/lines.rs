//! Lines command implementation.

use crate::utils::open_input;
use oxiio_stream::StreamOptions;
use oxiio_text::{LineOptions, Newline, Separator};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// JSON serializable line record.
#[derive(Debug, Serialize, Deserialize)]
struct LineJson {
    lineno: u64,
    text: String,
    bytes: usize,
}

/// JSON output for a line listing.
#[derive(Debug, Serialize, Deserialize)]
struct LinesJson {
    source: String,
    encoding: String,
    separator: String,
    lines: Vec<LineJson>,
}

/// Options for splitting input into lines.
pub struct LinesOptions<'a> {
    pub file: Option<&'a Path>,
    pub encoding: &'a str,
    pub separator: Option<&'a str>,
    pub paragraph: bool,
    pub limit: Option<usize>,
    pub chomp: bool,
    pub universal: bool,
    pub json: bool,
}

impl LinesOptions<'_> {
    fn line_options(&self) -> LineOptions {
        let separator = if self.paragraph {
            Separator::Paragraph
        } else {
            match self.separator {
                Some(sep) => Separator::from_bytes(sep.as_bytes()),
                None => Separator::Newline,
            }
        };
        let mut options = LineOptions::new()
            .with_separator(separator)
            .with_chomp(self.chomp);
        if let Some(limit) = self.limit {
            options = options.with_limit(limit);
        }
        options
    }
}

fn describe(separator: &Separator) -> String {
    match separator {
        Separator::Newline => "newline".to_string(),
        Separator::Paragraph => "paragraph".to_string(),
        Separator::None => "none".to_string(),
        Separator::Custom(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

pub fn cmd_lines(options: &LinesOptions) -> Result<(), Box<dyn std::error::Error>> {
    let line_options = options.line_options();
    if line_options.limit == Some(0) {
        return Err("line limit must be positive".into());
    }

    let mut stream_options = StreamOptions::from_encoding_spec(options.encoding)?
        .with_line_options(line_options.clone());
    if options.universal {
        stream_options = stream_options.with_newline(Newline::Universal);
    }
    let mut stream = open_input(options.file, stream_options)?;

    if options.json {
        let mut lines = Vec::new();
        while let Some(text) = stream.read_line()? {
            lines.push(LineJson {
                lineno: stream.lineno(),
                bytes: text.len(),
                text,
            });
        }
        let output = LinesJson {
            source: options
                .file
                .map_or_else(|| "-".to_string(), |p| p.display().to_string()),
            encoding: stream.pipeline().character().encoding_name().to_string(),
            separator: describe(&line_options.separator),
            lines,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    while let Some(text) = stream.read_line()? {
        println!("{:>6}  {:?}", stream.lineno(), text);
    }
    stream.close()?;
    Ok(())
}
