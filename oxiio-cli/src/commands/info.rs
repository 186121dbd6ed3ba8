//! Info command implementation.

use crate::utils::open_input;
use encoding_rs::UTF_8;
use oxiio_core::OxiIoError;
use oxiio_stream::StreamOptions;
use oxiio_text::encoding::lookup;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// JSON serializable file report.
#[derive(Debug, Default, Serialize, Deserialize)]
struct InfoJson {
    file: String,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bom: Option<String>,
    encoding: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    invalid_at_line: Option<u64>,
    lines: u64,
    characters: u64,
    crlf_lines: u64,
    cr_only: bool,
    longest_line: usize,
}

pub fn cmd_info(
    file: &Path,
    encoding: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let assumed = lookup(encoding)?;
    let mut stream = open_input(Some(file), StreamOptions::BINARY)?;
    let stat = stream.stat()?;

    let bom = stream.set_encoding_by_bom()?;
    let external = bom.or(assumed);
    stream.set_encoding(external, external.map(|_| UTF_8))?;

    let mut report = InfoJson {
        file: file.display().to_string(),
        kind: format!("{:?}", stat.kind),
        size: stat.size,
        bom: bom.map(|enc| enc.name().to_string()),
        encoding: oxiio_text::encoding::name(external).to_string(),
        valid: true,
        ..InfoJson::default()
    };

    let mut saw_cr = false;
    loop {
        let line = match stream.read_line() {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(OxiIoError::InvalidByteSequence { .. }) => {
                report.valid = false;
                report.invalid_at_line = Some(stream.lineno() + 1);
                break;
            }
            Err(e) => return Err(e.into()),
        };
        report.lines += 1;
        report.characters += line.chars().count() as u64;
        report.longest_line = report.longest_line.max(line.trim_end_matches(['\r', '\n']).len());
        if line.ends_with("\r\n") {
            report.crlf_lines += 1;
        }
        saw_cr |= line.contains('\r') && !line.ends_with("\r\n");
    }
    report.cr_only = saw_cr && report.crlf_lines == 0;
    stream.close()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("File Information");
    println!("================");
    println!("File: {}", report.file);
    println!("Kind: {}", report.kind);
    if let Some(size) = report.size {
        println!("Size: {} bytes", size);
    }
    match &report.bom {
        Some(bom) => println!("Byte order mark: {}", bom),
        None => println!("Byte order mark: none"),
    }
    println!("Encoding: {}", report.encoding);
    println!();
    println!("Contents:");
    if report.valid {
        println!("  Valid: yes");
    } else if let Some(line) = report.invalid_at_line {
        println!("  Valid: no (first invalid sequence on line {})", line);
    }
    println!("  Lines: {}", report.lines);
    println!("  Characters: {}", report.characters);
    println!("  CRLF lines: {}", report.crlf_lines);
    if report.cr_only {
        println!("  Line endings: CR");
    }
    println!("  Longest line: {} bytes", report.longest_line);

    Ok(())
}
