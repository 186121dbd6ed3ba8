//! OxiIO CLI - layered stream I/O from the command line
//!
//! Transcodes text between encodings, normalizes newlines, splits input into
//! lines or paragraphs and reports what a file's bytes look like.

mod commands;
mod utils;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use commands::{
    CatOptions, ConvertOptions, LinesOptions, cmd_cat, cmd_convert, cmd_info, cmd_lines,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use utils::NewlineArg;

#[derive(Parser)]
#[command(name = "oxiio")]
#[command(author, version, about = "OxiIO - encoding-aware stream I/O utility")]
#[command(long_about = "
OxiIO reads and writes text through a buffered, encoding-aware stream stack.
Encodings are given as WHATWG labels (utf-8, shift_jis, iso-8859-2, utf-16le)
or `binary` for raw bytes. `FROM:TO` converts while reading.

Examples:
  oxiio cat -e shift_jis:utf-8 legacy.txt
  oxiio cat --newline crlf notes.txt
  oxiio lines --paragraph --chomp README
  oxiio lines --separator ';' --json data.txt
  oxiio convert -f windows-1252 -t utf-8 input.txt output.txt
  oxiio info document.txt
  oxiio completions bash
")]
struct Cli {
    /// Log stream lifecycle events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print files (or stdin), transcoding and translating newlines
    Cat {
        /// Input files; stdin when empty or `-`
        files: Vec<PathBuf>,

        /// Input encoding spec (`EXT` or `EXT:INT`)
        #[arg(short, long, default_value = "utf-8")]
        encoding: String,

        /// Output encoding (defaults to the content encoding)
        #[arg(short, long)]
        output_encoding: Option<String>,

        /// Normalize CRLF and CR to LF while reading
        #[arg(short, long)]
        universal: bool,

        /// Newline translation applied on output
        #[arg(short, long, value_enum, default_value = "none")]
        newline: NewlineArg,
    },

    /// Split input into lines and print them one per row
    #[command(alias = "l")]
    Lines {
        /// Input file; stdin when omitted or `-`
        file: Option<PathBuf>,

        /// Input encoding spec (`EXT` or `EXT:INT`)
        #[arg(short, long, default_value = "utf-8")]
        encoding: String,

        /// Custom separator instead of newline
        #[arg(short, long, conflicts_with = "paragraph")]
        separator: Option<String>,

        /// Paragraph mode: lines are separated by blank lines
        #[arg(short, long)]
        paragraph: bool,

        /// Maximum bytes per line
        #[arg(short, long)]
        limit: Option<usize>,

        /// Strip the separator from each line
        #[arg(short, long)]
        chomp: bool,

        /// Normalize CRLF and CR to LF while reading
        #[arg(short, long)]
        universal: bool,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Transcode a file into another encoding
    #[command(alias = "c")]
    Convert {
        /// Input file
        input: PathBuf,

        /// Output file
        output: PathBuf,

        /// Input encoding (detected from a byte order mark when present)
        #[arg(short, long, default_value = "utf-8")]
        from: String,

        /// Output encoding
        #[arg(short, long, default_value = "utf-8")]
        to: String,

        /// Newline translation applied on output
        #[arg(short, long, value_enum, default_value = "none")]
        newline: NewlineArg,

        /// Show progress bar
        #[arg(short = 'P', long, default_value = "true")]
        progress: bool,
    },

    /// Report the encoding and line structure of a file
    #[command(alias = "i")]
    Info {
        /// File to inspect
        file: PathBuf,

        /// Assumed encoding when no byte order mark is found
        #[arg(short, long, default_value = "utf-8")]
        encoding: String,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Cat {
            files,
            encoding,
            output_encoding,
            universal,
            newline,
        } => cmd_cat(&CatOptions {
            files: &files,
            encoding: &encoding,
            output_encoding: output_encoding.as_deref(),
            universal,
            newline: newline.into(),
        }),
        Commands::Lines {
            file,
            encoding,
            separator,
            paragraph,
            limit,
            chomp,
            universal,
            json,
        } => cmd_lines(&LinesOptions {
            file: file.as_deref(),
            encoding: &encoding,
            separator: separator.as_deref(),
            paragraph,
            limit,
            chomp,
            universal,
            json,
        }),
        Commands::Convert {
            input,
            output,
            from,
            to,
            newline,
            progress,
        } => cmd_convert(&ConvertOptions {
            input: &input,
            output: &output,
            from: &from,
            to: &to,
            newline: newline.into(),
            progress,
        }),
        Commands::Info {
            file,
            encoding,
            json,
        } => cmd_info(&file, &encoding, json),
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "oxiio", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
