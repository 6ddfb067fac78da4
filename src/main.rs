//   Copyright 2025 Dom Dwyer <dom@itsallbroken.com>
//
//   Licensed under the Apache License, Version 2.0 (the "License");
//   you may not use this file except in compliance with the License.
//   You may obtain a copy of the License at
//
//       http://www.apache.org/licenses/LICENSE-2.0
//
//   Unless required by applicable law or agreed to in writing, software
//   distributed under the License is distributed on an "AS IS" BASIS,
//   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//   See the License for the specific language governing permissions and
//   limitations under the License.

use std::{
    io::{BufWriter, IsTerminal, Write},
    path::{Path, PathBuf},
    string::FromUtf8Error,
};

use anstyle::Style;
use clap::{
    builder::styling::{AnsiColor, Color},
    Parser,
};
use liberlfmt::ScannedFile;
use thiserror::Error;

/// Where the formatted output is diverted when the safety check fails.
const CRASH_DUMP_PATH: &str = "erlfmt.crashdump";

/// File extensions that get the token-equivalence safety check.
const SOURCE_EXTENSIONS: &[&str] = &["erl", "hrl"];

/// Formatter of Erlang source files.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the source file to format.
    #[arg(required_unless_present = "stdin", conflicts_with = "stdin")]
    file: Option<PathBuf>,

    /// Check the input file and print a diff of any changes that would be
    /// made, without modifying it.
    #[arg(short, long)]
    check: bool,

    /// Read the input from stdin and print the formatted output to
    /// stdout.
    #[arg(long)]
    stdin: bool,

    /// The target maximum line width, in columns.
    #[arg(short, long, default_value_t = liberlfmt::DEFAULT_LINE_WIDTH)]
    line_length: usize,
}

#[derive(Debug, Error)]
enum Error {
    #[error("failed to read input file: {0}")]
    ReadFile(std::io::Error),

    #[error("formatting error: {0}")]
    Format(#[from] liberlfmt::Error),

    /// The formatted output no longer lexes to an equivalent token
    /// stream; the unsafe output was written to the crash dump instead of
    /// the input file.
    #[error("formatter broke the code in {path}: unsafe output written to {dump}")]
    BrokeTheCode {
        path: PathBuf,
        dump: &'static str,
    },

    /// Writing the crash dump file.
    #[error("failed to write crash dump: {0}")]
    WriteCrashDump(std::io::Error),

    /// Creating a temporary file for the in-place rewrite.
    #[error("failed to create temporary file in current dir: {0}")]
    CreateTempFile(std::io::Error),

    /// Flushing the formatted output through the buffered writer for the
    /// in-place rewrite.
    #[error("failed to flush formatted output: {0}")]
    FlushTempFile(std::io::Error),

    /// Persisting the formatted output over the input file.
    #[error("failed to persist formatted output: {0}")]
    SaveTempFile(std::io::Error),

    /// A non-UTF8 string was generated (likely from non-UTF8 input).
    #[error("non-utf8 string found: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// An I/O error writing to stdout.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

fn main() -> Result<(), Error> {
    let args = Args::parse();

    let input = match args.file.as_ref() {
        Some(v) => std::fs::read_to_string(v),
        None => std::io::read_to_string(std::io::stdin().lock()),
    }
    .map_err(Error::ReadFile)?;

    let scanned = ScannedFile::new(input.as_str())?;

    // Allocate a buffer to render the formatted text into, which will be
    // approximately the same length as the input.
    let mut buf = Vec::with_capacity(input.len());
    scanned.format(args.line_length, &mut buf)?;
    let output = String::from_utf8(buf)?;

    // Source files must lex to an equivalent token stream after
    // formatting; anything else is a formatter bug and the unsafe output
    // is kept away from the input file.
    if let Some(path) = args.file.as_ref() {
        if is_source_path(path) && !liberlfmt::equiv::equivalent(&input, &output)? {
            std::fs::write(CRASH_DUMP_PATH, &output).map_err(Error::WriteCrashDump)?;
            return Err(Error::BrokeTheCode {
                path: path.clone(),
                dump: CRASH_DUMP_PATH,
            });
        }
    }

    if args.check {
        return check(&input, &output);
    }

    if args.stdin {
        let mut out = std::io::stdout().lock();
        out.write_all(output.as_bytes()).map_err(Error::Io)?;
        return Ok(());
    }

    if output == input {
        return Ok(());
    }

    in_place(&args, &output)
}

/// Return true when `path` names a source file whose parse must be
/// preserved.
fn is_source_path(path: &Path) -> bool {
    path.extension()
        .and_then(|v| v.to_str())
        .is_some_and(|v| SOURCE_EXTENSIONS.contains(&v))
}

fn in_place(args: &Args, output: &str) -> Result<(), Error> {
    // For the in-place rewrite, first render to a temporary file and then
    // move it over the input path (somewhat) atomically to prevent a
    // ctrl+c or crash during execution from leaving the input file half
    // populated.
    let mut file = tempfile::Builder::new()
        .prefix(".erlfmt")
        .suffix(".tmp")
        // Tempfiles across filesystems can be problematic, so use ./
        .tempfile_in("./")
        .map_err(Error::CreateTempFile)?;

    let mut buffered = BufWriter::new(&mut file);
    buffered
        .write_all(output.as_bytes())
        .map_err(Error::FlushTempFile)?;
    buffered.flush().map_err(Error::FlushTempFile)?;
    drop(buffered);

    file.persist(args.file.as_ref().expect("in-place requires a path"))
        .map_err(|v| Error::SaveTempFile(v.error))?;

    Ok(())
}

fn check(input: &str, output: &str) -> Result<(), Error> {
    let input = input.trim_ascii();

    // If the strings match, return early.
    if output.trim_ascii() == input {
        return Ok(());
    }

    let mut out = std::io::stderr().lock();

    // Define the styles used, or skip styling if used in a script.
    let style_none = Style::new();
    let (style_add, style_rem) = match out.is_terminal() {
        true => (
            Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))),
            Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))),
        ),
        false => (style_none, style_none),
    };

    for diff in diff::lines(input, output.trim_ascii()) {
        // Reset the colour of the next line.
        style_add
            .write_reset_to(&mut out)
            .expect("reset stderr colour");

        match diff {
            diff::Result::Left(l) => writeln!(&mut out, "{style_rem}- {}", l),
            diff::Result::Both(l, _) => writeln!(&mut out, "  {}", l),
            diff::Result::Right(r) => writeln!(&mut out, "{style_add}+ {}", r),
        }
        .expect("write to stderr")
    }

    std::process::exit(3);
}
