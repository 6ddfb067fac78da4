#![doc = include_str!("../README.md")]

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

mod builder;
mod doc;
pub mod equiv;
mod lexer;
mod render;
mod scan;
mod test_utils;
mod token;

use std::io::Write;

use thiserror::Error;

pub use doc::{pretty, Doc, Inherit};
pub use lexer::tokenize;
pub use token::{Kind, Token};

/// The default target line width.
pub const DEFAULT_LINE_WIDTH: usize = 100;

/// Errors during lexing, document building or rendering.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error writing to the output sink.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not lexically valid source.
    #[error("syntax error on line {line}: {message}")]
    Lex {
        /// The 1-based line the error was found on.
        line: u32,
        /// What the lexer could not accept.
        message: String,
    },

    /// The scanner stack underflowed, or a bracket or keyword was never
    /// closed.
    #[error("malformed token stream: {0}")]
    MalformedTokenStream(String),

    /// The builder ran out of tokens mid-construct.
    #[error("unexpected end of input: {0}")]
    UnexpectedEndOfInput(String),

    /// The builder encountered a token it cannot place.
    #[error("unknown token '{token}' on line {line}")]
    UnknownToken {
        /// The 1-based line of the offending token.
        line: u32,
        /// The rendered token text.
        token: String,
    },
}

/// A lexed source file ready for formatting.
#[derive(Debug)]
pub struct ScannedFile {
    tokens: Vec<Token>,
}

impl ScannedFile {
    /// Lex `input` into a token stream.
    pub fn new(input: &str) -> Result<Self, Error> {
        Ok(Self {
            tokens: lexer::tokenize(input)?,
        })
    }

    /// Format the file against `width` and write the result to `out`.
    ///
    /// # Errors
    ///
    /// If formatting fails `out` is left untouched; the text is rendered
    /// in full before any of it is written.
    pub fn format<W>(&self, width: usize, mut out: W) -> Result<(), Error>
    where
        W: Write,
    {
        let text = format_tokens(&self.tokens, width)?;
        out.write_all(text.as_bytes())?;
        Ok(())
    }

    /// The lexed token stream.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

/// Format a token stream against the target line width.
///
/// Line-fit decisions use the byte length of token text, and the output
/// always ends with exactly one newline.
pub fn format_tokens(tokens: &[Token], width: usize) -> Result<String, Error> {
    let doc = builder::build(tokens)?;
    Ok(doc::pretty(&doc, width))
}
