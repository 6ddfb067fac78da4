//! The lexer producing the flat token stream the builders consume.

use crate::{
    token::{Kind, Token},
    Error,
};

/// Word operators that lex as operator tokens rather than atoms.
const WORD_OPS: &[&str] = &[
    "and", "band", "bnot", "bor", "bsl", "bsr", "bxor", "div", "not", "or", "rem", "xor",
];

/// Tokenize `input` into the flat token stream consumed by the formatter.
///
/// # Errors
///
/// Returns [`Error::Lex`] for unterminated strings or quoted atoms, bad
/// escape sequences, and characters outside the language.
pub fn tokenize(input: &str) -> Result<Vec<Token>, Error> {
    Lexer::new(input).run()
}

struct Lexer {
    src: Vec<char>,
    pos: usize,
    line: u32,
    out: Vec<Token>,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            src: input.chars().collect(),
            pos: 0,
            line: 1,
            out: Vec::new(),
        }
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.src.get(self.pos + n).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn push(&mut self, kind: Kind, line: u32) {
        self.out.push(Token::new(kind, line));
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Lex {
            line: self.line,
            message: message.into(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, Error> {
        while let Some(c) = self.peek(0) {
            let line = self.line;
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.bump();
                }
                '%' => self.comment(line),
                '\'' => self.quoted(line)?,
                '"' => self.string(line)?,
                '$' => self.char_literal(line)?,
                '0'..='9' => self.number(line),
                'a'..='z' => self.word(line),
                'A'..='Z' | '_' => self.variable(line),
                '.' => {
                    self.bump();
                    // A dot followed by whitespace, a comment, or the end of
                    // input terminates a form; anything else is the record
                    // access period.
                    match self.peek(0) {
                        None | Some(' ' | '\t' | '\r' | '\n' | '%') => self.push(Kind::Dot, line),
                        _ => self.push(Kind::Period, line),
                    }
                }
                c if c.is_alphabetic() => self.word(line),
                _ => self.operator(line)?,
            }
        }

        Ok(self.out)
    }

    fn comment(&mut self, line: u32) {
        let mut text = String::new();
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.bump();
        }
        self.push(Kind::Comment(text.trim_end().to_string()), line);
    }

    fn quoted(&mut self, line: u32) -> Result<(), Error> {
        self.bump(); // Opening quote.
        let value = self.quoted_body('\'')?;
        self.push(Kind::Atom(value), line);
        Ok(())
    }

    fn string(&mut self, line: u32) -> Result<(), Error> {
        self.bump(); // Opening quote.
        let value = self.quoted_body('"')?;
        self.push(Kind::Str(value), line);
        Ok(())
    }

    /// Consume up to and including the closing `delim`, decoding escapes.
    fn quoted_body(&mut self, delim: char) -> Result<String, Error> {
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(format!("unterminated {delim} literal"))),
                Some(c) if c == delim => return Ok(value),
                Some('\\') => value.push(self.escape()?),
                Some(c) => value.push(c),
            }
        }
    }

    fn char_literal(&mut self, line: u32) -> Result<(), Error> {
        self.bump(); // The `$`.
        let c = match self.bump() {
            None => return Err(self.error("unterminated character literal")),
            Some('\\') => self.escape()?,
            Some(c) => c,
        };
        self.push(Kind::Char(c), line);
        Ok(())
    }

    /// Decode the escape sequence following a consumed backslash.
    fn escape(&mut self) -> Result<char, Error> {
        let c = match self.bump() {
            None => return Err(self.error("unterminated escape sequence")),
            Some(c) => c,
        };

        Ok(match c {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            's' => ' ',
            'b' => '\u{8}',
            'd' => '\u{7f}',
            'e' => '\u{1b}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            'x' => return self.hex_escape(),
            '0'..='7' => {
                // Up to three octal digits, the first already consumed.
                let mut v = c as u32 - '0' as u32;
                for _ in 0..2 {
                    match self.peek(0) {
                        Some(d @ '0'..='7') => {
                            v = v * 8 + (d as u32 - '0' as u32);
                            self.bump();
                        }
                        _ => break,
                    }
                }
                char::from_u32(v).ok_or_else(|| self.error("invalid octal escape"))?
            }
            c => c,
        })
    }

    /// Decode a `\xHH` or `\x{H...}` escape, the `x` already consumed.
    fn hex_escape(&mut self) -> Result<char, Error> {
        let braced = self.peek(0) == Some('{');
        if braced {
            self.bump();
        }

        let mut v: u32 = 0;
        let mut digits = 0;
        loop {
            match self.peek(0) {
                Some(d) if d.is_ascii_hexdigit() => {
                    v = v * 16 + d.to_digit(16).unwrap_or(0);
                    digits += 1;
                    self.bump();
                }
                _ => break,
            }
            if !braced && digits == 2 {
                break;
            }
        }

        if braced && self.bump() != Some('}') {
            return Err(self.error("unterminated hex escape"));
        }
        if digits == 0 {
            return Err(self.error("empty hex escape"));
        }

        char::from_u32(v).ok_or_else(|| self.error("invalid hex escape"))
    }

    fn number(&mut self, line: u32) {
        let mut raw = String::new();
        self.digit_run(&mut raw);

        // A radix literal such as 16#beef.
        if self.peek(0) == Some('#') {
            raw.push('#');
            self.bump();
            while let Some(c) = self.peek(0) {
                if c.is_ascii_alphanumeric() || c == '_' {
                    raw.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
            self.push(Kind::Integer(raw), line);
            return;
        }

        // A float requires a digit after the dot; `1.` is an integer form
        // terminator.
        let is_float = self.peek(0) == Some('.') && self.peek(1).is_some_and(|c| c.is_ascii_digit());
        if !is_float {
            self.push(Kind::Integer(raw), line);
            return;
        }

        raw.push('.');
        self.bump();
        self.digit_run(&mut raw);

        if matches!(self.peek(0), Some('e' | 'E')) {
            let sign = matches!(self.peek(1), Some('+' | '-'));
            let first_digit = self.peek(if sign { 2 } else { 1 });
            if first_digit.is_some_and(|c| c.is_ascii_digit()) {
                raw.push(self.bump().unwrap_or_default());
                if sign {
                    raw.push(self.bump().unwrap_or_default());
                }
                self.digit_run(&mut raw);
            }
        }

        self.push(Kind::Float(raw), line);
    }

    fn digit_run(&mut self, raw: &mut String) {
        while let Some(c) = self.peek(0) {
            if c.is_ascii_digit() || c == '_' {
                raw.push(c);
                self.bump();
            } else {
                break;
            }
        }
    }

    fn word(&mut self, line: u32) {
        let mut word = String::new();
        while let Some(c) = self.peek(0) {
            if c.is_alphanumeric() || c == '_' || c == '@' {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }

        let kind = keyword_kind(&word).unwrap_or_else(|| Kind::Atom(word));
        self.push(kind, line);
    }

    fn variable(&mut self, line: u32) {
        let mut name = String::new();
        while let Some(c) = self.peek(0) {
            if c.is_alphanumeric() || c == '_' || c == '@' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        self.push(Kind::Variable(name), line);
    }

    fn operator(&mut self, line: u32) -> Result<(), Error> {
        // Multi-character operators, longest match first.
        const TABLE: &[(&str, Kind)] = &[
            ("=:=", Kind::Op("=:=")),
            ("=/=", Kind::Op("=/=")),
            ("->", Kind::Arrow),
            ("<-", Kind::Op("<-")),
            ("=>", Kind::Op("=>")),
            ("<=", Kind::Op("<=")),
            ("::", Kind::TypeSep),
            (":=", Kind::Op(":=")),
            ("||", Kind::DoublePipe),
            ("<<", Kind::BinaryOpen),
            (">>", Kind::BinaryClose),
            ("==", Kind::Op("==")),
            ("=<", Kind::Op("=<")),
            (">=", Kind::Op(">=")),
            ("/=", Kind::Op("/=")),
            ("++", Kind::Op("++")),
            ("--", Kind::Op("--")),
            ("(", Kind::ParenOpen),
            (")", Kind::ParenClose),
            ("{", Kind::BraceOpen),
            ("}", Kind::BraceClose),
            ("[", Kind::BracketOpen),
            ("]", Kind::BracketClose),
            (",", Kind::Comma),
            (";", Kind::Semicolon),
            ("|", Kind::Pipe),
            ("/", Kind::Slash),
            (":", Kind::Colon),
            ("#", Kind::Hash),
            ("?", Kind::Question),
            ("=", Kind::Equals),
            ("!", Kind::Op("!")),
            ("+", Kind::Op("+")),
            ("-", Kind::Op("-")),
            ("*", Kind::Op("*")),
            ("<", Kind::Op("<")),
            (">", Kind::Op(">")),
        ];

        for (symbol, kind) in TABLE {
            let matches = symbol
                .chars()
                .enumerate()
                .all(|(i, c)| self.peek(i) == Some(c));
            if matches {
                for _ in 0..symbol.chars().count() {
                    self.bump();
                }
                self.push(kind.clone(), line);
                return Ok(());
            }
        }

        Err(self.error(format!("unexpected character {:?}", self.peek(0).unwrap_or(' '))))
    }
}

/// Map a reserved word to its keyword or word-operator token.
fn keyword_kind(word: &str) -> Option<Kind> {
    let kind = match word {
        "case" => Kind::Case,
        "of" => Kind::Of,
        "if" => Kind::If,
        "receive" => Kind::Receive,
        "after" => Kind::After,
        "try" => Kind::Try,
        "catch" => Kind::Catch,
        "end" => Kind::End,
        "fun" => Kind::Fun,
        "begin" => Kind::Begin,
        "when" => Kind::When,
        "andalso" => Kind::AndAlso,
        "orelse" => Kind::OrElse,
        w => return WORD_OPS.iter().copied().find(|op| *op == w).map(Kind::Op),
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kinds(input: &str) -> Vec<Kind> {
        tokenize(input)
            .expect("tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_function() {
        assert_eq!(
            kinds("add(A, B) -> A + B."),
            vec![
                Kind::Atom("add".to_string()),
                Kind::ParenOpen,
                Kind::Variable("A".to_string()),
                Kind::Comma,
                Kind::Variable("B".to_string()),
                Kind::ParenClose,
                Kind::Arrow,
                Kind::Variable("A".to_string()),
                Kind::Op("+"),
                Kind::Variable("B".to_string()),
                Kind::Dot,
            ]
        );
    }

    #[test]
    fn test_dot_versus_period() {
        assert_eq!(
            kinds("X#rec.field."),
            vec![
                Kind::Variable("X".to_string()),
                Kind::Hash,
                Kind::Atom("rec".to_string()),
                Kind::Period,
                Kind::Atom("field".to_string()),
                Kind::Dot,
            ]
        );
    }

    #[test]
    fn test_quoted_atom_decoded() {
        assert_eq!(
            kinds("'two words'"),
            vec![Kind::Atom("two words".to_string())]
        );
        assert_eq!(kinds(r"'don\'t'"), vec![Kind::Atom("don't".to_string())]);
    }

    #[test]
    fn test_string_escapes_decoded() {
        assert_eq!(
            kinds(r#""a\nb""#),
            vec![Kind::Str("a\nb".to_string())]
        );
        assert_eq!(
            kinds(r#""\x41\x{42}\101""#),
            vec![Kind::Str("ABA".to_string())]
        );
    }

    #[test]
    fn test_char_literals() {
        assert_eq!(kinds("$a"), vec![Kind::Char('a')]);
        assert_eq!(kinds(r"$\n"), vec![Kind::Char('\n')]);
        assert_eq!(kinds(r"$\s"), vec![Kind::Char(' ')]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42"), vec![Kind::Integer("42".to_string())]);
        assert_eq!(kinds("16#ff"), vec![Kind::Integer("16#ff".to_string())]);
        assert_eq!(
            kinds("1_000_000"),
            vec![Kind::Integer("1_000_000".to_string())]
        );
        assert_eq!(kinds("1.5"), vec![Kind::Float("1.5".to_string())]);
        assert_eq!(kinds("1.0e-3"), vec![Kind::Float("1.0e-3".to_string())]);
        // A dot after an integer terminates the form.
        assert_eq!(
            kinds("1."),
            vec![Kind::Integer("1".to_string()), Kind::Dot]
        );
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(kinds("=:="), vec![Kind::Op("=:=")]);
        assert_eq!(kinds("=="), vec![Kind::Op("==")]);
        assert_eq!(kinds("= ="), vec![Kind::Equals, Kind::Equals]);
        assert_eq!(kinds("->"), vec![Kind::Arrow]);
        assert_eq!(kinds("::"), vec![Kind::TypeSep]);
        assert_eq!(kinds("<<>>"), vec![Kind::BinaryOpen, Kind::BinaryClose]);
        assert_eq!(kinds("||"), vec![Kind::DoublePipe]);
        assert_eq!(kinds("|"), vec![Kind::Pipe]);
    }

    #[test]
    fn test_keywords_and_word_ops() {
        assert_eq!(
            kinds("case X of _ -> ok end"),
            vec![
                Kind::Case,
                Kind::Variable("X".to_string()),
                Kind::Of,
                Kind::Variable("_".to_string()),
                Kind::Arrow,
                Kind::Atom("ok".to_string()),
                Kind::End,
            ]
        );
        assert_eq!(
            kinds("X div 2"),
            vec![
                Kind::Variable("X".to_string()),
                Kind::Op("div"),
                Kind::Integer("2".to_string()),
            ]
        );
    }

    #[test]
    fn test_comment_trimmed() {
        assert_eq!(
            kinds("%% a comment   \nok"),
            vec![
                Kind::Comment("%% a comment".to_string()),
                Kind::Atom("ok".to_string()),
            ]
        );
    }

    #[test]
    fn test_line_numbers() {
        let tokens = tokenize("a\nb\n\nc").expect("tokenize");
        let lines: Vec<u32> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 4]);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("\"oops").expect_err("must fail");
        assert!(matches!(err, Error::Lex { .. }));
    }
}
