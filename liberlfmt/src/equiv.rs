//! Token-stream equivalence checking between a source text and its
//! formatted output.
//!
//! The formatter never constructs an AST, so the safety net re-lexes both
//! texts and compares the streams. Line numbers and comments are not
//! significant, and attribute bodies compare with redundant outer
//! parentheses removed (the formatter normalises `-module foo.` to
//! `-module(foo).`, which parses identically).

use crate::{
    lexer::tokenize,
    scan,
    token::{Kind, Token},
    Error,
};

/// Return true when `before` and `after` lex to equivalent token streams.
///
/// # Errors
///
/// Returns the underlying [`Error::Lex`] when either text fails to lex;
/// for the formatter's own output that indicates a formatter bug.
pub fn equivalent(before: &str, after: &str) -> Result<bool, Error> {
    Ok(significant(&tokenize(before)?) == significant(&tokenize(after)?))
}

/// Reduce `tokens` to the kinds that must survive formatting unchanged.
fn significant(tokens: &[Token]) -> Vec<Kind> {
    let code: Vec<Token> = tokens
        .iter()
        .filter(|t| !matches!(t.kind, Kind::Comment(_)))
        .cloned()
        .collect();

    let mut out = Vec::new();
    let mut rest = code.as_slice();
    while !rest.is_empty() {
        let end = rest
            .iter()
            .position(|t| t.kind == Kind::Dot)
            .map(|i| i + 1)
            .unwrap_or(rest.len());
        let (form, r) = rest.split_at(end);
        rest = r;
        push_form(&mut out, form);
    }

    out
}

/// Append the significant kinds of one form.
fn push_form(out: &mut Vec<Kind>, form: &[Token]) {
    let has_dot = matches!(form.last().map(|t| &t.kind), Some(Kind::Dot));
    let is_attribute = form.len() >= 2
        && matches!(form[0].kind, Kind::Op("-"))
        && matches!(form[1].kind, Kind::Atom(_) | Kind::If);

    if !is_attribute {
        out.extend(form.iter().map(|t| t.kind.clone()));
        return;
    }

    let end = form.len() - usize::from(has_dot);
    let body = scan::remove_matching(&form[2..end], &Kind::ParenOpen, &Kind::ParenClose);

    out.push(form[0].kind.clone());
    out.push(form[1].kind.clone());
    out.extend(body.iter().map(|t| t.kind.clone()));
    if has_dot {
        out.push(Kind::Dot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_is_not_significant() {
        assert!(equivalent("foo( A , B ).", "foo(A, B).").unwrap());
    }

    #[test]
    fn test_comments_are_not_significant() {
        assert!(equivalent("foo(). % done", "foo().").unwrap());
    }

    #[test]
    fn test_attribute_parens_normalise() {
        assert!(equivalent("-module foo.", "-module(foo).").unwrap());
        assert!(equivalent("-spec (f() -> ok).", "-spec f() -> ok.").unwrap());
        assert!(equivalent("-endif.", "-endif().").unwrap());
    }

    #[test]
    fn test_literal_respellings_are_equivalent() {
        assert!(equivalent("'foo'.", "foo.").unwrap());
        assert!(equivalent("\"\\x41\".", "\"A\".").unwrap());
    }

    #[test]
    fn test_changed_code_is_not_equivalent() {
        assert!(!equivalent("foo(A).", "foo(B).").unwrap());
        assert!(!equivalent("foo(A).", "foo(A)").unwrap());
    }

    #[test]
    fn test_changed_numbers_keep_spelling() {
        // Radix literals must survive byte-for-byte.
        assert!(equivalent("16#ff.", "16#ff.").unwrap());
        assert!(!equivalent("16#ff.", "255.").unwrap());
    }
}
