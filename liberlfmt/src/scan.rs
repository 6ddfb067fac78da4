//! Bracket- and keyword-aware slicing of the token stream.
//!
//! Every scanner tracks open brackets and `end`-terminated keywords on an
//! explicit stack and only recognises its target at the top level, so a
//! slice never crosses an unbalanced boundary.

use crate::{
    token::{Kind, Token},
    Error,
};

/// Advance the open-construct `stack` for the token at `ts[i]`.
fn track(stack: &mut Vec<Kind>, ts: &[Token], i: usize) -> Result<(), Error> {
    let t = &ts[i];

    if let Some(close) = t.kind.close_partner() {
        stack.push(close);
        return Ok(());
    }

    if t.kind.is_block_keyword() || (t.kind == Kind::Fun && fun_is_block(&ts[i + 1..])) {
        stack.push(Kind::End);
        return Ok(());
    }

    if t.kind.is_closer() {
        match stack.pop() {
            Some(expected) if expected == t.kind => {}
            _ => {
                return Err(Error::MalformedTokenStream(format!(
                    "unbalanced '{}' on line {}",
                    t.kind.text(),
                    t.line
                )))
            }
        }
    }

    Ok(())
}

/// Return true when a `fun` followed by `ts` opens an `end`-terminated
/// block.
///
/// The non-block shapes are the `fun((...) -> ...)` type form, a `fun()`
/// type not followed by a clause arrow, and the arity references
/// `[?]name[:[?]name]/int` with atom, variable, or macro segments.
pub(crate) fn fun_is_block(ts: &[Token]) -> bool {
    if let [a, b, ..] = ts {
        if a.kind == Kind::ParenOpen && b.kind == Kind::ParenOpen {
            return false;
        }
        if a.kind == Kind::ParenOpen && b.kind == Kind::ParenClose {
            // fun() -> ... end opens a block; the bare fun() type does
            // not.
            return matches!(ts.get(2).map(|t| &t.kind), Some(Kind::Arrow));
        }
    }

    let segment = |i: &mut usize| -> bool {
        if matches!(ts.get(*i), Some(t) if t.kind == Kind::Question) {
            *i += 1;
        }
        match ts.get(*i) {
            Some(t) if matches!(t.kind, Kind::Atom(_) | Kind::Variable(_)) => {
                *i += 1;
                true
            }
            _ => false,
        }
    };

    let mut i = 0;
    if !segment(&mut i) {
        return true;
    }
    if matches!(ts.get(i), Some(t) if t.kind == Kind::Colon) {
        i += 1;
        if !segment(&mut i) {
            return true;
        }
    }

    let arity = matches!(
        (ts.get(i), ts.get(i + 1)),
        (Some(s), Some(n)) if s.kind == Kind::Slash && matches!(n.kind, Kind::Integer(_))
    );
    !arity
}

/// Slice `ts` up to and including the first top-level occurrence of
/// `target`.
pub(crate) fn until<'a>(
    ts: &'a [Token],
    target: &Kind,
) -> Result<(&'a [Token], &'a [Token]), Error> {
    let mut stack = Vec::new();

    for i in 0..ts.len() {
        if stack.is_empty() && ts[i].kind == *target {
            return Ok((&ts[..=i], &ts[i + 1..]));
        }
        track(&mut stack, ts, i)?;
    }

    Err(Error::UnexpectedEndOfInput(format!(
        "no closing '{}' found",
        target.text()
    )))
}

/// Slice the bracketed run starting at `ts[0]` (an opening bracket),
/// returning the slice including both brackets and the rest.
pub(crate) fn matching<'a>(ts: &'a [Token]) -> Result<(&'a [Token], &'a [Token]), Error> {
    let close = ts
        .first()
        .and_then(|t| t.kind.close_partner())
        .ok_or_else(|| Error::MalformedTokenStream("expected an opening bracket".to_string()))?;

    let (inner, rest) = until(&ts[1..], &close)?;
    Ok((&ts[..=inner.len()], rest))
}

/// Find the first top-level token from `targets`, returning the tokens
/// before it, the token itself, and the tokens after it.
pub(crate) fn until_any<'a>(
    ts: &'a [Token],
    targets: &[Kind],
) -> Result<Option<(&'a [Token], &'a Token, &'a [Token])>, Error> {
    let mut stack = Vec::new();

    for i in 0..ts.len() {
        if stack.is_empty() && targets.contains(&ts[i].kind) {
            return Ok(Some((&ts[..i], &ts[i], &ts[i + 1..])));
        }
        track(&mut stack, ts, i)?;
    }

    Ok(None)
}

/// Slice up to a top-level `of`, returning `(before, found, rest)`.
///
/// With `stop_at_handlers` set (scanning a `try` body) a top-level `catch`
/// or `after` means the construct has no `of` section: the scan stops
/// before the handler keyword so an `of` inside it is not mistaken for
/// this construct's own. An `of` belonging to a nested `case` or `try` is
/// skipped by the stack.
pub(crate) fn until_of(
    ts: &[Token],
    stop_at_handlers: bool,
) -> Result<(&[Token], bool, &[Token]), Error> {
    let mut stack = Vec::new();

    for i in 0..ts.len() {
        if stack.is_empty() {
            match ts[i].kind {
                Kind::Of => return Ok((&ts[..i], true, &ts[i + 1..])),
                Kind::Catch | Kind::After if stop_at_handlers => {
                    return Ok((&ts[..i], false, &ts[i..]))
                }
                _ => {}
            }
        }
        track(&mut stack, ts, i)?;
    }

    Ok((ts, false, &[]))
}

/// Drop an outer matched bracket pair from `ts` without touching inner
/// ones, returning `ts` unchanged when the pair is absent.
pub(crate) fn remove_matching<'a>(ts: &'a [Token], open: &Kind, close: &Kind) -> &'a [Token] {
    if !matches!(ts.first(), Some(t) if t.kind == *open) {
        return ts;
    }

    match until(&ts[1..], close) {
        Ok((inner, rest)) if rest.is_empty() => &ts[1..inner.len()],
        _ => ts,
    }
}

/// Slice one expression from `ts`, including its terminator.
///
/// Terminators are `,`, `;`, and `.` at the top level. Within a `when`
/// guard, `,` and `;` are part of the guard until the `->` that ends it;
/// if a `::` is seen first the guard belongs to a typed attribute and ends
/// at the next `;` or `.`. A comment on the same line as the preceding
/// token travels with the slice; a comment on a later line is left in the
/// stream for the trailing-comment pass.
pub(crate) fn end_of_expr(ts: &[Token]) -> Result<(&[Token], &[Token]), Error> {
    // A leading comment is a slice of its own.
    if matches!(ts.first(), Some(t) if matches!(t.kind, Kind::Comment(_))) {
        return Ok((&ts[..1], &ts[1..]));
    }

    let mut stack = Vec::new();
    let mut in_guard = false;
    let mut typed = false;
    let mut i = 0;

    while i < ts.len() {
        let t = &ts[i];
        if stack.is_empty() {
            match &t.kind {
                Kind::Comment(_) => {
                    if i > 0 && ts[i - 1].line == t.line {
                        i += 1;
                        continue;
                    }
                    return Ok((&ts[..i], &ts[i..]));
                }
                Kind::Comma | Kind::Semicolon if in_guard && !typed => {}
                Kind::Comma if in_guard && typed => {}
                Kind::Comma | Kind::Semicolon | Kind::Dot => {
                    return Ok(split_with_comment(ts, i));
                }
                Kind::When => in_guard = true,
                Kind::TypeSep if in_guard => typed = true,
                Kind::Arrow if in_guard && !typed => in_guard = false,
                _ => {}
            }
        }
        track(&mut stack, ts, i)?;
        i += 1;
    }

    if !stack.is_empty() {
        return Err(Error::UnexpectedEndOfInput(
            "expression ended inside an unclosed construct".to_string(),
        ));
    }

    Ok((ts, &[]))
}

/// Split after the terminator at `ts[i]`, keeping a same-line trailing
/// comment with the slice.
fn split_with_comment(ts: &[Token], i: usize) -> (&[Token], &[Token]) {
    let mut end = i + 1;
    if let Some(c) = ts.get(end) {
        if matches!(c.kind, Kind::Comment(_)) && c.line == ts[i].line {
            end += 1;
        }
    }
    (&ts[..end], &ts[end..])
}
