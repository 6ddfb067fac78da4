//! The clause and block builder.
//!
//! A clause is `head -> body` (or `head :: body` within a type), and the
//! five `end`-terminated blocks share one template: keyword, optional
//! argument, indented clause or expression body, peer `after`/`catch`
//! tails at the block's outer indent, and the closing `end`.

use crate::{
    doc::{group_force, join_space, Doc, INDENT},
    scan,
    token::{Kind, Token},
    Error,
};

use super::expr::{self, unknown, End};

/// Build every clause in `ts`, returning the bubbled force-break flag,
/// the clause count, and one document per clause or interleaved comment.
///
/// Comments between clauses become their own lines, comments after the
/// last clause are appended as trailing lines, and more than one clause
/// forces the enclosing group to break.
pub(crate) fn clauses(ts: &[Token]) -> Result<(bool, usize, Vec<Doc>), Error> {
    let mut docs = Vec::new();
    let mut force = false;
    let mut count = 0usize;
    let mut rest = ts;

    loop {
        rest = take_comments(rest, &mut docs, &mut force);
        if rest.is_empty() {
            break;
        }

        let (f, d, end, r) = clause(rest)?;
        docs.push(d);
        force |= f;
        count += 1;
        rest = r;

        match end {
            End::Semi => {}
            _ => {
                rest = take_comments(rest, &mut docs, &mut force);
                break;
            }
        }
    }

    if count > 1 {
        force = true;
    }
    if let Some(t) = rest.first() {
        return Err(unknown(t));
    }

    Ok((force, count, docs))
}

/// Consume leading comments into their own document lines.
fn take_comments<'a>(mut ts: &'a [Token], docs: &mut Vec<Doc>, force: &mut bool) -> &'a [Token] {
    while let Some(t) = ts.first() {
        match &t.kind {
            Kind::Comment(c) => {
                docs.push(Doc::text(c.clone()));
                *force = true;
                ts = &ts[1..];
            }
            _ => break,
        }
    }
    ts
}

/// Build a single clause, returning its force flag, document, terminator,
/// and the unconsumed tail.
fn clause(ts: &[Token]) -> Result<(bool, Doc, End, &[Token]), Error> {
    let (head, sep, body) = scan::until_any(ts, &[Kind::Arrow, Kind::TypeSep])?
        .ok_or_else(|| {
            Error::UnexpectedEndOfInput("clause without a '->' separator".to_string())
        })?;

    let (_, head_force, head_doc) = expr::expr(head)?;
    let (end, body_force, body_docs, rest) = expr::exprs(body)?;

    // A type alternative hangs underneath its `::` so continuation lines
    // align with the body.
    if sep.kind == Kind::TypeSep {
        let force = head_force || body_force;
        let core = Doc::concat([
            head_doc,
            Doc::text(" :: "),
            Doc::underneath(-2, Doc::group_inherit(join_space(body_docs))),
        ]);
        return Ok((force, group_force(force, core), end, rest));
    }

    let force = head_force || body_force || body_docs.len() > 1;
    let core = Doc::concat([
        head_doc,
        Doc::text(" ->"),
        Doc::nest(INDENT, Doc::cons(Doc::brk(" "), join_space(body_docs))),
    ]);
    Ok((force, group_force(force, core), end, rest))
}

/// Build a `case Arg of Clauses end` block from the tokens between the
/// keyword and its `end`.
pub(crate) fn case_block(ts: &[Token]) -> Result<(bool, Doc), Error> {
    let (arg, found, rest) = scan::until_of(ts, false)?;
    if !found {
        return Err(Error::UnexpectedEndOfInput(
            "case without an 'of'".to_string(),
        ));
    }

    let (_, arg_force, arg_doc) = expr::expr(arg)?;
    let (clause_force, _, cdocs) = clauses(rest)?;
    let force = arg_force || clause_force;

    let core = Doc::concat([
        Doc::text("case "),
        Doc::group(arg_doc),
        Doc::text(" of"),
        Doc::nest(INDENT, Doc::cons(Doc::brk(" "), join_space(cdocs))),
        Doc::brk(" "),
        Doc::text("end"),
    ]);
    Ok((force, group_force(force, core)))
}

/// Build an `if Clauses end` block.
pub(crate) fn if_block(ts: &[Token]) -> Result<(bool, Doc), Error> {
    let (force, _, cdocs) = clauses(ts)?;

    let core = Doc::concat([
        Doc::text("if"),
        Doc::nest(INDENT, Doc::cons(Doc::brk(" "), join_space(cdocs))),
        Doc::brk(" "),
        Doc::text("end"),
    ]);
    Ok((force, group_force(force, core)))
}

/// Build a `receive Clauses [after Clauses] end` block; the `after` is a
/// peer of the `receive` at the block's outer indent.
pub(crate) fn receive_block(ts: &[Token]) -> Result<(bool, Doc), Error> {
    let (body, after) = match scan::until_any(ts, &[Kind::After])? {
        Some((before, _, rest)) => (before, Some(rest)),
        None => (ts, None),
    };

    let (mut force, mut total, cdocs) = clauses(body)?;
    let mut parts = vec![Doc::text("receive")];
    if !cdocs.is_empty() {
        parts.push(Doc::nest(
            INDENT,
            Doc::cons(Doc::brk(" "), join_space(cdocs)),
        ));
    }

    if let Some(after_body) = after {
        let (f, n, adocs) = clauses(after_body)?;
        force |= f;
        total += n;
        parts.push(Doc::brk(" "));
        parts.push(Doc::text("after"));
        parts.push(Doc::nest(
            INDENT,
            Doc::cons(Doc::brk(" "), join_space(adocs)),
        ));
    }

    if total > 1 {
        force = true;
    }

    parts.push(Doc::brk(" "));
    parts.push(Doc::text("end"));
    Ok((force, group_force(force, Doc::concat(parts))))
}

/// Build a `try ... [of ...] [catch ...] [after ...] end` block.
pub(crate) fn try_block(ts: &[Token]) -> Result<(bool, Doc), Error> {
    let (body, has_of, mut rest) = scan::until_of(ts, true)?;
    let (_, body_force, body_docs, _) = expr::exprs(body)?;
    let mut force = body_force;
    let mut total = body_docs.len();

    let mut parts = Vec::new();
    if has_of {
        let (head_part, tail) = match scan::until_any(rest, &[Kind::Catch, Kind::After])? {
            Some((before, _, _)) => (before, &rest[before.len()..]),
            None => (rest, &rest[rest.len()..]),
        };
        let (f, n, cdocs) = clauses(head_part)?;
        force |= f;
        total += n;
        parts.push(Doc::text("try "));
        parts.push(Doc::group(join_space(body_docs)));
        parts.push(Doc::text(" of"));
        parts.push(Doc::nest(
            INDENT,
            Doc::cons(Doc::brk(" "), join_space(cdocs)),
        ));
        rest = tail;
    } else {
        parts.push(Doc::text("try"));
        parts.push(Doc::nest(
            INDENT,
            Doc::cons(Doc::brk(" "), join_space(body_docs)),
        ));
    }

    if matches!(rest.first().map(|t| &t.kind), Some(Kind::Catch)) {
        let after_catch = &rest[1..];
        let (handlers, tail) = match scan::until_any(after_catch, &[Kind::After])? {
            Some((before, _, _)) => (before, &after_catch[before.len()..]),
            None => (after_catch, &after_catch[after_catch.len()..]),
        };
        let (f, n, hdocs) = clauses(handlers)?;
        force |= f;
        total += n;
        parts.push(Doc::brk(" "));
        parts.push(Doc::text("catch"));
        parts.push(Doc::nest(
            INDENT,
            Doc::cons(Doc::brk(" "), join_space(hdocs)),
        ));
        rest = tail;
    }

    if matches!(rest.first().map(|t| &t.kind), Some(Kind::After)) {
        let (_, f, adocs, _) = expr::exprs(&rest[1..])?;
        force |= f;
        total += adocs.len();
        parts.push(Doc::brk(" "));
        parts.push(Doc::text("after"));
        parts.push(Doc::nest(
            INDENT,
            Doc::cons(Doc::brk(" "), join_space(adocs)),
        ));
    }

    if total > 1 {
        force = true;
    }

    parts.push(Doc::brk(" "));
    parts.push(Doc::text("end"));
    Ok((force, group_force(force, Doc::concat(parts))))
}

/// Build a `begin Exprs end` block.
pub(crate) fn begin_block(ts: &[Token]) -> Result<(bool, Doc), Error> {
    let (_, body_force, body_docs, _) = expr::exprs(ts)?;
    let force = body_force || body_docs.len() > 1;

    let core = Doc::concat([
        Doc::text("begin"),
        Doc::nest(INDENT, Doc::cons(Doc::brk(" "), join_space(body_docs))),
        Doc::brk(" "),
        Doc::text("end"),
    ]);
    Ok((force, group_force(force, core)))
}

/// Build the block form of `fun`: `fun Clauses end`.
pub(crate) fn fun_block(ts: &[Token]) -> Result<(bool, Doc), Error> {
    let (force, _, cdocs) = clauses(ts)?;

    // An anonymous fun hugs its argument list (`fun(X)`); a named fun
    // needs the space between the keyword and the name (`fun Self()`).
    let lead = match ts.first().map(|t| &t.kind) {
        Some(Kind::ParenOpen) => Doc::brk(""),
        _ => Doc::brk(" "),
    };

    let core = Doc::concat([
        Doc::text("fun"),
        Doc::nest(INDENT, Doc::cons(lead, join_space(cdocs))),
        Doc::brk(" "),
        Doc::text("end"),
    ]);
    Ok((force, group_force(force, core)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{doc::pretty, lexer::tokenize};

    fn build_block(input: &str, width: usize) -> String {
        let ts = tokenize(input).expect("tokenize");
        let (_, _, d) = expr::expr(&ts).expect("build");
        pretty(&d, width)
    }

    #[test]
    fn test_case_single_clause_stays_flat() {
        assert_eq!(
            build_block("case X of ok -> done end", 100),
            "case X of ok -> done end\n"
        );
    }

    #[test]
    fn test_case_multiple_clauses_break() {
        assert_eq!(
            build_block("case X of a -> 1; b -> 2 end", 100),
            "case X of\n    a -> 1;\n    b -> 2\nend\n"
        );
    }

    #[test]
    fn test_case_clause_guard() {
        assert_eq!(
            build_block("case X of N when N > 0 -> pos; _ -> neg end", 100),
            "case X of\n    N when N > 0 -> pos;\n    _ -> neg\nend\n"
        );
    }

    #[test]
    fn test_if_block() {
        assert_eq!(
            build_block("if X > 0 -> a; true -> b end", 100),
            "if\n    X > 0 -> a;\n    true -> b\nend\n"
        );
    }

    #[test]
    fn test_receive_with_after() {
        assert_eq!(
            build_block("receive {msg, X} -> X after 1000 -> timeout end", 100),
            "receive\n    {msg, X} -> X\nafter\n    1000 -> timeout\nend\n"
        );
    }

    #[test]
    fn test_receive_after_only() {
        assert_eq!(
            build_block("receive after 0 -> ok end", 100),
            "receive after 0 -> ok end\n"
        );
        assert_eq!(
            build_block("receive after 0 -> ok end", 20),
            "receive\nafter\n    0 -> ok\nend\n"
        );
    }

    #[test]
    fn test_try_catch() {
        assert_eq!(
            build_block("try f() catch error:Reason -> {error, Reason} end", 100),
            "try\n    f()\ncatch\n    error:Reason -> {error, Reason}\nend\n"
        );
    }

    #[test]
    fn test_try_of_catch_after() {
        assert_eq!(
            build_block(
                "try f() of ok -> done catch _:_ -> oops after cleanup() end",
                100
            ),
            "try f() of\n    ok -> done\ncatch\n    _:_ -> oops\nafter\n    cleanup()\nend\n"
        );
    }

    #[test]
    fn test_begin_block() {
        assert_eq!(
            build_block("begin a(), b() end", 100),
            "begin\n    a(),\n    b()\nend\n"
        );
    }

    #[test]
    fn test_fun_block() {
        assert_eq!(build_block("fun(X) -> X end", 100), "fun(X) -> X end\n");
        assert_eq!(build_block("fun() -> ok end", 100), "fun() -> ok end\n");
        assert_eq!(
            build_block("fun(a) -> 1; (b) -> 2 end", 100),
            "fun\n    (a) -> 1;\n    (b) -> 2\nend\n"
        );
    }

    #[test]
    fn test_named_fun_block() {
        assert_eq!(
            build_block("fun Go(0) -> done; Go(N) -> Go(N - 1) end", 100),
            "fun\n    Go(0) -> done;\n    Go(N) -> Go(N - 1)\nend\n"
        );
    }

    /// A short named single-clause fun keeps the space after the keyword
    /// when it renders flat.
    #[test]
    fn test_named_fun_block_stays_flat() {
        assert_eq!(
            build_block("fun Self() -> Self() end", 100),
            "fun Self() -> Self() end\n"
        );
    }

    #[test]
    fn test_block_comments_trail() {
        assert_eq!(
            build_block("case X of a -> 1 % one\nend", 100),
            "case X of\n    a -> 1 % one\nend\n"
        );
    }
}
