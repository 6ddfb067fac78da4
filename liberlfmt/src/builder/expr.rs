//! The expression builder: one token run in, one document out.
//!
//! Token shapes are recognised in priority order: macro references and
//! calls, blocks, guards, record/map sugar, `fun` variants, qualified and
//! local calls, bracketed groups, assignments, boolean chains, and
//! literals. Anything else joins the expression as a space-separated
//! operator word.

use crate::{
    doc::{group_force, join_space, Doc, INDENT},
    scan,
    token::{atom_text, Kind, Token},
    Error,
};

use super::clause;

/// What terminated an expression slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum End {
    /// A `,`: more expressions follow at this level.
    Comma,

    /// A `;`: another clause follows.
    Semi,

    /// A `.`: the form is complete.
    Dot,

    /// The slice ran out without a terminator.
    None,
}

/// Build an error for a token the builder cannot place.
pub(super) fn unknown(t: &Token) -> Error {
    Error::UnknownToken {
        line: t.line,
        token: t.kind.text().into_owned(),
    }
}

/// Append `d` to the last word rather than starting a new one.
fn attach(words: &mut Vec<Doc>, d: Doc) {
    match words.pop() {
        Some(last) => words.push(Doc::cons(last, d)),
        None => words.push(d),
    }
}

/// Return true when `k` can end an operand, making a following `-` or `+`
/// a binary operator rather than a sign.
fn is_operand_end(k: &Kind) -> bool {
    matches!(
        k,
        Kind::Atom(_)
            | Kind::Variable(_)
            | Kind::Integer(_)
            | Kind::Float(_)
            | Kind::Str(_)
            | Kind::Char(_)
            | Kind::ParenClose
            | Kind::BraceClose
            | Kind::BracketClose
            | Kind::BinaryClose
            | Kind::End
    )
}

/// Consume one expression run, returning its terminator, the bubbled-up
/// force-break flag, and the document.
///
/// Terminator punctuation and inline comments are folded into the word
/// that precedes them, so callers join the returned documents with plain
/// breakable spaces.
pub(crate) fn expr(ts: &[Token]) -> Result<(End, bool, Doc), Error> {
    let mut words: Vec<Doc> = Vec::new();
    let mut force = false;
    let mut end = End::None;
    let mut comprehension = false;
    let mut i = 0;

    while i < ts.len() {
        let t = &ts[i];
        match &t.kind {
            Kind::Comma => {
                end = End::Comma;
                attach(&mut words, Doc::text(","));
                i += 1;
            }
            Kind::Semicolon => {
                end = End::Semi;
                attach(&mut words, Doc::text(";"));
                i += 1;
            }
            Kind::Dot => {
                end = End::Dot;
                attach(&mut words, Doc::text("."));
                i += 1;
            }

            // An inline comment sits against the token that produced it
            // and forces the enclosing group to break.
            Kind::Comment(c) => {
                force = true;
                if words.is_empty() {
                    words.push(Doc::text(c.clone()));
                } else {
                    attach(&mut words, Doc::cons(Doc::text(" "), Doc::text(c.clone())));
                }
                i += 1;
            }

            Kind::Case | Kind::If | Kind::Receive | Kind::Try | Kind::Begin => {
                let (with_end, after) = scan::until(&ts[i + 1..], &Kind::End)?;
                let body = &with_end[..with_end.len() - 1];
                let (f, d) = match t.kind {
                    Kind::Case => clause::case_block(body)?,
                    Kind::If => clause::if_block(body)?,
                    Kind::Receive => clause::receive_block(body)?,
                    Kind::Try => clause::try_block(body)?,
                    _ => clause::begin_block(body)?,
                };
                words.push(d);
                force |= f;
                i = ts.len() - after.len();
            }

            Kind::Fun => {
                let rest = &ts[i + 1..];
                if scan::fun_is_block(rest) {
                    let (with_end, after) = scan::until(rest, &Kind::End)?;
                    let (f, d) = clause::fun_block(&with_end[..with_end.len() - 1])?;
                    words.push(d);
                    force |= f;
                    i = ts.len() - after.len();
                } else if matches!(rest.first().map(|t| &t.kind), Some(Kind::ParenOpen)) {
                    // The fun() and fun((...) -> ...) type forms.
                    let (f, d, used) = brackets(rest)?;
                    words.push(Doc::cons(Doc::text("fun"), d));
                    force |= f;
                    i += 1 + used;
                } else {
                    // An arity reference fuses into a single word.
                    let (fused, used) = fuse(rest, true).ok_or_else(|| unknown(t))?;
                    words.push(Doc::text(format!("fun {fused}")));
                    i += 1 + used;
                }
            }

            // A guard: the rest of the run hangs underneath the `when`.
            Kind::When => {
                let (e, f, d) = expr(&ts[i + 1..])?;
                words.push(Doc::cons(
                    Doc::text("when "),
                    Doc::underneath(0, Doc::group_inherit(d)),
                ));
                force |= f;
                end = e;
                i = ts.len();
            }

            // Record and map sugar: #name{...}, #name.key, #{...}.
            Kind::Hash => {
                let kinds = (
                    ts.get(i + 1).map(|t| &t.kind),
                    ts.get(i + 2).map(|t| &t.kind),
                );
                match kinds {
                    (Some(Kind::BraceOpen), _) => {
                        let (f, d, used) = brackets(&ts[i + 1..])?;
                        words.push(Doc::cons(Doc::text("#"), d));
                        force |= f;
                        i += 1 + used;
                    }
                    (Some(Kind::Atom(name)), Some(Kind::BraceOpen)) => {
                        let prefix = format!("#{}", atom_text(name));
                        let (f, d, used) = brackets(&ts[i + 2..])?;
                        words.push(Doc::cons(Doc::text(prefix), d));
                        force |= f;
                        i += 2 + used;
                    }
                    (Some(Kind::Atom(name)), Some(Kind::Period)) => {
                        match ts.get(i + 3).map(|t| &t.kind) {
                            Some(Kind::Atom(key)) => {
                                words.push(Doc::text(format!(
                                    "#{}.{}",
                                    atom_text(name),
                                    atom_text(key)
                                )));
                                i += 4;
                            }
                            _ => return Err(unknown(t)),
                        }
                    }
                    _ => return Err(unknown(t)),
                }
            }

            // The record/map forms anchored on a variable: X#name{...},
            // X#name.key, X#{...}.
            Kind::Variable(v)
                if matches!(ts.get(i + 1).map(|t| &t.kind), Some(Kind::Hash)) =>
            {
                let kinds = (
                    ts.get(i + 2).map(|t| &t.kind),
                    ts.get(i + 3).map(|t| &t.kind),
                );
                match kinds {
                    (Some(Kind::BraceOpen), _) => {
                        let (f, d, used) = brackets(&ts[i + 2..])?;
                        words.push(Doc::cons(Doc::text(format!("{v}#")), d));
                        force |= f;
                        i += 2 + used;
                    }
                    (Some(Kind::Atom(name)), Some(Kind::BraceOpen)) => {
                        let prefix = format!("{v}#{}", atom_text(name));
                        let (f, d, used) = brackets(&ts[i + 3..])?;
                        words.push(Doc::cons(Doc::text(prefix), d));
                        force |= f;
                        i += 3 + used;
                    }
                    (Some(Kind::Atom(name)), Some(Kind::Period)) => {
                        match ts.get(i + 4).map(|t| &t.kind) {
                            Some(Kind::Atom(key)) => {
                                words.push(Doc::text(format!(
                                    "{v}#{}.{}",
                                    atom_text(name),
                                    atom_text(key)
                                )));
                                i += 5;
                            }
                            _ => return Err(unknown(t)),
                        }
                    }
                    _ => return Err(unknown(t)),
                }
            }

            // Assignments and equality: group the left side with the
            // operator, then hang the right side as an equation. A
            // top-level boolean chain on the right renders piecewise so
            // each term groups on its own instead of under the operator.
            Kind::Equals | Kind::Op("==" | "=:=" | "=/=") if !words.is_empty() => {
                let op = t.kind.text().into_owned();
                let lhs_words = std::mem::take(&mut words);
                let lhs = Doc::group(Doc::cons(
                    join_space(lhs_words),
                    Doc::text(format!(" {op}")),
                ));
                let rest = &ts[i + 1..];

                if scan::until_any(rest, &[Kind::AndAlso, Kind::OrElse])?.is_some() {
                    words.push(lhs);
                    i += 1;
                    continue;
                }

                let (e, f, rhs) = expr(rest)?;
                let body = Doc::group_inherit(Doc::space(lhs, Doc::group(rhs)));
                let body = match f {
                    true => Doc::force(body),
                    false => body,
                };
                words.push(Doc::group(Doc::nest(INDENT, body)));
                force |= f;
                end = e;
                i = ts.len();
            }

            // Boolean concatenations and alternatives: each operand
            // groups on its own.
            Kind::AndAlso | Kind::OrElse | Kind::Pipe => {
                let sep = t.kind.text().into_owned();
                let rest = &ts[i + 1..];
                let stops = [Kind::AndAlso, Kind::OrElse, Kind::Pipe];
                let operand = match scan::until_any(rest, &stops)? {
                    Some((before, _, _)) => before,
                    None => rest,
                };
                let (e, f, d) = expr(operand)?;
                words.push(Doc::cons(Doc::text(format!("{sep} ")), Doc::group(d)));
                force |= f;
                if e != End::None {
                    end = e;
                }
                i += 1 + operand.len();
            }

            // A list comprehension: the qualifiers group behind the `||`
            // and the whole expression is wrapped once more at the end.
            Kind::DoublePipe => {
                let (e, f, d) = expr(&ts[i + 1..])?;
                words.push(Doc::cons(Doc::text("|| "), Doc::group(d)));
                force |= f;
                end = e;
                comprehension = true;
                i = ts.len();
            }

            Kind::ParenOpen | Kind::BraceOpen | Kind::BracketOpen | Kind::BinaryOpen => {
                let (f, d, used) = brackets(&ts[i..])?;
                words.push(d);
                force |= f;
                i += used;
            }

            // A signed number literal.
            Kind::Op(op @ ("-" | "+"))
                if (i == 0 || !is_operand_end(&ts[i - 1].kind))
                    && matches!(
                        ts.get(i + 1).map(|t| &t.kind),
                        Some(Kind::Integer(_) | Kind::Float(_))
                    ) =>
            {
                let raw = ts[i + 1].kind.text().into_owned();
                words.push(Doc::text(format!("{op}{raw}")));
                i += 2;
            }

            // Names, macro references, qualified forms, and arity
            // references fuse into a single word; parentheses directly
            // after make it a call.
            Kind::Atom(_) | Kind::Variable(_) | Kind::Question => {
                let (fused, used) = fuse(&ts[i..], false).ok_or_else(|| unknown(t))?;
                if matches!(ts.get(i + used).map(|t| &t.kind), Some(Kind::ParenOpen)) {
                    let (f, d, brackets_used) = brackets(&ts[i + used..])?;
                    words.push(Doc::cons(Doc::text(fused), d));
                    force |= f;
                    i += used + brackets_used;
                } else {
                    words.push(Doc::text(fused));
                    i += used;
                }
            }

            // An integer followed by a `:` starts a bit syntax segment
            // size and fuses; a bare integer is a word of its own.
            Kind::Integer(raw) => {
                if matches!(ts.get(i + 1).map(|t| &t.kind), Some(Kind::Colon)) {
                    let (fused, used) = fuse(&ts[i..], false).ok_or_else(|| unknown(t))?;
                    words.push(Doc::text(fused));
                    i += used;
                } else {
                    words.push(Doc::text(raw.clone()));
                    i += 1;
                }
            }

            Kind::Float(_) => {
                words.push(Doc::text(t.kind.text().into_owned()));
                i += 1;
            }

            // A string, possibly fused with a binary type specifier.
            Kind::Str(_) => {
                let text = t.kind.text().into_owned();
                let tail = (
                    ts.get(i + 1).map(|t| &t.kind),
                    ts.get(i + 2).map(|t| &t.kind),
                );
                if let (Some(Kind::Slash), Some(Kind::Atom(a))) = tail {
                    words.push(Doc::text(format!("{text}/{}", atom_text(a))));
                    i += 3;
                } else {
                    words.push(Doc::text(text));
                    i += 1;
                }
            }

            Kind::Char(_) => {
                words.push(Doc::text(t.kind.text().into_owned()));
                i += 1;
            }

            Kind::Catch => {
                words.push(Doc::text("catch"));
                i += 1;
            }

            // Loose structural tokens join as plain words: the arrow of a
            // fun type, the `::` of an inline type annotation, and the
            // operators the fusing arms above declined.
            Kind::Arrow | Kind::TypeSep | Kind::Equals | Kind::Slash | Kind::Colon => {
                words.push(Doc::text(t.kind.text().into_owned()));
                i += 1;
            }

            Kind::Op(op) => {
                words.push(Doc::text(*op));
                i += 1;
            }

            Kind::Of
            | Kind::After
            | Kind::End
            | Kind::Period
            | Kind::ParenClose
            | Kind::BraceClose
            | Kind::BracketClose
            | Kind::BinaryClose => return Err(unknown(t)),
        }
    }

    let doc = match words.len() {
        0 => Doc::nil(),
        1 => words.remove(0),
        _ => Doc::group(Doc::nest(INDENT, join_space(words))),
    };
    let doc = match comprehension {
        true => Doc::group(doc),
        false => doc,
    };

    Ok((end, force, doc))
}

/// Consume expressions from `ts` until a `;` or `.` terminator, the end
/// of the slice, or an unterminated tail.
///
/// Standalone comments become their own documents; a comment on the line
/// of the previous expression is folded into it. Both force the break.
pub(crate) fn exprs(ts: &[Token]) -> Result<(End, bool, Vec<Doc>, &[Token]), Error> {
    let mut docs: Vec<Doc> = Vec::new();
    let mut force = false;
    let mut rest = ts;
    let mut prev_line = 0u32;

    while !rest.is_empty() {
        let (slice, r) = scan::end_of_expr(rest)?;

        if let [tok] = slice {
            if let Kind::Comment(c) = &tok.kind {
                force = true;
                rest = r;
                if tok.line == prev_line {
                    attach(&mut docs, Doc::cons(Doc::text(" "), Doc::text(c.clone())));
                } else {
                    docs.push(Doc::text(c.clone()));
                }
                continue;
            }
        }

        prev_line = slice.last().map(|t| t.line).unwrap_or(prev_line);
        let (e, f, d) = expr(slice)?;
        docs.push(d);
        force |= f;
        rest = r;

        match e {
            End::Semi | End::Dot => return Ok((e, force, docs, rest)),
            End::Comma | End::None => {}
        }
    }

    Ok((End::None, force, docs, rest))
}

/// Build a bracketed group from `ts`, which starts at an opening bracket.
///
/// Returns the force flag, the document, and the number of tokens
/// consumed. Elements keep their separators, so they join with plain
/// breakable spaces; a forced element breaks the whole group.
fn brackets(ts: &[Token]) -> Result<(bool, Doc, usize), Error> {
    let (full, _rest) = scan::matching(ts)?;
    let open = full[0].kind.text().into_owned();
    let close = full[full.len() - 1].kind.text().into_owned();
    let inner = &full[1..full.len() - 1];

    if inner.is_empty() {
        return Ok((false, Doc::text(format!("{open}{close}")), full.len()));
    }

    let mut docs = Vec::new();
    let mut force = false;
    let mut rest = inner;
    while !rest.is_empty() {
        let (_e, f, ds, r) = exprs(rest)?;
        docs.extend(ds);
        force |= f;
        rest = r;
    }

    let d = Doc::concat([
        Doc::text(open),
        Doc::nest(INDENT, Doc::cons(Doc::brk(""), join_space(docs))),
        Doc::brk(""),
        Doc::text(close),
    ]);

    Ok((force, group_force(force, d), full.len()))
}

/// Fuse a `[?]name[:[?]name]*[/arity]` chain into its source text,
/// returning the text and the number of tokens consumed.
///
/// A `/integer` tail only fuses for arity-reference shapes: a bare atom
/// (`foo/1`), a qualified chain (`m:f/1`), or any chain after `fun`. A
/// `/atom` tail is a binary type specifier and always fuses.
fn fuse(ts: &[Token], fun_ref: bool) -> Option<(String, usize)> {
    let mut out = String::new();
    let mut i = 0;

    if !fuse_segment(ts, &mut i, &mut out) {
        return None;
    }
    let first_is_atom = matches!(ts.first().map(|t| &t.kind), Some(Kind::Atom(_)));

    let mut qualified = false;
    while matches!(ts.get(i).map(|t| &t.kind), Some(Kind::Colon)) {
        let mut j = i + 1;
        let mut seg = String::new();
        if !fuse_segment(ts, &mut j, &mut seg) {
            break;
        }
        out.push(':');
        out.push_str(&seg);
        qualified = true;
        i = j;
    }

    if matches!(ts.get(i).map(|t| &t.kind), Some(Kind::Slash)) {
        match ts.get(i + 1).map(|t| &t.kind) {
            Some(Kind::Atom(name)) => {
                out.push('/');
                out.push_str(&atom_text(name));
                i += 2;
            }
            Some(Kind::Integer(raw)) if fun_ref || qualified || first_is_atom => {
                out.push('/');
                out.push_str(raw);
                i += 2;
            }
            _ => {}
        }
    }

    Some((out, i))
}

/// Fuse one `[?]name` (or mid-chain integer) segment.
fn fuse_segment(ts: &[Token], i: &mut usize, out: &mut String) -> bool {
    match ts.get(*i).map(|t| &t.kind) {
        Some(Kind::Question) => match ts.get(*i + 1).map(|t| &t.kind) {
            Some(Kind::Atom(s)) | Some(Kind::Variable(s)) => {
                out.push('?');
                out.push_str(s);
                *i += 2;
                true
            }
            _ => false,
        },
        Some(Kind::Atom(name)) => {
            out.push_str(&atom_text(name));
            *i += 1;
            true
        }
        Some(Kind::Variable(name)) => {
            out.push_str(name);
            *i += 1;
            true
        }
        Some(Kind::Integer(raw)) => {
            out.push_str(raw);
            *i += 1;
            true
        }
        _ => false,
    }
}
