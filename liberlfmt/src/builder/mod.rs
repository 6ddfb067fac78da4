//! The top-level builder: forms, attributes, and the blank-line policy
//! between them.

pub(crate) mod clause;
pub(crate) mod expr;

use crate::{
    doc::{group_force, join_space, Doc, INDENT},
    scan,
    token::{atom_text, Kind, Token},
    Error,
};

/// The classification of a top-level item, driving the blank-line policy
/// between it and its neighbours.
#[derive(Debug, Clone, PartialEq)]
enum Item {
    NewFile,
    Attribute(String),
    Spec,
    Type,
    List,
    Function,
    ModuleComment,
    FunctionComment,
    Expr,
}

/// Attributes that pair up for conditional compilation; blank lines are
/// not inserted between them.
const CONDITIONAL_ATTRIBUTES: &[&str] = &[
    "define", "elif", "else", "endif", "if", "ifdef", "ifndef", "undef",
];

/// Build the whole token stream into a single document, one top-level
/// item at a time.
pub(crate) fn build(tokens: &[Token]) -> Result<Doc, Error> {
    let mut doc = Doc::nil();
    let mut prev = Item::NewFile;
    let mut ts = tokens;

    while !ts.is_empty() {
        let (tag, item_doc, rest) = item(ts)?;
        doc = match prev {
            Item::NewFile => item_doc,
            _ => Doc::cons(doc, Doc::cons(Doc::brk(separator(&prev, &tag)), item_doc)),
        };
        prev = tag;
        ts = rest;
    }

    Ok(doc)
}

/// Return the join between two adjacent top-level items: a newline keeps
/// them on consecutive lines, a double newline leaves a blank line.
fn separator(prev: &Item, cur: &Item) -> &'static str {
    match (prev, cur) {
        (Item::ModuleComment, Item::ModuleComment | Item::Expr) => "\n",
        (Item::ModuleComment, _) => "\n\n",
        (Item::FunctionComment, Item::ModuleComment) => "\n\n",
        (Item::FunctionComment, _) => "\n",
        (Item::Attribute(a), Item::Attribute(b)) if same_attribute(a, b) => "\n",
        (Item::Spec, Item::Function) => "\n",
        (Item::Type, Item::Type) => "\n",
        _ => "\n\n",
    }
}

/// Return true when attributes `a` and `b` count as the same kind.
fn same_attribute(a: &str, b: &str) -> bool {
    a == b || (CONDITIONAL_ATTRIBUTES.contains(&a) && CONDITIONAL_ATTRIBUTES.contains(&b))
}

/// Consume and build one top-level item.
fn item(ts: &[Token]) -> Result<(Item, Doc, &[Token]), Error> {
    if let Kind::Comment(c) = &ts[0].kind {
        let tag = match c.starts_with("%%") {
            true => Item::ModuleComment,
            false => Item::FunctionComment,
        };
        return Ok((tag, Doc::text(c.clone()), &ts[1..]));
    }

    // A form runs to its dot; a final fragment without one runs to the
    // end of the stream.
    let (form, rest) = match scan::until(ts, &Kind::Dot) {
        Ok(v) => v,
        Err(Error::UnexpectedEndOfInput(_)) => (ts, &ts[ts.len()..]),
        Err(e) => return Err(e),
    };

    // A function form is a named call shape with a top-level clause
    // arrow; a bare call fragment stays an expression.
    let is_function = matches!(form[0].kind, Kind::Atom(_))
        && matches!(form.get(1).map(|t| &t.kind), Some(Kind::ParenOpen))
        && scan::until_any(form, &[Kind::Arrow])?.is_some();

    if is_function {
        let (force, count, cdocs) = clause::clauses(form)?;
        let d = match count {
            1 if cdocs.len() == 1 => cdocs.into_iter().next().unwrap_or(Doc::Nil),
            _ => group_force(force, join_space(cdocs)),
        };
        return Ok((Item::Function, d, rest));
    }

    match &form[0].kind {
        Kind::Op("-") => {
            let (tag, d) = attribute(form)?;
            Ok((tag, d, rest))
        }
        Kind::BracketOpen | Kind::BraceOpen => {
            let (_, _, docs, _) = expr::exprs(form)?;
            Ok((Item::List, join_space(docs), rest))
        }
        _ => {
            let (_, force, docs, _) = expr::exprs(form)?;
            let d = match docs.len() {
                1 => docs.into_iter().next().unwrap_or(Doc::Nil),
                _ => group_force(force, join_space(docs)),
            };
            Ok((Item::Expr, d, rest))
        }
    }
}

/// Build an attribute form (`-name ...`), classifying it for the
/// blank-line policy.
fn attribute(form: &[Token]) -> Result<(Item, Doc), Error> {
    let name = match form.get(1).map(|t| &t.kind) {
        Some(Kind::Atom(s)) => s.clone(),
        Some(Kind::If) => "if".to_string(),
        Some(_) => return Err(expr::unknown(&form[1])),
        None => {
            return Err(Error::UnexpectedEndOfInput(
                "attribute without a name".to_string(),
            ))
        }
    };

    // The content sits between the name and the dot, when both exist.
    let has_dot = matches!(form.last().map(|t| &t.kind), Some(Kind::Dot));
    let end = form.len() - usize::from(has_dot);
    let content = &form[2..end];

    match name.as_str() {
        "spec" | "callback" => {
            let d = spec_attribute(&name, content)?;
            Ok((Item::Spec, d))
        }
        "type" | "opaque" => {
            let d = type_attribute(&name, content)?;
            Ok((Item::Type, d))
        }
        _ => {
            let d = plain_attribute(&name, content)?;
            Ok((Item::Attribute(name), d))
        }
    }
}

/// Build a plain attribute: parenthesised content goes through the
/// bracket group, anything else receives synthesised parentheses. Bare
/// directives (`-else.`, `-endif.`) get an empty pair.
fn plain_attribute(name: &str, content: &[Token]) -> Result<Doc, Error> {
    let prefix = format!("-{name}");
    if content.is_empty() {
        return Ok(Doc::text(format!("{prefix}().")));
    }

    let stripped = scan::remove_matching(content, &Kind::ParenOpen, &Kind::ParenClose);
    if stripped.len() != content.len() {
        let (_, _, d) = expr::expr(content)?;
        return Ok(Doc::concat([Doc::text(prefix), d, Doc::text(".")]));
    }

    let (_, force, docs, _) = expr::exprs(content)?;
    let grouped = group_force(
        force,
        Doc::concat([
            Doc::text("("),
            Doc::nest(INDENT, Doc::cons(Doc::brk(""), join_space(docs))),
            Doc::brk(""),
            Doc::text(")"),
        ]),
    );
    Ok(Doc::concat([Doc::text(prefix), grouped, Doc::text(".")]))
}

/// Build a spec or callback attribute. Multi-clause signatures align
/// every alternative under the character after the function name.
fn spec_attribute(name: &str, content: &[Token]) -> Result<Doc, Error> {
    let content = scan::remove_matching(content, &Kind::ParenOpen, &Kind::ParenClose);
    let multi = scan::until_any(content, &[Kind::Semicolon])?.is_some();

    if !multi {
        let (_, _, cdocs) = clause::clauses(content)?;
        return Ok(Doc::concat([
            Doc::text(format!("-{name} ")),
            join_space(cdocs),
            Doc::text("."),
        ]));
    }

    let (fname, used) = match content.first().map(|t| &t.kind) {
        Some(Kind::Atom(s)) => (atom_text(s).into_owned(), 1),
        Some(Kind::Question) => match content.get(1).map(|t| &t.kind) {
            Some(Kind::Atom(s)) | Some(Kind::Variable(s)) => (format!("?{s}"), 2),
            _ => return Err(expr::unknown(&content[0])),
        },
        _ => {
            return Err(Error::UnexpectedEndOfInput(
                "multi-clause signature without a name".to_string(),
            ))
        }
    };

    let (_, _, cdocs) = clause::clauses(&content[used..])?;
    Ok(Doc::concat([
        Doc::text(format!("-{name} ")),
        Doc::text(fname),
        Doc::force(Doc::underneath(0, Doc::group_inherit(join_space(cdocs)))),
        Doc::text("."),
    ]))
}

/// Build a type or opaque attribute.
fn type_attribute(name: &str, content: &[Token]) -> Result<Doc, Error> {
    let content = scan::remove_matching(content, &Kind::ParenOpen, &Kind::ParenClose);
    let (_, _, cdocs) = clause::clauses(content)?;
    Ok(Doc::concat([
        Doc::text(format!("-{name} ")),
        join_space(cdocs),
        Doc::text("."),
    ]))
}
