//! The document algebra the formatter lays text out with.
//!
//! Documents follow Lindig's *Strictly Pretty* (2000): a tree of text,
//! break points, indentation and groups, rendered by deciding per group
//! whether its contents fit flat on the remaining line. Two extensions
//! carry the formatting rules of the source language: groups may inherit
//! the break decision of their parent (so a forced break deep in an
//! expression breaks the enclosing call or list too), and `Underneath`
//! anchors the indent of a subtree to the current output column.

use crate::render;

/// The number of spaces added per nesting level.
pub(crate) const INDENT: i32 = 4;

/// A lazily laid-out document.
#[derive(Debug, Clone, PartialEq)]
pub enum Doc {
    /// The empty document.
    Nil,

    /// Two documents in sequence.
    Cons(Box<Doc>, Box<Doc>),

    /// An inline literal; its width is its byte length.
    Text(String),

    /// A break point.
    ///
    /// Renders as the literal in flat mode and as a newline plus the
    /// current indent in break mode. A `"\n"` literal renders as a newline
    /// in both modes, and `"\n\n"` as a blank line followed by the indent.
    Break(&'static str),

    /// Adds the offset to the current indent for the inner document.
    Nest(i32, Box<Doc>),

    /// Sets the indent of the inner document to the current output column
    /// plus the offset.
    Underneath(i32, Box<Doc>),

    /// A layout unit, rendered entirely flat or entirely broken.
    Group(Box<Doc>, Inherit),

    /// Renders the inner document in break mode regardless of fit.
    ForceBreak(Box<Doc>),
}

/// How a [`Doc::Group`] arrives at its flat-or-break decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inherit {
    /// The group makes a fresh fit decision.
    Fresh,

    /// The group adopts the mode of its enclosing group, propagating a
    /// forced break downwards.
    Inherited,
}

impl Doc {
    /// The empty document.
    pub fn nil() -> Self {
        Self::Nil
    }

    /// An inline text literal.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// A break point rendering as `s` when flat.
    pub fn brk(s: &'static str) -> Self {
        Self::Break(s)
    }

    /// `a` followed by `b`.
    pub fn cons(a: Self, b: Self) -> Self {
        Self::Cons(Box::new(a), Box::new(b))
    }

    /// All of `docs` in sequence.
    pub fn concat(docs: impl IntoIterator<Item = Self>) -> Self {
        let mut iter = docs.into_iter();
        let first = match iter.next() {
            Some(v) => v,
            None => return Self::Nil,
        };
        iter.fold(first, Self::cons)
    }

    /// `a` and `b` separated by a breakable space.
    pub fn space(a: Self, b: Self) -> Self {
        Self::cons(a, Self::cons(Self::brk(" "), b))
    }

    /// Indent the breaks within `d` by a further `n` columns.
    pub fn nest(n: i32, d: Self) -> Self {
        Self::Nest(n, Box::new(d))
    }

    /// Anchor the indent of `d` to the current column plus `n`.
    pub fn underneath(n: i32, d: Self) -> Self {
        Self::Underneath(n, Box::new(d))
    }

    /// A group making a fresh layout decision.
    pub fn group(d: Self) -> Self {
        Self::Group(Box::new(d), Inherit::Fresh)
    }

    /// A group adopting its parent's layout decision.
    pub fn group_inherit(d: Self) -> Self {
        Self::Group(Box::new(d), Inherit::Inherited)
    }

    /// Render `d` in break mode unconditionally.
    pub fn force(d: Self) -> Self {
        Self::ForceBreak(Box::new(d))
    }
}

/// Group `d`, force-breaking it when `force` is set.
///
/// The forced variant pairs `ForceBreak` with an inheriting group so the
/// break decision reaches every break point within `d`.
pub(crate) fn group_force(force: bool, d: Doc) -> Doc {
    if force {
        Doc::force(Doc::group_inherit(d))
    } else {
        Doc::group(d)
    }
}

/// Join `docs` with breakable spaces.
pub(crate) fn join_space(docs: Vec<Doc>) -> Doc {
    let mut iter = docs.into_iter();
    let first = match iter.next() {
        Some(v) => v,
        None => return Doc::Nil,
    };
    iter.fold(first, Doc::space)
}

/// A laid-out document event.
#[derive(Debug, PartialEq)]
pub(crate) enum SDoc<'a> {
    /// Literal text.
    Text(&'a str),

    /// A newline followed by the given number of indent spaces.
    Line(usize),
}

/// The layout mode of a stack entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Flat,
    Break,
}

/// Lay `doc` out against the target `width`, producing the flat event
/// stream the renderer serialises.
///
/// The walk keeps an explicit stack of `(indent, mode, doc)` entries so
/// deeply nested input cannot exhaust the call stack.
pub(crate) fn format(doc: &Doc, width: usize) -> Vec<SDoc<'_>> {
    let mut out = Vec::new();
    let mut col = 0usize;
    let mut stack: Vec<(i32, Mode, &Doc)> = vec![(0, Mode::Break, doc)];

    while let Some((indent, mode, d)) = stack.pop() {
        match d {
            Doc::Nil => {}
            Doc::Cons(a, b) => {
                stack.push((indent, mode, b));
                stack.push((indent, mode, a));
            }
            Doc::Text(s) => {
                out.push(SDoc::Text(s));
                col += s.len();
            }
            Doc::Nest(n, x) => stack.push((indent + n, mode, x)),
            Doc::Underneath(n, x) => stack.push(((col as i32 + n).max(0), mode, x)),
            Doc::Break(s) if s.contains('\n') => {
                // Newline literals render as line breaks in both modes; a
                // double newline leaves a blank line with no indent on it.
                if *s == "\n\n" {
                    out.push(SDoc::Line(0));
                }
                let ind = indent.max(0) as usize;
                out.push(SDoc::Line(ind));
                col = ind;
            }
            Doc::Break(s) => match mode {
                Mode::Flat => {
                    out.push(SDoc::Text(s));
                    col += s.len();
                }
                Mode::Break => {
                    let ind = indent.max(0) as usize;
                    out.push(SDoc::Line(ind));
                    col = ind;
                }
            },
            Doc::ForceBreak(x) => stack.push((indent, Mode::Break, x)),
            Doc::Group(x, Inherit::Inherited) if mode == Mode::Break => {
                stack.push((indent, Mode::Break, x));
            }
            Doc::Group(x, _) => {
                let mode = match fits(width as i64 - col as i64, x) {
                    true => Mode::Flat,
                    false => Mode::Break,
                };
                stack.push((indent, mode, x));
            }
        }
    }

    out
}

/// Return true when `doc` rendered flat fits within `remaining` columns.
///
/// The probe is lazy: it stops at the first newline literal or forced
/// break (both already accepted by the caller) and fails as soon as the
/// consumed width goes negative, bounding the work per group by the flat
/// length of the group plus one.
fn fits(mut remaining: i64, doc: &Doc) -> bool {
    let mut stack: Vec<&Doc> = vec![doc];

    loop {
        if remaining < 0 {
            return false;
        }

        let d = match stack.pop() {
            Some(v) => v,
            None => return true,
        };

        match d {
            Doc::Nil => {}
            Doc::Cons(a, b) => {
                stack.push(b);
                stack.push(a);
            }
            Doc::Text(s) => remaining -= s.len() as i64,
            Doc::Nest(_, x) | Doc::Underneath(_, x) => stack.push(x),
            Doc::Break(s) if s.contains('\n') => return true,
            Doc::Break(s) => remaining -= s.len() as i64,
            Doc::ForceBreak(_) => return true,
            Doc::Group(x, _) => stack.push(x),
        }
    }
}

/// Render `doc` against the target `width`.
///
/// The root is wrapped in a fresh group so the whole document is a layout
/// unit of its own.
pub fn pretty(doc: &Doc, width: usize) -> String {
    let root = Doc::group(doc.clone());
    render::render(&format(&root, width))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// The binary operator document from the Lindig paper, indent 2.
    fn binop(left: &str, op: &str, right: &str) -> Doc {
        Doc::group(Doc::nest(
            2,
            Doc::cons(
                Doc::group(Doc::cons(
                    Doc::text(left),
                    Doc::cons(Doc::brk(" "), Doc::text(op)),
                )),
                Doc::cons(Doc::brk(" "), Doc::text(right)),
            ),
        ))
    }

    /// The conditional document from the Lindig paper, indent 2.
    fn ifthen(cond: Doc, expr1: Doc, expr2: Doc) -> Doc {
        Doc::group(Doc::concat([
            Doc::group(Doc::nest(
                2,
                Doc::concat([Doc::text("if"), Doc::brk(" "), cond]),
            )),
            Doc::brk(" "),
            Doc::group(Doc::nest(
                2,
                Doc::concat([Doc::text("then"), Doc::brk(" "), expr1]),
            )),
            Doc::brk(" "),
            Doc::group(Doc::nest(
                2,
                Doc::concat([Doc::text("else"), Doc::brk(" "), expr2]),
            )),
        ]))
    }

    fn paper_example() -> Doc {
        ifthen(
            binop("a", "==", "b"),
            binop("a", "<<", "2"),
            binop("a", "+", "b"),
        )
    }

    #[test]
    fn test_paper_example_widths() {
        let cases = [
            (100, "if a == b then a << 2 else a + b\n"),
            (32, "if a == b then a << 2 else a + b\n"),
            (15, "if a == b\nthen a << 2\nelse a + b\n"),
            (10, "if a == b\nthen\n  a << 2\nelse a + b\n"),
            (8, "if\n  a == b\nthen\n  a << 2\nelse\n  a + b\n"),
            (7, "if\n  a ==\n    b\nthen\n  a <<\n    2\nelse\n  a + b\n"),
            (6, "if\n  a ==\n    b\nthen\n  a <<\n    2\nelse\n  a +\n    b\n"),
        ];

        for (width, want) in cases {
            assert_eq!(pretty(&paper_example(), width), want, "width {width}");
        }
    }

    #[test]
    fn test_text_concat() {
        let doc = Doc::concat([Doc::text("a"), Doc::text("b"), Doc::text("c")]);
        assert_eq!(pretty(&doc, 80), "abc\n");
    }

    #[test]
    fn test_group_break_is_all_or_nothing() {
        let doc = Doc::group(Doc::concat([
            Doc::text("a"),
            Doc::brk(" "),
            Doc::text("b"),
            Doc::brk(" "),
            Doc::text("c"),
        ]));

        assert_eq!(pretty(&doc, 80), "a b c\n");
        assert_eq!(pretty(&doc, 3), "a\nb\nc\n");
    }

    #[test]
    fn test_force_break() {
        let doc = Doc::force(Doc::group_inherit(Doc::concat([
            Doc::text("a"),
            Doc::brk(" "),
            Doc::text("b"),
        ])));

        assert_eq!(pretty(&doc, 80), "a\nb\n");
    }

    /// A forced subtree does not stop the enclosing group from laying out
    /// flat: the probe treats it as an immediate success.
    #[test]
    fn test_force_break_is_invisible_to_fit() {
        let doc = Doc::group(Doc::concat([
            Doc::text("a"),
            Doc::brk(" "),
            Doc::force(Doc::group_inherit(Doc::text("b"))),
        ]));

        assert_eq!(pretty(&doc, 80), "a b\n");
    }

    /// A fresh group under a forced break still makes its own decision.
    #[test]
    fn test_fresh_group_resets_forced_mode() {
        let doc = Doc::force(Doc::group_inherit(Doc::concat([
            Doc::text("a"),
            Doc::brk(" "),
            Doc::group(Doc::concat([Doc::text("b"), Doc::brk(" "), Doc::text("c")])),
        ])));

        assert_eq!(pretty(&doc, 80), "a\nb c\n");
    }

    #[test]
    fn test_newline_break_renders_in_flat_mode() {
        let doc = Doc::group(Doc::concat([
            Doc::text("a"),
            Doc::brk("\n"),
            Doc::text("b"),
        ]));

        assert_eq!(pretty(&doc, 80), "a\nb\n");
    }

    #[test]
    fn test_double_newline_break_leaves_blank_line() {
        let doc = Doc::concat([Doc::text("a"), Doc::brk("\n\n"), Doc::text("b")]);
        assert_eq!(pretty(&doc, 80), "a\n\nb\n");
    }

    #[test]
    fn test_nest_indents_breaks() {
        let doc = Doc::group(Doc::concat([
            Doc::text("("),
            Doc::nest(
                4,
                Doc::concat([Doc::brk(""), Doc::text("a,"), Doc::brk(" "), Doc::text("b")]),
            ),
            Doc::brk(""),
            Doc::text(")"),
        ]));

        assert_eq!(pretty(&doc, 80), "(a, b)\n");
        assert_eq!(pretty(&doc, 4), "(\n    a,\n    b\n)\n");
    }

    #[test]
    fn test_underneath_anchors_to_column() {
        let doc = Doc::cons(
            Doc::text("name"),
            Doc::force(Doc::underneath(
                0,
                Doc::group_inherit(Doc::concat([
                    Doc::text("(a) -> b;"),
                    Doc::brk(" "),
                    Doc::text("(c) -> d."),
                ])),
            )),
        );

        assert_eq!(pretty(&doc, 80), "name(a) -> b;\n    (c) -> d.\n");
    }

    #[test]
    fn test_underneath_negative_offset() {
        let doc = Doc::cons(
            Doc::text("x :: "),
            Doc::force(Doc::underneath(
                -2,
                Doc::group_inherit(Doc::concat([Doc::text("a"), Doc::brk(" "), Doc::text("b")])),
            )),
        );

        assert_eq!(pretty(&doc, 80), "x :: a\n   b\n");
    }

    #[test]
    fn test_exact_width_fits() {
        let doc = Doc::group(Doc::concat([
            Doc::text("aaaa"),
            Doc::brk(" "),
            Doc::text("bbbb"),
        ]));

        assert_eq!(pretty(&doc, 9), "aaaa bbbb\n");
        assert_eq!(pretty(&doc, 8), "aaaa\nbbbb\n");
    }
}
