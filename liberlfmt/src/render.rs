//! Serialisation of laid-out documents to text.

use crate::doc::SDoc;

/// Render the laid-out `stream` to a string.
///
/// Lines never carry trailing whitespace, blank lines are empty, and the
/// output ends with exactly one newline.
pub(crate) fn render(stream: &[SDoc<'_>]) -> String {
    let mut out = String::new();

    for event in stream {
        match event {
            SDoc::Text(s) => out.push_str(s),
            SDoc::Line(indent) => {
                trim_line(&mut out);
                out.push('\n');
                for _ in 0..*indent {
                    out.push(' ');
                }
            }
        }
    }

    while out.ends_with([' ', '\n']) {
        out.pop();
    }
    out.push('\n');

    out
}

/// Remove trailing spaces from the line currently being built.
fn trim_line(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_newline() {
        assert_eq!(render(&[SDoc::Text("a")]), "a\n");
        assert_eq!(render(&[SDoc::Text("a"), SDoc::Line(0)]), "a\n");
    }

    #[test]
    fn test_line_indent() {
        let got = render(&[SDoc::Text("a"), SDoc::Line(4), SDoc::Text("b")]);
        assert_eq!(got, "a\n    b\n");
    }

    #[test]
    fn test_no_trailing_spaces() {
        let got = render(&[SDoc::Text("a "), SDoc::Line(4), SDoc::Text("b")]);
        assert_eq!(got, "a\n    b\n");
    }

    #[test]
    fn test_blank_line_has_no_indent() {
        let got = render(&[
            SDoc::Text("a"),
            SDoc::Line(0),
            SDoc::Line(4),
            SDoc::Text("b"),
        ]);
        assert_eq!(got, "a\n\n    b\n");
    }

    #[test]
    fn test_empty_stream() {
        assert_eq!(render(&[]), "\n");
    }
}
