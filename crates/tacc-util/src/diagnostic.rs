//! Caret-style rendering of a single source line, for the parser's one
//! fatal diagnostic. This crate only renders the line-plus-caret
//! fragment; `tacc-drv` owns assembling it
//! together with the `file:line:col:` header and the expected/actual
//! token lines, since printing to stderr and calling `process::exit` are
//! process-level concerns that belong in the binary, not a library.

/// Render `source_line` followed by a line with a caret (`^`) under
/// `column` (1-based). Tabs in the source line are rendered as a single
/// space in the caret line, matching the column arithmetic the lexer
/// itself uses (a tab advances the column by one, not by a tab stop).
///
/// ```
/// use tacc_util::diagnostic::render_caret;
/// let out = render_caret("def = 5", 5);
/// assert_eq!(out, "def = 5\n    ^");
/// ```
pub fn render_caret(source_line: &str, column: u32) -> String {
    let pad = " ".repeat((column.saturating_sub(1)) as usize);
    format!("{source_line}\n{pad}^")
}

/// Extract the 1-based `line_number`th line from `source`, or an empty
/// string if the source has fewer lines (should not happen for a
/// well-formed span, but the fallback keeps error reporting infallible).
pub fn source_line(source: &str, line_number: u32) -> &str {
    source
        .lines()
        .nth((line_number.saturating_sub(1)) as usize)
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_points_at_column() {
        let out = render_caret("abc", 2);
        assert_eq!(out, "abc\n ^");
    }

    #[test]
    fn source_line_picks_correct_line() {
        let src = "first\nsecond\nthird";
        assert_eq!(source_line(src, 2), "second");
    }

    #[test]
    fn source_line_out_of_range_is_empty() {
        let src = "only";
        assert_eq!(source_line(src, 5), "");
    }
}
