//! Error display with source context

use msl_api::MslError;
use std::fmt::Write;

/// Print an error followed by the offending source lines
pub fn print_error_with_source(e: &MslError, source: &str) {
    match e {
        MslError::Lexer(errors) => {
            for error in errors {
                eprintln!("error: {}", error);
                eprint!("{}", source_context(source, error.line(), error.column()));
            }
        }
        _ => {
            eprintln!("error: {}", e);
            if let (Some(line), Some(col)) = (e.line(), e.column()) {
                eprint!("{}", source_context(source, line, col));
            }
        }
    }
}

pub fn print_source_context(source: &str, error_line: usize, error_col: usize) {
    eprint!("{}", source_context(source, error_line, error_col));
}

/// Up to two lines before the error line, then a caret under the column
///
/// An error at the end of input may sit one line past the last line, in
/// which case an empty line is shown.
pub fn source_context(source: &str, error_line: usize, error_col: usize) -> String {
    const CONTEXT_LINES: usize = 2;

    let mut lines: Vec<&str> = source.lines().collect();
    if source.ends_with('\n') || lines.is_empty() {
        lines.push("");
    }
    if error_line == 0 || error_line > lines.len() {
        return String::new();
    }

    let start_line = error_line.saturating_sub(CONTEXT_LINES).max(1);
    let width = error_line.to_string().len();
    let mut out = String::new();

    for line_no in start_line..=error_line {
        let _ = writeln!(out, "{:>width$} | {}", line_no, lines[line_no - 1]);
    }
    let _ = writeln!(
        out,
        "{:>width$} | {}^",
        "",
        " ".repeat(error_col.saturating_sub(1))
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caret_under_column() {
        let context = source_context("A,\nB,\n  C+", 3, 4);
        assert_eq!(context, "1 | A,\n2 | B,\n3 |   C+\n  |    ^\n");
    }

    #[test]
    fn test_eof_past_trailing_newline() {
        let context = source_context("W(\n", 2, 1);
        assert!(context.ends_with("2 | \n  | ^\n"));
    }

    #[test]
    fn test_out_of_range_line() {
        assert_eq!(source_context("A", 5, 1), "");
        assert_eq!(source_context("A", 0, 1), "");
    }
}
