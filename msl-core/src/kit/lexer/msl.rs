//! MSL scanner
//!
//! Rules are tried in a fixed priority order at every position; the first
//! match wins:
//!
//! 1. whitespace / newline (skipped, only updates the position)
//! 2. comment `#...` up to the end of the line
//! 3. mouse coordinate `@(x, y)`
//! 4. wheel `wheel+N` / `wheel-N`
//! 5. variable `$name`
//! 6. signed number `-N`, only right after a numeric-operand opener
//! 7. unsigned number `N` / `N.M`
//! 8. key name
//! 9. single-character operators and delimiters
//! 10. anything else is a one-character `Invalid` token

use super::core::{CharStream, SourceSpan};
use super::scanner::{is_identifier_continue, is_identifier_start, Token};
use crate::compiler::lexer::token_kind::MslTokenKind;
use tracing::trace;

/// MSL scanner state
#[derive(Debug, Default)]
pub struct MslScanner {
    /// Kind of the last significant (non-comment) token
    previous: Option<MslTokenKind>,
}

impl MslScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the next token; returns an `Eof` token once the input is exhausted
    pub fn next_token(&mut self, stream: &mut CharStream<'_>) -> Token<MslTokenKind> {
        self.skip_whitespace(stream);

        let start = stream.position();
        let Some(c) = stream.peek(0) else {
            return Token::new(MslTokenKind::Eof, SourceSpan::at(start), "");
        };

        let kind = if c == '#' {
            self.scan_comment(stream)
        } else if c == '@' {
            self.scan_mouse_coord(stream)
        } else if let Some(len) = wheel_len(stream) {
            stream.advance_by(len);
            MslTokenKind::Wheel
        } else if c == '$' && stream.peek(1).is_some_and(is_identifier_start) {
            stream.advance();
            self.scan_identifier(stream);
            MslTokenKind::Variable
        } else if c == '-' && self.accepts_signed_number() && number_len(stream, 1) > 0 {
            let len = 1 + number_len(stream, 1);
            stream.advance_by(len);
            MslTokenKind::Number
        } else if c.is_ascii_digit() {
            let len = number_len(stream, 0);
            stream.advance_by(len);
            MslTokenKind::Number
        } else if is_identifier_start(c) {
            self.scan_identifier(stream);
            MslTokenKind::Key
        } else if let Some(kind) = MslTokenKind::from_symbol(c) {
            stream.advance();
            kind
        } else {
            stream.advance();
            MslTokenKind::Invalid
        };

        let end = stream.position();
        let text = stream.slice(start.offset, end.offset);
        trace!(
            target: "msl::lexer",
            ?kind,
            text,
            line = start.line,
            column = start.column,
            "Scanned token"
        );

        if kind != MslTokenKind::Comment {
            self.previous = Some(kind);
        }
        Token::new(kind, SourceSpan::range(start, end), text)
    }

    fn accepts_signed_number(&self) -> bool {
        self.previous
            .is_some_and(MslTokenKind::opens_numeric_operand)
    }

    fn skip_whitespace(&mut self, stream: &mut CharStream<'_>) {
        while stream.peek(0).is_some_and(char::is_whitespace) {
            stream.advance();
        }
    }

    fn scan_comment(&mut self, stream: &mut CharStream<'_>) -> MslTokenKind {
        while let Some(c) = stream.peek(0) {
            if c == '\n' {
                break;
            }
            stream.advance();
        }
        MslTokenKind::Comment
    }

    fn scan_mouse_coord(&mut self, stream: &mut CharStream<'_>) -> MslTokenKind {
        match mouse_coord_len(stream) {
            Some(len) => {
                stream.advance_by(len);
                MslTokenKind::MouseCoord
            }
            None => {
                stream.advance();
                MslTokenKind::Invalid
            }
        }
    }

    fn scan_identifier(&mut self, stream: &mut CharStream<'_>) {
        stream.advance();
        while stream.peek(0).is_some_and(is_identifier_continue) {
            stream.advance();
        }
    }
}

/// Length of `\d+(\.\d+)?` starting `from` chars ahead, 0 when absent
fn number_len(stream: &CharStream<'_>, from: usize) -> usize {
    let int_len = stream.count_while(from, |c| c.is_ascii_digit());
    if int_len == 0 {
        return 0;
    }
    let dot = from + int_len;
    if stream.peek(dot) == Some('.') {
        let frac_len = stream.count_while(dot + 1, |c| c.is_ascii_digit());
        if frac_len > 0 {
            return int_len + 1 + frac_len;
        }
    }
    int_len
}

/// Length of `wheel[+-]\d*`, if it matches here
fn wheel_len(stream: &CharStream<'_>) -> Option<usize> {
    if !stream.starts_with("wheel") {
        return None;
    }
    match stream.peek(5) {
        Some('+') | Some('-') => Some(6 + stream.count_while(6, |c| c.is_ascii_digit())),
        _ => None,
    }
}

/// Length of `@(\s*-?\d+\s*,\s*-?\d+\s*)`, if it matches here
fn mouse_coord_len(stream: &CharStream<'_>) -> Option<usize> {
    if stream.peek(1) != Some('(') {
        return None;
    }
    let mut i = 2;
    i = signed_integer_end(stream, i)?;
    if stream.peek(i) != Some(',') {
        return None;
    }
    i = signed_integer_end(stream, i + 1)?;
    if stream.peek(i) != Some(')') {
        return None;
    }
    Some(i + 1)
}

/// Skip `\s*-?\d+\s*` starting at `i`, returning the index after it
fn signed_integer_end(stream: &CharStream<'_>, mut i: usize) -> Option<usize> {
    i += stream.count_while(i, char::is_whitespace);
    if stream.peek(i) == Some('-') {
        i += 1;
    }
    let digits = stream.count_while(i, |c| c.is_ascii_digit());
    if digits == 0 {
        return None;
    }
    i += digits;
    i += stream.count_while(i, char::is_whitespace);
    Some(i)
}
