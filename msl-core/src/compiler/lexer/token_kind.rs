//! MSL token kinds

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize)]
#[repr(u8)]
pub enum MslTokenKind {
    // Literals (100-104)
    Key = 100,
    Number,
    Variable,
    MouseCoord,
    Wheel,

    // Operators (150-156)
    Comma = 150,
    Plus,
    GreaterThan,
    Pipe,
    Tilde,
    Asterisk,
    Ampersand,

    // Delimiters (170-176)
    LeftParenthesis = 170,
    RightParenthesis,
    LeftSquareBracket,
    RightSquareBracket,
    LeftCurlyBrace,
    RightCurlyBrace,
    LessThan,

    // Trivia (240)
    Comment = 240,

    // End of input sentinel
    Eof = 250,

    #[default]
    Invalid = 255,
}

impl MslTokenKind {
    /// Single-character operators and delimiters
    pub fn from_symbol(c: char) -> Option<Self> {
        let kind = match c {
            ',' => MslTokenKind::Comma,
            '+' => MslTokenKind::Plus,
            '>' => MslTokenKind::GreaterThan,
            '|' => MslTokenKind::Pipe,
            '~' => MslTokenKind::Tilde,
            '*' => MslTokenKind::Asterisk,
            '&' => MslTokenKind::Ampersand,
            '(' => MslTokenKind::LeftParenthesis,
            ')' => MslTokenKind::RightParenthesis,
            '[' => MslTokenKind::LeftSquareBracket,
            ']' => MslTokenKind::RightSquareBracket,
            '{' => MslTokenKind::LeftCurlyBrace,
            '}' => MslTokenKind::RightCurlyBrace,
            '<' => MslTokenKind::LessThan,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether the token can open a numeric operand, so a following `-N`
    /// is read as a signed number
    pub fn opens_numeric_operand(self) -> bool {
        matches!(
            self,
            MslTokenKind::LeftParenthesis
                | MslTokenKind::LeftSquareBracket
                | MslTokenKind::LeftCurlyBrace
                | MslTokenKind::LessThan
                | MslTokenKind::Asterisk
                | MslTokenKind::Ampersand
        )
    }

    /// Human readable name used in diagnostics
    pub fn describe(self) -> &'static str {
        match self {
            MslTokenKind::Key => "KEY",
            MslTokenKind::Number => "NUMBER",
            MslTokenKind::Variable => "VARIABLE",
            MslTokenKind::MouseCoord => "MOUSE_COORD",
            MslTokenKind::Wheel => "WHEEL",
            MslTokenKind::Comma => "','",
            MslTokenKind::Plus => "'+'",
            MslTokenKind::GreaterThan => "'>'",
            MslTokenKind::Pipe => "'|'",
            MslTokenKind::Tilde => "'~'",
            MslTokenKind::Asterisk => "'*'",
            MslTokenKind::Ampersand => "'&'",
            MslTokenKind::LeftParenthesis => "'('",
            MslTokenKind::RightParenthesis => "')'",
            MslTokenKind::LeftSquareBracket => "'['",
            MslTokenKind::RightSquareBracket => "']'",
            MslTokenKind::LeftCurlyBrace => "'{'",
            MslTokenKind::RightCurlyBrace => "'}'",
            MslTokenKind::LessThan => "'<'",
            MslTokenKind::Comment => "COMMENT",
            MslTokenKind::Eof => "end of input",
            MslTokenKind::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for MslTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

impl From<MslTokenKind> for u8 {
    fn from(val: MslTokenKind) -> Self {
        val as u8
    }
}
