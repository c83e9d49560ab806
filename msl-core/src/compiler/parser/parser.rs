//! Precedence parser
//!
//! Levels, lowest to highest:
//!
//! ```text
//! sequential   := simultaneous (',' simultaneous)*
//! simultaneous := parallel ('+' parallel)*
//! parallel     := hold_chain ('|' hold_chain)*
//! hold_chain   := continuous ('>' continuous)*
//! continuous   := repeat ('&' NUMBER)*
//! repeat       := toggle ('*' NUMBER ('{' NUMBER '}')?)*
//! toggle       := '~' primary | primary
//! primary      := atom timing*
//! atom         := '(' sequential ')' | KEY | VARIABLE | MOUSE_COORD | WHEEL
//! timing       := '(' NUMBER ')' | '[' NUMBER ']' | '<' NUMBER '>' (KEY | VARIABLE)
//! ```
//!
//! Tree height is capped by `LimitConfig::max_nesting_depth`; deeper scripts
//! fail with `NestingTooDeep` instead of exhausting the stack later.

use super::error::{unexpected_token, ParseError, ParseErrorKind, ParseResult};
use crate::compiler::ast::{Ast, NodeId, NodeKind, WheelDirection};
use crate::compiler::lexer::MslTokenKind;
use crate::kit::lexer::{tokenize, MslToken, SourcePosition, SourceSpan};
use msl_config::LimitConfig;
use tracing::debug;

const ATOM_EXPECTED: [&str; 5] = ["KEY", "VARIABLE", "MOUSE_COORD", "WHEEL", "'('"];

pub struct Parser {
    tokens: Vec<MslToken>,
    index: usize,
    ast: Ast,
    /// Height of every node built so far, indexed like the arena
    heights: Vec<usize>,
    /// Open `(` groups
    group_depth: usize,
    max_depth: usize,
}

impl Parser {
    /// Build a parser over a lexed stream. Comments are dropped and an
    /// `Eof` sentinel is guaranteed.
    pub fn new(tokens: Vec<MslToken>) -> Self {
        Self::with_limits(tokens, &LimitConfig::default())
    }

    pub fn with_limits(tokens: Vec<MslToken>, limits: &LimitConfig) -> Self {
        let mut tokens: Vec<MslToken> = tokens
            .into_iter()
            .filter(|t| t.kind != MslTokenKind::Comment)
            .collect();
        if tokens.last().map(|t| t.kind) != Some(MslTokenKind::Eof) {
            let end = tokens
                .last()
                .map(|t| t.end())
                .unwrap_or_else(SourcePosition::start);
            tokens.push(MslToken::new(MslTokenKind::Eof, SourceSpan::at(end), ""));
        }
        Self {
            tokens,
            index: 0,
            ast: Ast::new(),
            heights: Vec::new(),
            group_depth: 0,
            max_depth: limits.max_nesting_depth.max(1),
        }
    }

    /// Parse the whole stream into a tree. Every token must be consumed.
    pub fn parse(mut self) -> ParseResult<Ast> {
        if let Some(invalid) = self.tokens.iter().find(|t| t.kind == MslTokenKind::Invalid) {
            return Err(ParseError::at(
                ParseErrorKind::InvalidCharacter {
                    text: invalid.text.clone(),
                },
                invalid.start(),
            ));
        }
        if self.check(MslTokenKind::Eof) {
            return Err(self.error_here(ParseErrorKind::UnexpectedEndOfInput {
                expected: "an action".to_string(),
            }));
        }

        let root = self.parse_sequential()?;
        if !self.check(MslTokenKind::Eof) {
            let found = self.current_text();
            return Err(self.error_here(ParseErrorKind::TrailingTokens { found }));
        }

        self.ast.set_root(root);
        debug!(
            target: "msl::parser",
            nodes = self.ast.len(),
            tokens = self.tokens.len(),
            "Parsed script"
        );
        Ok(self.ast)
    }

    // ===== Cursor =====

    fn current(&self) -> &MslToken {
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    /// Look `n` tokens past the current one
    fn peek(&self, n: usize) -> &MslToken {
        &self.tokens[(self.index + n).min(self.tokens.len() - 1)]
    }

    fn check(&self, kind: MslTokenKind) -> bool {
        self.current().kind == kind
    }

    fn consume(&mut self) -> MslToken {
        let token = self.current().clone();
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        token
    }

    fn match_token(&mut self, kind: MslTokenKind) -> bool {
        if self.check(kind) {
            self.consume();
            true
        } else {
            false
        }
    }

    /// Text describing the current token for diagnostics
    fn current_text(&self) -> String {
        let token = self.current();
        match token.kind {
            MslTokenKind::Key
            | MslTokenKind::Number
            | MslTokenKind::Variable
            | MslTokenKind::MouseCoord
            | MslTokenKind::Wheel => format!("{} '{}'", token.kind, token.text),
            kind => kind.describe().to_string(),
        }
    }

    fn error_here(&self, kind: ParseErrorKind) -> ParseError {
        let token = self.current();
        if token.kind == MslTokenKind::Eof {
            ParseError::at_eof(kind, token.start())
        } else {
            ParseError::at(kind, token.start())
        }
    }

    /// Expect the closing delimiter of a bracket opened by `open`
    fn expect_close(&mut self, open: char, close: MslTokenKind) -> ParseResult<()> {
        if self.match_token(close) {
            return Ok(());
        }
        let close_char = match close {
            MslTokenKind::RightParenthesis => ')',
            MslTokenKind::RightSquareBracket => ']',
            MslTokenKind::RightCurlyBrace => '}',
            _ => '>',
        };
        let found = self.current_text();
        Err(self.error_here(ParseErrorKind::Unterminated {
            open,
            close: close_char,
            found,
        }))
    }

    /// Consume a non-negative NUMBER operand following `after`
    fn expect_number(&mut self, after: &str) -> ParseResult<(f64, MslToken)> {
        if !self.check(MslTokenKind::Number) {
            let found = self.current_text();
            return Err(self.error_here(ParseErrorKind::MissingNumber {
                after: after.to_string(),
                found,
            }));
        }
        let token = self.consume();
        if token.text.starts_with('-') {
            return Err(ParseError::at(
                ParseErrorKind::NegativeValue {
                    text: token.text.clone(),
                },
                token.start(),
            ));
        }
        let value = token
            .text
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                ParseError::at(
                    ParseErrorKind::InvalidNumber {
                        text: token.text.clone(),
                    },
                    token.start(),
                )
            })?;
        Ok((value, token))
    }

    // ===== Builders =====

    fn leaf(&mut self, kind: NodeKind, position: SourcePosition) -> NodeId {
        self.heights.push(1);
        self.ast.push(kind, Some(position))
    }

    fn branch(
        &mut self,
        kind: NodeKind,
        position: SourcePosition,
        children: Vec<NodeId>,
    ) -> ParseResult<NodeId> {
        let height = 1 + children
            .iter()
            .filter_map(|c| self.heights.get(c.index()).copied())
            .max()
            .unwrap_or(0);
        if height > self.max_depth {
            return Err(self.too_deep(position));
        }
        self.heights.push(height);
        Ok(self.ast.push_with_children(kind, Some(position), children))
    }

    fn too_deep(&self, position: SourcePosition) -> ParseError {
        ParseError::at(
            ParseErrorKind::NestingTooDeep {
                limit: self.max_depth,
            },
            position,
        )
    }

    // ===== Binary levels =====

    /// Left-associative n-ary level: fold every `operator` operand into one node
    fn parse_infix(
        &mut self,
        operator: MslTokenKind,
        kind: NodeKind,
        next: fn(&mut Self) -> ParseResult<NodeId>,
    ) -> ParseResult<NodeId> {
        let position = self.current().start();
        let first = next(self)?;
        if !self.check(operator) {
            return Ok(first);
        }

        let mut children = vec![first];
        while self.check(operator) {
            if self.peek(1).kind == MslTokenKind::Eof {
                let op = self.current();
                return Err(ParseError::at(
                    ParseErrorKind::DanglingOperator {
                        operator: op.text.clone(),
                    },
                    op.start(),
                ));
            }
            self.consume();
            children.push(next(self)?);
        }
        self.branch(kind, position, children)
    }

    fn parse_sequential(&mut self) -> ParseResult<NodeId> {
        self.parse_infix(
            MslTokenKind::Comma,
            NodeKind::Sequential,
            Self::parse_simultaneous,
        )
    }

    fn parse_simultaneous(&mut self) -> ParseResult<NodeId> {
        self.parse_infix(
            MslTokenKind::Plus,
            NodeKind::Simultaneous,
            Self::parse_parallel,
        )
    }

    fn parse_parallel(&mut self) -> ParseResult<NodeId> {
        self.parse_infix(
            MslTokenKind::Pipe,
            NodeKind::Parallel,
            Self::parse_hold_chain,
        )
    }

    fn parse_hold_chain(&mut self) -> ParseResult<NodeId> {
        self.parse_infix(
            MslTokenKind::GreaterThan,
            NodeKind::HoldChain,
            Self::parse_continuous,
        )
    }

    // ===== Postfix levels =====

    fn parse_continuous(&mut self) -> ParseResult<NodeId> {
        let position = self.current().start();
        let mut node = self.parse_repeat()?;
        while self.match_token(MslTokenKind::Ampersand) {
            let (interval, _) = self.expect_number("&")?;
            node = self.branch(NodeKind::Continuous { interval }, position, vec![node])?;
        }
        Ok(node)
    }

    fn parse_repeat(&mut self) -> ParseResult<NodeId> {
        let position = self.current().start();
        let mut node = self.parse_toggle()?;
        while self.match_token(MslTokenKind::Asterisk) {
            let (value, token) = self.expect_number("*")?;
            if value.fract() != 0.0 || value > u32::MAX as f64 {
                return Err(ParseError::at(
                    ParseErrorKind::InvalidRepeatCount { text: token.text.clone() },
                    token.start(),
                ));
            }
            let count = value as u32;

            let mut children = vec![node];
            if self.check(MslTokenKind::LeftCurlyBrace) {
                let open = self.consume();
                let (ms, _) = self.expect_number("{")?;
                self.expect_close('{', MslTokenKind::RightCurlyBrace)?;
                children.push(self.leaf(NodeKind::Interval { ms }, open.start()));
            }
            node = self.branch(NodeKind::Repeat { count }, position, children)?;
        }
        Ok(node)
    }

    fn parse_toggle(&mut self) -> ParseResult<NodeId> {
        if self.check(MslTokenKind::Tilde) {
            let tilde = self.consume();
            if self.check(MslTokenKind::Eof) {
                return Err(ParseError::at(
                    ParseErrorKind::DanglingOperator { operator: tilde.text.clone() },
                    tilde.start(),
                ));
            }
            let target = self.parse_primary()?;
            return self.branch(NodeKind::Toggle, tilde.start(), vec![target]);
        }
        self.parse_primary()
    }

    // ===== Primary =====

    fn parse_primary(&mut self) -> ParseResult<NodeId> {
        let position = self.current().start();
        let mut node = self.parse_atom()?;

        loop {
            match self.current().kind {
                MslTokenKind::LeftParenthesis => {
                    self.consume();
                    let (ms, _) = self.expect_number("(")?;
                    self.expect_close('(', MslTokenKind::RightParenthesis)?;
                    node = self.branch(NodeKind::Delay { ms }, position, vec![node])?;
                }
                MslTokenKind::LeftSquareBracket => {
                    self.consume();
                    let (ms, _) = self.expect_number("[")?;
                    self.expect_close('[', MslTokenKind::RightSquareBracket)?;
                    node = self.branch(NodeKind::Hold { ms }, position, vec![node])?;
                }
                MslTokenKind::LessThan => {
                    node = self.parse_fade(position, node)?;
                }
                _ => break,
            }
        }
        Ok(node)
    }

    /// `<N>` followed by the fade target
    fn parse_fade(&mut self, position: SourcePosition, from: NodeId) -> ParseResult<NodeId> {
        self.consume();
        let (ms, number) = self.expect_number("<")?;
        self.expect_close('<', MslTokenKind::GreaterThan)?;

        let target = self.current().clone();
        let to = match target.kind {
            MslTokenKind::Key => self.leaf(
                NodeKind::Key {
                    name: target.text.clone(),
                },
                target.start(),
            ),
            MslTokenKind::Variable => self.leaf(
                NodeKind::Variable {
                    name: variable_name(&target.text),
                },
                target.start(),
            ),
            _ => {
                let found = self.current_text();
                return Err(self.error_here(ParseErrorKind::FadeWithoutTarget {
                    ms: number.text,
                    found,
                }));
            }
        };
        self.consume();
        self.branch(NodeKind::Fade { ms }, position, vec![from, to])
    }

    fn parse_atom(&mut self) -> ParseResult<NodeId> {
        let token = self.current().clone();
        let position = token.start();
        match token.kind {
            MslTokenKind::LeftParenthesis => {
                if self.group_depth >= self.max_depth {
                    return Err(self.too_deep(position));
                }
                self.consume();
                if self.check(MslTokenKind::RightParenthesis) {
                    let found = self.current_text();
                    return Err(self.error_here(unexpected_token(found, ATOM_EXPECTED.to_vec())));
                }
                self.group_depth += 1;
                let inner = self.parse_sequential();
                self.group_depth -= 1;
                let inner = inner?;
                self.expect_close('(', MslTokenKind::RightParenthesis)?;
                self.branch(NodeKind::Group, position, vec![inner])
            }
            MslTokenKind::Key => {
                self.consume();
                Ok(self.leaf(NodeKind::Key { name: token.text }, position))
            }
            MslTokenKind::Variable => {
                self.consume();
                let name = variable_name(&token.text);
                Ok(self.leaf(NodeKind::Variable { name }, position))
            }
            MslTokenKind::MouseCoord => {
                self.consume();
                let (x, y) = parse_mouse_coord(&token)?;
                Ok(self.leaf(NodeKind::MouseCoord { x, y }, position))
            }
            MslTokenKind::Wheel => {
                self.consume();
                let (direction, amount) = parse_wheel(&token)?;
                Ok(self.leaf(NodeKind::Wheel { direction, amount }, position))
            }
            MslTokenKind::Comma
            | MslTokenKind::Plus
            | MslTokenKind::Pipe
            | MslTokenKind::GreaterThan
            | MslTokenKind::Asterisk
            | MslTokenKind::Ampersand
            | MslTokenKind::Tilde => Err(ParseError::at(
                ParseErrorKind::DanglingOperator {
                    operator: token.text.clone(),
                },
                token.start(),
            )),
            MslTokenKind::Eof => Err(self.error_here(ParseErrorKind::UnexpectedEndOfInput {
                expected: "an action".to_string(),
            })),
            _ => {
                let found = self.current_text();
                Err(self.error_here(unexpected_token(found, ATOM_EXPECTED.to_vec())))
            }
        }
    }
}

fn variable_name(text: &str) -> String {
    text.trim_start_matches('$').to_string()
}

/// `@( x , y )` → `(x, y)`
fn parse_mouse_coord(token: &MslToken) -> ParseResult<(i32, i32)> {
    let invalid = || {
        ParseError::at(
            ParseErrorKind::InvalidNumber {
                text: token.text.clone(),
            },
            token.start(),
        )
    };
    let inner = token
        .text
        .strip_prefix("@(")
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(invalid)?;
    let (x, y) = inner.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse::<i32>().map_err(|_| invalid())?;
    let y = y.trim().parse::<i32>().map_err(|_| invalid())?;
    Ok((x, y))
}

/// `wheel+3` → `(Up, 3)`; the amount defaults to 1
fn parse_wheel(token: &MslToken) -> ParseResult<(WheelDirection, u32)> {
    let rest = token.text.strip_prefix("wheel").unwrap_or(&token.text);
    let direction = if rest.starts_with('-') {
        WheelDirection::Down
    } else {
        WheelDirection::Up
    };
    let digits = &rest[rest.len().min(1)..];
    if digits.is_empty() {
        return Ok((direction, 1));
    }
    let amount = digits.parse::<u32>().map_err(|_| {
        ParseError::at(
            ParseErrorKind::InvalidNumber {
                text: token.text.clone(),
            },
            token.start(),
        )
    })?;
    Ok((direction, amount))
}

/// Parse a lexed token stream
pub fn parse_tokens(tokens: Vec<MslToken>) -> ParseResult<Ast> {
    Parser::new(tokens).parse()
}

/// Parse a lexed stream under explicit limits
pub fn parse_tokens_with(tokens: Vec<MslToken>, limits: &LimitConfig) -> ParseResult<Ast> {
    Parser::with_limits(tokens, limits).parse()
}

/// Lex and parse script text
pub fn parse(text: &str) -> ParseResult<Ast> {
    parse_tokens(tokenize(text))
}
