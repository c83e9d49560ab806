//! Tree printers and the canonical script formatter

use super::node::{format_number, Ast, NodeId, NodeKind, WheelDirection};
use super::visitor::Visitor;
use std::fmt;

/// Output layout of [`TreePrinter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeStyle {
    /// One node per line, two spaces of indent per level
    Indented,
    /// Single line, e.g. `Sequential(Key(W), Delay(500){Key(A)})`
    Compact,
}

/// Deterministic tree stringifier
pub struct TreePrinter {
    style: TreeStyle,
    depth: usize,
    out: String,
}

impl TreePrinter {
    pub fn new(style: TreeStyle) -> Self {
        Self {
            style,
            depth: 0,
            out: String::new(),
        }
    }

    pub fn print(mut self, ast: &Ast, id: NodeId) -> String {
        ast.accept(id, &mut self);
        self.out
    }

    fn node(&mut self, ast: &Ast, id: NodeId) {
        let kind = ast.kind(id);
        let children = ast.children(id);
        match self.style {
            TreeStyle::Indented => {
                if !self.out.is_empty() {
                    self.out.push('\n');
                }
                self.out.push_str(&"  ".repeat(self.depth));
                self.out.push_str(&kind.label());
                self.depth += 1;
                for &child in children {
                    ast.accept(child, self);
                }
                self.depth -= 1;
            }
            TreeStyle::Compact => {
                self.out.push_str(&kind.label());
                if children.is_empty() {
                    return;
                }
                let (open, close) = if kind.is_parameterized() {
                    ('{', '}')
                } else {
                    ('(', ')')
                };
                self.out.push(open);
                for (i, &child) in children.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    ast.accept(child, self);
                }
                self.out.push(close);
            }
        }
    }
}

impl Visitor for TreePrinter {
    type Output = ();

    fn visit_key(&mut self, ast: &Ast, id: NodeId, _: &str) {
        self.node(ast, id)
    }
    fn visit_number(&mut self, ast: &Ast, id: NodeId, _: f64) {
        self.node(ast, id)
    }
    fn visit_variable(&mut self, ast: &Ast, id: NodeId, _: &str) {
        self.node(ast, id)
    }
    fn visit_mouse_coord(&mut self, ast: &Ast, id: NodeId, _: i32, _: i32) {
        self.node(ast, id)
    }
    fn visit_wheel(&mut self, ast: &Ast, id: NodeId, _: WheelDirection, _: u32) {
        self.node(ast, id)
    }
    fn visit_sequential(&mut self, ast: &Ast, id: NodeId) {
        self.node(ast, id)
    }
    fn visit_simultaneous(&mut self, ast: &Ast, id: NodeId) {
        self.node(ast, id)
    }
    fn visit_hold_chain(&mut self, ast: &Ast, id: NodeId) {
        self.node(ast, id)
    }
    fn visit_parallel(&mut self, ast: &Ast, id: NodeId) {
        self.node(ast, id)
    }
    fn visit_toggle(&mut self, ast: &Ast, id: NodeId) {
        self.node(ast, id)
    }
    fn visit_repeat(&mut self, ast: &Ast, id: NodeId, _: u32) {
        self.node(ast, id)
    }
    fn visit_continuous(&mut self, ast: &Ast, id: NodeId, _: f64) {
        self.node(ast, id)
    }
    fn visit_delay(&mut self, ast: &Ast, id: NodeId, _: f64) {
        self.node(ast, id)
    }
    fn visit_hold(&mut self, ast: &Ast, id: NodeId, _: f64) {
        self.node(ast, id)
    }
    fn visit_interval(&mut self, ast: &Ast, id: NodeId, _: f64) {
        self.node(ast, id)
    }
    fn visit_fade(&mut self, ast: &Ast, id: NodeId, _: f64) {
        self.node(ast, id)
    }
    fn visit_group(&mut self, ast: &Ast, id: NodeId) {
        self.node(ast, id)
    }
}

/// Binding strength of a node when rendered as MSL text
fn precedence(kind: &NodeKind) -> u8 {
    match kind {
        NodeKind::Sequential => 1,
        NodeKind::Simultaneous => 2,
        NodeKind::Parallel => 3,
        NodeKind::HoldChain => 4,
        NodeKind::Continuous { .. } => 5,
        NodeKind::Repeat { .. } => 6,
        NodeKind::Toggle => 7,
        _ => 8,
    }
}

/// Renders a tree back to canonical MSL text.
///
/// For trees produced by the parser, parsing the output again yields the
/// same compact tree.
#[derive(Debug, Default)]
pub struct ScriptFormatter;

impl ScriptFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&mut self, ast: &Ast, id: NodeId) -> String {
        ast.accept(id, self)
    }

    /// Render `id`, parenthesized when it binds looser than `min`
    fn operand(&mut self, ast: &Ast, id: NodeId, min: u8) -> String {
        let text = ast.accept(id, self);
        if precedence(ast.kind(id)) < min {
            format!("({text})")
        } else {
            text
        }
    }

    fn infix(&mut self, ast: &Ast, id: NodeId, separator: &str) -> String {
        let min = precedence(ast.kind(id)) + 1;
        ast.children(id)
            .iter()
            .map(|&child| self.operand(ast, child, min))
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn postfix(&mut self, ast: &Ast, id: NodeId, open: char, ms: f64, close: char) -> String {
        let target = match ast.children(id).first() {
            Some(&child) => self.operand(ast, child, 8),
            None => String::new(),
        };
        format!("{target}{open}{}{close}", format_number(ms))
    }
}

impl Visitor for ScriptFormatter {
    type Output = String;

    fn visit_key(&mut self, _: &Ast, _: NodeId, name: &str) -> String {
        name.to_string()
    }
    fn visit_number(&mut self, _: &Ast, _: NodeId, value: f64) -> String {
        format_number(value)
    }
    fn visit_variable(&mut self, _: &Ast, _: NodeId, name: &str) -> String {
        format!("${name}")
    }
    fn visit_mouse_coord(&mut self, _: &Ast, _: NodeId, x: i32, y: i32) -> String {
        format!("@({x},{y})")
    }
    fn visit_wheel(&mut self, _: &Ast, _: NodeId, direction: WheelDirection, amount: u32) -> String {
        format!("wheel{}{}", direction.sign(), amount)
    }
    fn visit_sequential(&mut self, ast: &Ast, id: NodeId) -> String {
        self.infix(ast, id, ", ")
    }
    fn visit_simultaneous(&mut self, ast: &Ast, id: NodeId) -> String {
        self.infix(ast, id, "+")
    }
    fn visit_hold_chain(&mut self, ast: &Ast, id: NodeId) -> String {
        self.infix(ast, id, " > ")
    }
    fn visit_parallel(&mut self, ast: &Ast, id: NodeId) -> String {
        self.infix(ast, id, " | ")
    }
    fn visit_toggle(&mut self, ast: &Ast, id: NodeId) -> String {
        match ast.children(id).first() {
            Some(&child) => format!("~{}", self.operand(ast, child, 8)),
            None => "~".to_string(),
        }
    }
    fn visit_repeat(&mut self, ast: &Ast, id: NodeId, count: u32) -> String {
        let children = ast.children(id);
        let mut out = match children.first() {
            Some(&child) => self.operand(ast, child, 6),
            None => String::new(),
        };
        out.push_str(&format!("*{count}"));
        for &sibling in children.iter().skip(1) {
            if let NodeKind::Interval { ms } = ast.kind(sibling) {
                out.push_str(&format!("{{{}}}", format_number(*ms)));
            }
        }
        out
    }
    fn visit_continuous(&mut self, ast: &Ast, id: NodeId, interval: f64) -> String {
        let target = match ast.children(id).first() {
            Some(&child) => self.operand(ast, child, 5),
            None => String::new(),
        };
        format!("{target}&{}", format_number(interval))
    }
    fn visit_delay(&mut self, ast: &Ast, id: NodeId, ms: f64) -> String {
        self.postfix(ast, id, '(', ms, ')')
    }
    fn visit_hold(&mut self, ast: &Ast, id: NodeId, ms: f64) -> String {
        self.postfix(ast, id, '[', ms, ']')
    }
    fn visit_interval(&mut self, _: &Ast, _: NodeId, ms: f64) -> String {
        format!("{{{}}}", format_number(ms))
    }
    fn visit_fade(&mut self, ast: &Ast, id: NodeId, ms: f64) -> String {
        let mut out = self.postfix(ast, id, '<', ms, '>');
        if let Some(&to) = ast.children(id).get(1) {
            out.push_str(&self.operand(ast, to, 8));
        }
        out
    }
    fn visit_group(&mut self, ast: &Ast, id: NodeId) -> String {
        let inner = ast
            .children(id)
            .iter()
            .map(|&child| ast.accept(child, self))
            .collect::<Vec<_>>()
            .join(", ");
        format!("({inner})")
    }
}

impl Ast {
    /// Indented multi-line dump of the whole tree
    pub fn tree_string(&self) -> String {
        match self.root() {
            Some(root) => TreePrinter::new(TreeStyle::Indented).print(self, root),
            None => String::new(),
        }
    }

    /// One-line form of the subtree at `id`
    pub fn compact(&self, id: NodeId) -> String {
        TreePrinter::new(TreeStyle::Compact).print(self, id)
    }

    /// Canonical MSL text for the whole tree
    pub fn to_script(&self) -> String {
        match self.root() {
            Some(root) => ScriptFormatter::new().format(self, root),
            None => String::new(),
        }
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root() {
            Some(root) => f.write_str(&self.compact(root)),
            None => f.write_str("<empty>"),
        }
    }
}
