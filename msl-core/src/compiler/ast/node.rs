//! Arena-backed syntax tree
//!
//! All nodes of one script live in a single `Vec`; children are index lists.
//! The parent link is informational only and never walked by the interpreter.

use crate::kit::lexer::SourcePosition;
use serde::Serialize;
use std::fmt;

/// Index of a node inside its [`Ast`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scroll direction of a wheel action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WheelDirection {
    Up,
    Down,
}

impl WheelDirection {
    pub fn sign(self) -> char {
        match self {
            WheelDirection::Up => '+',
            WheelDirection::Down => '-',
        }
    }
}

/// Node kinds
///
/// Expression nodes are leaves that carry a value; operator, timing and
/// group nodes carry children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeKind {
    // Expression nodes
    Key { name: String },
    Number { value: f64 },
    /// Variable reference, stored without the leading `$`
    Variable { name: String },
    MouseCoord { x: i32, y: i32 },
    Wheel { direction: WheelDirection, amount: u32 },

    // Operator nodes
    Sequential,
    Simultaneous,
    HoldChain,
    Parallel,
    Toggle,
    Repeat { count: u32 },
    Continuous { interval: f64 },

    // Timing nodes (all values in milliseconds)
    Delay { ms: f64 },
    Hold { ms: f64 },
    Interval { ms: f64 },
    /// Two children, unlike the other timing nodes: the action faded from,
    /// then the key or variable faded to
    Fade { ms: f64 },

    Group,
}

impl NodeKind {
    /// Kind tag, used by counters and printers
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Key { .. } => "Key",
            NodeKind::Number { .. } => "Number",
            NodeKind::Variable { .. } => "Variable",
            NodeKind::MouseCoord { .. } => "MouseCoord",
            NodeKind::Wheel { .. } => "Wheel",
            NodeKind::Sequential => "Sequential",
            NodeKind::Simultaneous => "Simultaneous",
            NodeKind::HoldChain => "HoldChain",
            NodeKind::Parallel => "Parallel",
            NodeKind::Toggle => "Toggle",
            NodeKind::Repeat { .. } => "Repeat",
            NodeKind::Continuous { .. } => "Continuous",
            NodeKind::Delay { .. } => "Delay",
            NodeKind::Hold { .. } => "Hold",
            NodeKind::Interval { .. } => "Interval",
            NodeKind::Fade { .. } => "Fade",
            NodeKind::Group => "Group",
        }
    }

    /// Whether this is an expression (leaf) node
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::Key { .. }
                | NodeKind::Number { .. }
                | NodeKind::Variable { .. }
                | NodeKind::MouseCoord { .. }
                | NodeKind::Wheel { .. }
        )
    }

    /// Label with the node's own parameters, without children
    pub fn label(&self) -> String {
        match self {
            NodeKind::Key { name } => format!("Key({name})"),
            NodeKind::Number { value } => format!("Number({})", format_number(*value)),
            NodeKind::Variable { name } => format!("Variable(${name})"),
            NodeKind::MouseCoord { x, y } => format!("MouseCoord({x},{y})"),
            NodeKind::Wheel { direction, amount } => {
                format!("Wheel({}{})", direction.sign(), amount)
            }
            NodeKind::Repeat { count } => format!("Repeat({count})"),
            NodeKind::Continuous { interval } => {
                format!("Continuous({})", format_number(*interval))
            }
            NodeKind::Delay { ms } => format!("Delay({})", format_number(*ms)),
            NodeKind::Hold { ms } => format!("Hold({})", format_number(*ms)),
            NodeKind::Interval { ms } => format!("Interval({})", format_number(*ms)),
            NodeKind::Fade { ms } => format!("Fade({})", format_number(*ms)),
            other => other.name().to_string(),
        }
    }

    /// Whether the label carries parameters (printed as `Label(p){children}`)
    pub fn is_parameterized(&self) -> bool {
        matches!(
            self,
            NodeKind::Repeat { .. }
                | NodeKind::Continuous { .. }
                | NodeKind::Delay { .. }
                | NodeKind::Hold { .. }
                | NodeKind::Interval { .. }
                | NodeKind::Fade { .. }
        )
    }
}

/// Print whole numbers without a fractional part
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// One tree node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub position: Option<SourcePosition>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Errors from structural edits
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AstError {
    #[error("node {0} does not belong to this tree")]
    UnknownNode(NodeId),
    #[error("node {child} is already owned by {parent}")]
    AlreadyAttached { child: NodeId, parent: NodeId },
    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
}

/// Syntax tree of one script
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ast {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a detached node
    pub fn push(&mut self, kind: NodeKind, position: Option<SourcePosition>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            position,
            children: Vec::new(),
            parent: None,
        });
        id
    }

    /// Allocate a node owning `children`, which must all be detached.
    pub(crate) fn push_with_children(
        &mut self,
        kind: NodeKind,
        position: Option<SourcePosition>,
        children: Vec<NodeId>,
    ) -> NodeId {
        let id = self.push(kind, position);
        for &child in &children {
            debug_assert!(self.nodes[child.0].parent.is_none());
            self.nodes[child.0].parent = Some(id);
        }
        self.nodes[id.0].children = children;
        id
    }

    /// Attach a detached node as the last child of `parent`
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), AstError> {
        self.check(parent)?;
        self.check(child)?;
        if let Some(owner) = self.nodes[child.0].parent {
            return Err(AstError::AlreadyAttached { child, parent: owner });
        }
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(AstError::Cycle { parent, child });
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    /// Detach `child` from `parent`. The node stays in the arena, orphaned.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.check(parent).is_err() || self.check(child).is_err() {
            return false;
        }
        let children = &mut self.nodes[parent.0].children;
        match children.iter().position(|&c| c == child) {
            Some(index) => {
                children.remove(index);
                self.nodes[child.0].parent = None;
                true
            }
            None => false,
        }
    }

    fn check(&self, id: NodeId) -> Result<(), AstError> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(AstError::UnknownNode(id))
        }
    }

    fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes[id.0].parent, move |p| self.nodes[p.0].parent)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    /// Node by id.
    ///
    /// # Panics
    /// If `id` was allocated by a different tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Number of allocated nodes, including orphans
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order walk from `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// The single key name this subtree presses, if it is exactly one `Key`
    pub fn as_key(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Key { name } => Some(name),
            _ => None,
        }
    }
}
