//! Visitor dispatch
//!
//! `Ast::accept` matches the node kind once and calls the kind-specific
//! method; walkers decide themselves whether and how to descend.

use super::node::{Ast, NodeId, NodeKind, WheelDirection};

pub trait Visitor {
    type Output;

    fn visit_key(&mut self, ast: &Ast, id: NodeId, name: &str) -> Self::Output;
    fn visit_number(&mut self, ast: &Ast, id: NodeId, value: f64) -> Self::Output;
    fn visit_variable(&mut self, ast: &Ast, id: NodeId, name: &str) -> Self::Output;
    fn visit_mouse_coord(&mut self, ast: &Ast, id: NodeId, x: i32, y: i32) -> Self::Output;
    fn visit_wheel(
        &mut self,
        ast: &Ast,
        id: NodeId,
        direction: WheelDirection,
        amount: u32,
    ) -> Self::Output;

    fn visit_sequential(&mut self, ast: &Ast, id: NodeId) -> Self::Output;
    fn visit_simultaneous(&mut self, ast: &Ast, id: NodeId) -> Self::Output;
    fn visit_hold_chain(&mut self, ast: &Ast, id: NodeId) -> Self::Output;
    fn visit_parallel(&mut self, ast: &Ast, id: NodeId) -> Self::Output;
    fn visit_toggle(&mut self, ast: &Ast, id: NodeId) -> Self::Output;
    fn visit_repeat(&mut self, ast: &Ast, id: NodeId, count: u32) -> Self::Output;
    fn visit_continuous(&mut self, ast: &Ast, id: NodeId, interval: f64) -> Self::Output;

    fn visit_delay(&mut self, ast: &Ast, id: NodeId, ms: f64) -> Self::Output;
    fn visit_hold(&mut self, ast: &Ast, id: NodeId, ms: f64) -> Self::Output;
    fn visit_interval(&mut self, ast: &Ast, id: NodeId, ms: f64) -> Self::Output;
    fn visit_fade(&mut self, ast: &Ast, id: NodeId, ms: f64) -> Self::Output;

    fn visit_group(&mut self, ast: &Ast, id: NodeId) -> Self::Output;
}

impl Ast {
    /// Dispatch `id` to the matching `visit_*` method
    pub fn accept<V: Visitor + ?Sized>(&self, id: NodeId, visitor: &mut V) -> V::Output {
        match &self.node(id).kind {
            NodeKind::Key { name } => visitor.visit_key(self, id, name),
            NodeKind::Number { value } => visitor.visit_number(self, id, *value),
            NodeKind::Variable { name } => visitor.visit_variable(self, id, name),
            NodeKind::MouseCoord { x, y } => visitor.visit_mouse_coord(self, id, *x, *y),
            NodeKind::Wheel { direction, amount } => {
                visitor.visit_wheel(self, id, *direction, *amount)
            }
            NodeKind::Sequential => visitor.visit_sequential(self, id),
            NodeKind::Simultaneous => visitor.visit_simultaneous(self, id),
            NodeKind::HoldChain => visitor.visit_hold_chain(self, id),
            NodeKind::Parallel => visitor.visit_parallel(self, id),
            NodeKind::Toggle => visitor.visit_toggle(self, id),
            NodeKind::Repeat { count } => visitor.visit_repeat(self, id, *count),
            NodeKind::Continuous { interval } => visitor.visit_continuous(self, id, *interval),
            NodeKind::Delay { ms } => visitor.visit_delay(self, id, *ms),
            NodeKind::Hold { ms } => visitor.visit_hold(self, id, *ms),
            NodeKind::Interval { ms } => visitor.visit_interval(self, id, *ms),
            NodeKind::Fade { ms } => visitor.visit_fade(self, id, *ms),
            NodeKind::Group => visitor.visit_group(self, id),
        }
    }

    /// Dispatch the root, if any
    pub fn accept_root<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Option<V::Output> {
        self.root().map(|root| self.accept(root, visitor))
    }
}
