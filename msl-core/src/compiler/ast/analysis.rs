//! Static analyzers over a parsed tree

use super::node::{Ast, NodeId, WheelDirection};
use super::visitor::Visitor;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Counts reachable nodes per kind
#[derive(Debug, Default, Clone, Serialize)]
pub struct NodeCounter {
    pub counts: BTreeMap<&'static str, usize>,
    pub total: usize,
    /// Deepest nesting level, root is 1
    pub max_depth: usize,
    #[serde(skip)]
    depth: usize,
}

impl NodeCounter {
    pub fn count(ast: &Ast) -> Self {
        let mut counter = Self::default();
        ast.accept_root(&mut counter);
        counter
    }

    pub fn get(&self, kind: &str) -> usize {
        self.counts.get(kind).copied().unwrap_or(0)
    }

    fn tally(&mut self, ast: &Ast, id: NodeId) {
        *self.counts.entry(ast.kind(id).name()).or_insert(0) += 1;
        self.total += 1;
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
        for &child in ast.children(id) {
            ast.accept(child, self);
        }
        self.depth -= 1;
    }
}

impl Visitor for NodeCounter {
    type Output = ();

    fn visit_key(&mut self, ast: &Ast, id: NodeId, _: &str) {
        self.tally(ast, id)
    }
    fn visit_number(&mut self, ast: &Ast, id: NodeId, _: f64) {
        self.tally(ast, id)
    }
    fn visit_variable(&mut self, ast: &Ast, id: NodeId, _: &str) {
        self.tally(ast, id)
    }
    fn visit_mouse_coord(&mut self, ast: &Ast, id: NodeId, _: i32, _: i32) {
        self.tally(ast, id)
    }
    fn visit_wheel(&mut self, ast: &Ast, id: NodeId, _: WheelDirection, _: u32) {
        self.tally(ast, id)
    }
    fn visit_sequential(&mut self, ast: &Ast, id: NodeId) {
        self.tally(ast, id)
    }
    fn visit_simultaneous(&mut self, ast: &Ast, id: NodeId) {
        self.tally(ast, id)
    }
    fn visit_hold_chain(&mut self, ast: &Ast, id: NodeId) {
        self.tally(ast, id)
    }
    fn visit_parallel(&mut self, ast: &Ast, id: NodeId) {
        self.tally(ast, id)
    }
    fn visit_toggle(&mut self, ast: &Ast, id: NodeId) {
        self.tally(ast, id)
    }
    fn visit_repeat(&mut self, ast: &Ast, id: NodeId, _: u32) {
        self.tally(ast, id)
    }
    fn visit_continuous(&mut self, ast: &Ast, id: NodeId, _: f64) {
        self.tally(ast, id)
    }
    fn visit_delay(&mut self, ast: &Ast, id: NodeId, _: f64) {
        self.tally(ast, id)
    }
    fn visit_hold(&mut self, ast: &Ast, id: NodeId, _: f64) {
        self.tally(ast, id)
    }
    fn visit_interval(&mut self, ast: &Ast, id: NodeId, _: f64) {
        self.tally(ast, id)
    }
    fn visit_fade(&mut self, ast: &Ast, id: NodeId, _: f64) {
        self.tally(ast, id)
    }
    fn visit_group(&mut self, ast: &Ast, id: NodeId) {
        self.tally(ast, id)
    }
}

/// What a script touches: keys, variables, and unbounded or concurrent nodes
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Dependencies {
    pub keys: BTreeSet<String>,
    pub variables: BTreeSet<String>,
    pub uses_mouse: bool,
    pub uses_wheel: bool,
    pub uses_parallel: bool,
    pub uses_continuous: bool,
}

#[derive(Debug, Default)]
pub struct DependencyCollector {
    deps: Dependencies,
}

impl DependencyCollector {
    pub fn collect(ast: &Ast) -> Dependencies {
        let mut collector = Self::default();
        ast.accept_root(&mut collector);
        collector.deps
    }

    fn descend(&mut self, ast: &Ast, id: NodeId) {
        for &child in ast.children(id) {
            ast.accept(child, self);
        }
    }
}

impl Visitor for DependencyCollector {
    type Output = ();

    fn visit_key(&mut self, _: &Ast, _: NodeId, name: &str) {
        self.deps.keys.insert(name.to_string());
    }
    fn visit_number(&mut self, _: &Ast, _: NodeId, _: f64) {}
    fn visit_variable(&mut self, _: &Ast, _: NodeId, name: &str) {
        self.deps.variables.insert(name.to_string());
    }
    fn visit_mouse_coord(&mut self, _: &Ast, _: NodeId, _: i32, _: i32) {
        self.deps.uses_mouse = true;
    }
    fn visit_wheel(&mut self, _: &Ast, _: NodeId, _: WheelDirection, _: u32) {
        self.deps.uses_wheel = true;
    }
    fn visit_sequential(&mut self, ast: &Ast, id: NodeId) {
        self.descend(ast, id)
    }
    fn visit_simultaneous(&mut self, ast: &Ast, id: NodeId) {
        self.descend(ast, id)
    }
    fn visit_hold_chain(&mut self, ast: &Ast, id: NodeId) {
        self.descend(ast, id)
    }
    fn visit_parallel(&mut self, ast: &Ast, id: NodeId) {
        self.deps.uses_parallel = true;
        self.descend(ast, id)
    }
    fn visit_toggle(&mut self, ast: &Ast, id: NodeId) {
        self.descend(ast, id)
    }
    fn visit_repeat(&mut self, ast: &Ast, id: NodeId, _: u32) {
        self.descend(ast, id)
    }
    fn visit_continuous(&mut self, ast: &Ast, id: NodeId, _: f64) {
        self.deps.uses_continuous = true;
        self.descend(ast, id)
    }
    fn visit_delay(&mut self, ast: &Ast, id: NodeId, _: f64) {
        self.descend(ast, id)
    }
    fn visit_hold(&mut self, ast: &Ast, id: NodeId, _: f64) {
        self.descend(ast, id)
    }
    fn visit_interval(&mut self, _: &Ast, _: NodeId, _: f64) {}
    fn visit_fade(&mut self, ast: &Ast, id: NodeId, _: f64) {
        self.descend(ast, id)
    }
    fn visit_group(&mut self, ast: &Ast, id: NodeId) {
        self.descend(ast, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ast::NodeKind;

    fn sample() -> Ast {
        let mut ast = Ast::new();
        let shift = ast.push(NodeKind::Key { name: "Shift".into() }, None);
        let hold = ast.push_with_children(NodeKind::Hold { ms: 100.0 }, None, vec![shift]);
        let var = ast.push(NodeKind::Variable { name: "combo".into() }, None);
        let w = ast.push(NodeKind::Key { name: "W".into() }, None);
        let cont = ast.push_with_children(NodeKind::Continuous { interval: 50.0 }, None, vec![w]);
        let par = ast.push_with_children(NodeKind::Parallel, None, vec![var, cont]);
        let root = ast.push_with_children(NodeKind::Sequential, None, vec![hold, par]);
        ast.set_root(root);
        ast
    }

    #[test]
    fn test_node_counter() {
        let counter = NodeCounter::count(&sample());
        assert_eq!(counter.total, 7);
        assert_eq!(counter.get("Key"), 2);
        assert_eq!(counter.get("Parallel"), 1);
        assert_eq!(counter.get("Fade"), 0);
        assert_eq!(counter.max_depth, 4);
    }

    #[test]
    fn test_dependency_collector() {
        let deps = DependencyCollector::collect(&sample());
        assert_eq!(
            deps.keys.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["Shift", "W"]
        );
        assert!(deps.variables.contains("combo"));
        assert!(deps.uses_parallel);
        assert!(deps.uses_continuous);
        assert!(!deps.uses_mouse);
    }
}
