//! Runtime values and variable bindings

use crate::compiler::ast::Ast;
use crate::compiler::parser::{parse, ParseResult};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Result of evaluating a node
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Actions produce no value
    #[default]
    Unit,
    Number(f64),
    /// Literal variable binding
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => f.write_str("()"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// What a `$name` reference resolves to
#[derive(Debug, Clone)]
pub enum Binding {
    /// Returned as-is, no device action
    Literal(String),
    /// Evaluated in place of the reference
    Script(Arc<Ast>),
}

/// Variable table for one run
#[derive(Debug, Clone, Default)]
pub struct Variables {
    bindings: BTreeMap<String, Binding>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, binding: Binding) -> Option<Binding> {
        self.bindings.insert(normalize(name.into()), binding)
    }

    pub fn insert_literal(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.insert(name, Binding::Literal(value.into()));
    }

    pub fn insert_ast(&mut self, name: impl Into<String>, ast: Arc<Ast>) {
        self.insert(name, Binding::Script(ast));
    }

    /// Parse `script` and bind its tree to `name`
    pub fn insert_script(&mut self, name: impl Into<String>, script: &str) -> ParseResult<()> {
        let ast = parse(script)?;
        self.insert_ast(name, Arc::new(ast));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name.trim_start_matches('$'))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Binding> {
        self.bindings.remove(name.trim_start_matches('$'))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }
}

/// Names are stored without the `$` sigil
fn normalize(name: String) -> String {
    match name.strip_prefix('$') {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_binding() {
        let mut vars = Variables::new();
        vars.insert_literal("target", "W");
        assert!(matches!(vars.get("target"), Some(Binding::Literal(s)) if s == "W"));
        assert!(vars.contains("$target"));
    }

    #[test]
    fn test_script_binding() {
        let mut vars = Variables::new();
        vars.insert_script("$combo", "Ctrl+C").unwrap();
        match vars.get("combo") {
            Some(Binding::Script(ast)) => {
                assert_eq!(ast.to_string(), "Simultaneous(Key(Ctrl), Key(C))")
            }
            other => panic!("unexpected binding: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_script_binding() {
        let mut vars = Variables::new();
        assert!(vars.insert_script("broken", "A,").is_err());
        assert!(vars.is_empty());
    }

    #[test]
    fn test_names_sorted() {
        let mut vars = Variables::new();
        vars.insert_literal("b", "1");
        vars.insert_literal("a", "2");
        assert_eq!(vars.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(vars.remove("a").is_some());
        assert_eq!(vars.len(), 1);
    }
}
