//! Syntax tree, visitor contract and tree tooling

pub mod analysis;
pub mod node;
pub mod printer;
pub mod visitor;

pub use analysis::{Dependencies, DependencyCollector, NodeCounter};
pub use node::{format_number, Ast, AstError, Node, NodeId, NodeKind, WheelDirection};
pub use printer::{ScriptFormatter, TreePrinter, TreeStyle};
pub use visitor::Visitor;
