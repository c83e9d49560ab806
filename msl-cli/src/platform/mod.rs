//! Terminal-facing pieces of the CLI

pub mod cli;
pub mod console;

pub use cli::{print_error_with_source, print_source_context};
pub use console::ConsoleDevice;
