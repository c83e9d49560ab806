//! Reusable front-end building blocks.

pub mod lexer;
