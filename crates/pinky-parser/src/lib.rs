//! Pinky parser: token stream → AST.

mod parse_expr;
mod parse_stmt;
mod parser;

pub use parser::Parser;
