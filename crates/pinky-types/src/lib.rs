//! Shared types for the Pinky compiler pipeline.
//!
//! Every stage (lexer, parser, codegen) speaks in terms of the types defined
//! here: [`Span`] source positions, the [`ast`] node tree, and the
//! three-category boundary error [`PinkyError`].

pub mod ast;
mod error;
mod span;

pub use error::{PinkyError, Stage};
pub use span::{SourceFile, Span};
