//! Codegen error types.

use pinky_types::Span;
use thiserror::Error;

/// Errors raised during WASM code generation.
///
/// Lowering is a single pass that aborts on the first error; no partial
/// output is returned. User-visible variants carry the offending node's
/// source position and token length.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("undeclared variable '{name}'")]
    UndeclaredVariable { name: String, span: Span },

    #[error("undefined function '{name}'")]
    UndefinedFunction { name: String, span: Span },

    #[error("function '{name}' expects {expected} argument(s), got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("duplicate function '{name}'")]
    DuplicateFunction { name: String, span: Span },

    #[error("unsupported operator '{op}'")]
    UnsupportedOperator { op: String, span: Span },

    /// A bug in the code generator itself; carries no source position.
    #[error("internal codegen error: {0}")]
    Internal(String),
}

impl CompileError {
    /// The source position of the offending AST node, if any.
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UndeclaredVariable { span, .. }
            | Self::UndefinedFunction { span, .. }
            | Self::ArityMismatch { span, .. }
            | Self::DuplicateFunction { span, .. }
            | Self::UnsupportedOperator { span, .. } => Some(*span),
            Self::Internal(_) => None,
        }
    }
}

/// Codegen result type alias.
pub type CompileResult<T> = Result<T, CompileError>;
