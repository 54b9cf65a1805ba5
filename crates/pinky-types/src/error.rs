use crate::Span;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which pipeline stage produced an error.
///
/// Three distinct categories cross the top-level boundary; downstream
/// tooling dispatches on this, so the categories must stay disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Token,
    Parse,
    Compile,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token => write!(f, "token"),
            Self::Parse => write!(f, "parse"),
            Self::Compile => write!(f, "compile"),
        }
    }
}

/// A structured Pinky compiler error.
///
/// Carries the offending source position and token length so hosts can
/// underline the exact lexeme.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{stage} error at {span}: {message}")]
pub struct PinkyError {
    pub stage: Stage,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
}

impl PinkyError {
    /// Create a new error.
    pub fn new(stage: Stage, message: impl Into<String>, span: Span) -> Self {
        Self {
            stage,
            message: message.into(),
            span,
        }
    }

    /// A lexer error.
    pub fn token(message: impl Into<String>, span: Span) -> Self {
        Self::new(Stage::Token, message, span)
    }

    /// A parser error.
    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        Self::new(Stage::Parse, message, span)
    }

    /// A code generation error.
    pub fn compile(message: impl Into<String>, span: Span) -> Self {
        Self::new(Stage::Compile, message, span)
    }
}
