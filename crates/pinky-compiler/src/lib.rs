//! Pinky compiler: orchestrates the full compilation pipeline.
//!
//! ```text
//! Pinky source → Lexer → Parser → WASM codegen → .wasm
//! ```
//!
//! Two entry points:
//! - [`compile_from_source`] — the thin façade: source text in, compiled
//!   module (or the first stage error) out.
//! - [`compile_to_result`] — the same pipeline wrapped into a
//!   JSON-serializable [`CompileResult`] for hosts and tooling.

use pinky_codegen::CompiledModule;
use pinky_types::{PinkyError, SourceFile, Span};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Compiler version (matches the Cargo package version).
pub const COMPILER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile Pinky source text into a WASM module.
///
/// Errors keep their stage: token, parse or compile.
pub fn compile_from_source(source: &str, name: &str) -> Result<CompiledModule, PinkyError> {
    let source_file = SourceFile::new(name, source);

    // 1. Lex
    let tokens = pinky_lexer::Lexer::new(&source_file).lex()?;

    // 2. Parse
    let program = pinky_parser::Parser::new(tokens).parse()?;

    // 3. Codegen
    pinky_codegen::compile(&program).map_err(|e| {
        let span = e.span().unwrap_or(Span::point(1, 1));
        PinkyError::compile(e.to_string(), span)
    })
}

/// The result of a full compilation, serializable for hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResult {
    /// Whether compilation succeeded.
    pub success: bool,
    /// The compiled `.wasm` bytes, if successful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wasm: Option<Vec<u8>>,
    /// The raw data-segment blob, if successful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strings: Option<Vec<u8>>,
    /// The first error encountered, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PinkyError>,
    /// SHA-256 of the source text (hex).
    pub source_hash: String,
    /// SHA-256 of the wasm bytes (hex), if available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wasm_hash: Option<String>,
    /// Compiler version.
    pub compiler_version: String,
}

/// Run the full pipeline and package the outcome.
pub fn compile_to_result(source: &str, name: &str) -> CompileResult {
    let source_hash = hex_sha256(source.as_bytes());
    match compile_from_source(source, name) {
        Ok(module) => CompileResult {
            success: true,
            wasm_hash: Some(hex_sha256(&module.bytes)),
            wasm: Some(module.bytes),
            strings: Some(module.strings),
            error: None,
            source_hash,
            compiler_version: COMPILER_VERSION.to_string(),
        },
        Err(error) => CompileResult {
            success: false,
            wasm: None,
            strings: None,
            error: Some(error),
            source_hash,
            wasm_hash: None,
            compiler_version: COMPILER_VERSION.to_string(),
        },
    }
}

fn hex_sha256(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
