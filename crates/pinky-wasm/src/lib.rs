//! Pinky compiler as a WASM module for browser environments.
//!
//! Exposes the compilation pipeline via `wasm-bindgen`, suitable for
//! running in a browser Web Worker.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init, { compile } from 'pinky-wasm';
//!
//! await init();
//!
//! const result = compile('println "hello"', "hello.pinky");
//! console.log(JSON.parse(result));
//! // { success: true, wasm: [0, 97, 115, 109, ...], ... }
//! ```

use wasm_bindgen::prelude::*;

/// Compile a Pinky source file to WASM.
///
/// Returns a JSON string containing a `CompileResult`: `success`, the
/// compiled `wasm` bytes on success, or a structured `error` with stage and
/// source position on failure.
#[wasm_bindgen]
pub fn compile(source: &str, filename: &str) -> String {
    let result = pinky_compiler::compile_to_result(source, filename);
    serde_json::to_string(&result).unwrap_or_else(|e| {
        format!(r#"{{"success":false,"error":{{"stage":"compile","message":"serialization error: {e}","line":0,"column":0,"length":0}}}}"#)
    })
}

/// Return the compiler version string.
#[wasm_bindgen]
pub fn version() -> String {
    pinky_compiler::COMPILER_VERSION.to_string()
}
