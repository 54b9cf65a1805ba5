//! Integration tests for the Pinky WASM code generator.
//!
//! Tests validate:
//! - Minimal programs compile to valid WASM
//! - Module structure (header, imports, exports, memory, globals, data)
//! - Expression and statement compilation across the language
//! - Deterministic output (same input → same bytes)
//! - Compile errors with correct source positions

use pinky_codegen::{compile, CompileError, CompiledModule};
use pinky_lexer::Lexer;
use pinky_parser::Parser;
use pinky_types::SourceFile;
use wasmparser::{ExternalKind, Parser as WasmParser, Payload};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Parse Pinky source into a Program AST (panics on lex/parse errors).
fn parse(source: &str) -> pinky_types::ast::Program {
    let sf = SourceFile::new("test.pinky", source);
    let tokens = Lexer::new(&sf).lex().unwrap_or_else(|e| panic!("lex error: {e}"));
    Parser::new(tokens)
        .parse()
        .unwrap_or_else(|e| panic!("parse error: {e}"))
}

/// Compile Pinky source to a module (panics on error).
fn compile_source(source: &str) -> CompiledModule {
    compile(&parse(source)).unwrap_or_else(|e| panic!("codegen failed: {e}"))
}

/// Compile and return the Result for error-testing.
fn try_compile(source: &str) -> Result<CompiledModule, CompileError> {
    compile(&parse(source))
}

/// Check whether bytes validate as a WASM 1.0 module.
fn is_valid_wasm(wasm: &[u8]) -> bool {
    wasmparser::validate(wasm).is_ok()
}

/// Extract exports from WASM bytes.
fn get_exports(wasm: &[u8]) -> Vec<(String, ExternalKind)> {
    let mut exports = Vec::new();
    for payload in WasmParser::new(0).parse_all(wasm) {
        if let Ok(Payload::ExportSection(reader)) = payload {
            for export in reader {
                let exp = export.expect("valid export");
                exports.push((exp.name.to_string(), exp.kind));
            }
        }
    }
    exports
}

/// Extract import module/name pairs from WASM bytes.
fn get_imports(wasm: &[u8]) -> Vec<(String, String)> {
    let mut imports = Vec::new();
    for payload in WasmParser::new(0).parse_all(wasm) {
        if let Ok(Payload::ImportSection(reader)) = payload {
            for import in reader {
                let imp = import.expect("valid import");
                imports.push((imp.module.to_string(), imp.name.to_string()));
            }
        }
    }
    imports
}

const HELLO: &str = "println \"hello\"";

const COUNTDOWN: &str = r#"
i := 3
while i >= 1 do
  print i
  i := i - 1
end
"#;

// ══════════════════════════════════════════════════════════════════════════════
// Basic module structure
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn empty_program_compiles() {
    let module = compile_source("");
    assert!(!module.bytes.is_empty());
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn output_starts_with_wasm_magic() {
    let module = compile_source(HELLO);
    assert_eq!(
        &module.bytes[0..8],
        &[0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00]
    );
}

#[test]
fn module_exports_main_and_memory() {
    let module = compile_source(HELLO);
    let exports = get_exports(&module.bytes);
    assert_eq!(exports.len(), 2);
    let main = exports.iter().find(|(n, _)| n == "main").expect("main export");
    assert_eq!(main.1, ExternalKind::Func);
    let memory = exports
        .iter()
        .find(|(n, _)| n == "memory")
        .expect("memory export");
    assert_eq!(memory.1, ExternalKind::Memory);
}

#[test]
fn module_imports_env_print_and_println() {
    let module = compile_source(HELLO);
    assert_eq!(
        get_imports(&module.bytes),
        vec![
            ("env".to_string(), "print".to_string()),
            ("env".to_string(), "println".to_string()),
        ]
    );
}

#[test]
fn sections_in_mandated_order() {
    let module = compile_source(COUNTDOWN);
    let mut section_ids: Vec<u8> = Vec::new();
    for payload in WasmParser::new(0).parse_all(&module.bytes) {
        match payload {
            Ok(Payload::TypeSection(_)) => section_ids.push(1),
            Ok(Payload::ImportSection(_)) => section_ids.push(2),
            Ok(Payload::FunctionSection(_)) => section_ids.push(3),
            Ok(Payload::MemorySection(_)) => section_ids.push(5),
            Ok(Payload::GlobalSection(_)) => section_ids.push(6),
            Ok(Payload::ExportSection(_)) => section_ids.push(7),
            Ok(Payload::CodeSectionStart { .. }) => section_ids.push(10),
            Ok(Payload::DataSection(_)) => section_ids.push(11),
            _ => {}
        }
    }
    assert_eq!(section_ids, vec![1, 2, 3, 5, 6, 7, 10, 11]);
}

#[test]
fn string_literals_land_in_data_segment() {
    let module = compile_source("println \"zebra\"");
    let blob = String::from_utf8_lossy(&module.strings);
    assert!(blob.contains("zebra"));
    // The blob is also embedded verbatim in the module bytes.
    assert!(module
        .bytes
        .windows(module.strings.len())
        .any(|w| w == &module.strings[..]));
}

#[test]
fn repeated_literal_interned_once() {
    let module = compile_source("println \"dup\"\nprintln \"dup\"");
    let blob = String::from_utf8_lossy(&module.strings);
    assert_eq!(blob.matches("dup").count(), 1);
}

// ══════════════════════════════════════════════════════════════════════════════
// Language constructs produce valid modules
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn arithmetic_compiles() {
    let module = compile_source("println (1 + 2) * 3 - 4 / 5");
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn mod_and_pow_compile() {
    let module = compile_source("println 7 % 3\nprintln 2 ^ 10");
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn comparisons_compile() {
    let module = compile_source("println 1 < 2\nprintln 1 <= 2\nprintln 1 > 2\nprintln 1 >= 2\nprintln 1 == 2\nprintln 1 ~= 2");
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn logical_operators_compile() {
    let module = compile_source("println true and false or true");
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn unary_operators_compile() {
    let module = compile_source("x := 1\nprintln -x\nprintln +x\nprintln ~x");
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn string_concat_compiles() {
    let module = compile_source("println \"a\" + 1");
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn nil_literal_compiles() {
    let module = compile_source("x := nil\nprintln x");
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn if_elif_else_compiles() {
    let module = compile_source(
        "x := 2\nif x < 1 then println 1 elif x < 2 then println 2 elif x < 3 then println 3 else println 4 end",
    );
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn while_loop_compiles() {
    let module = compile_source(COUNTDOWN);
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn for_loop_compiles() {
    let module = compile_source("for i := 1, 10 do print i end");
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn for_loop_with_step_compiles() {
    let module = compile_source("for i := 10, 1, -2 do print i end");
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn nested_loops_compile() {
    let module = compile_source(
        "for i := 1, 3 do\n  j := 1\n  while j <= i do\n    print j\n    j := j + 1\n  end\nend",
    );
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn function_decl_and_call_compile() {
    let module = compile_source("func sq(x) ret x * x end\nprintln sq(4)");
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn function_fall_through_compiles() {
    let module = compile_source("func noop() end\nprintln noop()");
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn recursive_function_compiles() {
    let module = compile_source(
        "func fact(n)\n  if n <= 1 then ret 1 end\n  ret n * fact(n - 1)\nend\nprintln fact(5)",
    );
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn multi_param_function_compiles() {
    let module = compile_source("func add3(a, b, c) ret a + b + c end\nprintln add3(1, 2, 3)");
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn builtin_predicates_compile() {
    let module = compile_source(
        "println is_string(\"a\")\nprintln is_number(1)\nprintln is_bool(true)\nprintln is_nil(nil)",
    );
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn bare_call_statement_compiles() {
    let module = compile_source("func f() ret 1 end\nf()");
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn top_level_ret_compiles() {
    let module = compile_source("ret 1\nprintln \"unreached\"");
    assert!(is_valid_wasm(&module.bytes));
}

#[test]
fn shadowing_compiles() {
    let module = compile_source(
        "x := 1\nif true then\n  local x := 2\n  println x\nend\nprintln x",
    );
    assert!(is_valid_wasm(&module.bytes));
}

// ══════════════════════════════════════════════════════════════════════════════
// Determinism
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn deterministic_output_same_input() {
    let a = compile_source(COUNTDOWN);
    let b = compile_source(COUNTDOWN);
    assert_eq!(a.bytes, b.bytes, "same input must produce identical bytes");
    assert_eq!(a.strings, b.strings);
}

#[test]
fn deterministic_output_100_iterations() {
    let source = "func sq(x) ret x * x end\nfor i := 1, 5 do println sq(i) + \"!\" end";
    let reference = compile_source(source);
    for i in 0..100 {
        let module = compile_source(source);
        assert_eq!(
            module.bytes, reference.bytes,
            "iteration {i} produced different bytes"
        );
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Compile errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn undeclared_variable_is_an_error() {
    let err = try_compile("print x").unwrap_err();
    match err {
        CompileError::UndeclaredVariable { ref name, span } => {
            assert_eq!(name, "x");
            assert_eq!(span.line, 1);
            assert_eq!(span.column, 7);
            assert_eq!(span.length, 1);
        }
        other => panic!("expected UndeclaredVariable, got {other:?}"),
    }
}

#[test]
fn undeclared_variable_reports_exact_position() {
    let err = try_compile("x := 1\ny := x + missing").unwrap_err();
    let span = err.span().expect("span");
    assert_eq!(span.line, 2);
    assert_eq!(span.column, 10);
    assert_eq!(span.length, 7);
}

#[test]
fn duplicate_function_is_an_error() {
    let err = try_compile("func f() end\nfunc f() end").unwrap_err();
    match err {
        CompileError::DuplicateFunction { ref name, span } => {
            assert_eq!(name, "f");
            assert_eq!(span.line, 2);
        }
        other => panic!("expected DuplicateFunction, got {other:?}"),
    }
}

#[test]
fn arity_mismatch_is_an_error() {
    let err = try_compile("func f(a, b) ret a + b end\nf(1)").unwrap_err();
    match err {
        CompileError::ArityMismatch {
            expected, found, ..
        } => {
            assert_eq!(expected, 2);
            assert_eq!(found, 1);
        }
        other => panic!("expected ArityMismatch, got {other:?}"),
    }
}

#[test]
fn undefined_function_is_an_error() {
    let err = try_compile("println missing(1)").unwrap_err();
    assert!(matches!(err, CompileError::UndefinedFunction { ref name, .. } if name == "missing"));
}

#[test]
fn builtin_predicate_arity_checked() {
    let err = try_compile("println is_string(1, 2)").unwrap_err();
    assert!(matches!(err, CompileError::ArityMismatch { expected: 1, found: 2, .. }));
}

#[test]
fn error_aborts_without_output() {
    // The API returns Err, never partial bytes.
    assert!(try_compile("print x").is_err());
}

#[test]
fn scope_exit_unbinds_locals() {
    let err = try_compile("if true then local y := 1 end\nprintln y").unwrap_err();
    assert!(matches!(err, CompileError::UndeclaredVariable { ref name, .. } if name == "y"));
}

#[test]
fn functions_have_no_lexical_capture() {
    let err = try_compile("x := 1\nfunc f() ret x end").unwrap_err();
    assert!(matches!(err, CompileError::UndeclaredVariable { ref name, .. } if name == "x"));
}

#[test]
fn call_before_declaration_is_undefined() {
    let err = try_compile("f(1)\nfunc f(a) ret a end").unwrap_err();
    assert!(matches!(err, CompileError::UndefinedFunction { .. }));
}
