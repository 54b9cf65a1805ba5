//! Main WASM module assembler.
//!
//! Orchestrates the code generation pipeline:
//! 1. Lower the program body into a synthetic `main` function, registering
//!    user functions and interning string literals along the way
//! 2. Emit the runtime helper bodies
//! 3. Assemble all sections in the mandated order (Type, Import, Function,
//!    Memory, Global, Export, Code, Data) and return the byte vector plus
//!    the raw string-table blob as metadata

use std::collections::HashMap;

use pinky_types::ast::Program;

use crate::encoder::{self, CodeWriter, ValType};
use crate::error::{CompileError, CompileResult};
use crate::runtime::{self, RT_FUNC_COUNT};
use crate::scope::ScopeStack;
use crate::stmt::emit_stmts;
use crate::strings::StringTable;
use crate::types::*;

// ══════════════════════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════════════════════

/// A successfully compiled module.
#[derive(Debug, Clone)]
pub struct CompiledModule {
    /// The complete `.wasm` binary.
    pub bytes: Vec<u8>,
    /// The raw data-segment blob, exposed for tooling and debugging.
    pub strings: Vec<u8>,
}

/// Compile a Pinky [`Program`] into a self-contained WASM module.
///
/// Deterministic: the same AST always produces byte-identical output. On
/// failure no partial output is returned.
pub fn compile(program: &Program) -> CompileResult<CompiledModule> {
    let mut ctx = CompileCtx::new();

    // Lower the program body into `main`.
    let mut main_code = CodeWriter::new();
    emit_stmts(&program.stmts, &mut ctx, &mut main_code)?;
    let main_entry = encoder::function_entry(&ctx.scopes.local_decls(), main_code.bytes());

    // Helper bodies reference well-known strings, so they are emitted
    // against the same table the literals were interned into.
    let helper_entries = runtime::emit_all(&mut ctx.strings);

    let CompileCtx {
        strings,
        types,
        funcs,
        import_type,
        helper_types,
        main_type,
        ..
    } = ctx;

    let user_funcs = funcs.into_bodies()?;
    let user_count = user_funcs.len() as u32;
    let main_index = IMPORT_COUNT + RT_FUNC_COUNT + user_count;

    let mut module = Vec::new();
    module.extend_from_slice(&encoder::MODULE_HEADER);

    // ── Type section ─────────────────────────────────────────────────────
    module.extend_from_slice(&encoder::section(
        encoder::SECTION_TYPE,
        &types.section_payload(),
    ));

    // ── Import section ───────────────────────────────────────────────────
    let mut imports = encoder::uleb128(IMPORT_COUNT);
    for name in ["print", "println"] {
        imports.extend_from_slice(&encoder::encode_string("env"));
        imports.extend_from_slice(&encoder::encode_string(name));
        imports.push(encoder::EXTERNAL_FUNC);
        imports.extend_from_slice(&encoder::uleb128(import_type));
    }
    module.extend_from_slice(&encoder::section(encoder::SECTION_IMPORT, &imports));

    // ── Function section ─────────────────────────────────────────────────
    let mut functions = encoder::uleb128(RT_FUNC_COUNT + user_count + 1);
    for &type_idx in &helper_types {
        functions.extend_from_slice(&encoder::uleb128(type_idx));
    }
    for func in &user_funcs {
        functions.extend_from_slice(&encoder::uleb128(func.type_idx));
    }
    functions.extend_from_slice(&encoder::uleb128(main_type));
    module.extend_from_slice(&encoder::section(encoder::SECTION_FUNCTION, &functions));

    // ── Memory section ───────────────────────────────────────────────────
    let mut memory = encoder::uleb128(1);
    memory.push(0x00); // limits: min only
    memory.extend_from_slice(&encoder::uleb128(MEMORY_MIN_PAGES));
    module.extend_from_slice(&encoder::section(encoder::SECTION_MEMORY, &memory));

    // ── Global section ───────────────────────────────────────────────────
    // One mutable i32: the heap bump pointer, starting just past the
    // string table.
    let heap_start = strings.len() + 1;
    let mut globals = encoder::uleb128(1);
    globals.push(ValType::I32.byte());
    globals.push(0x01); // mutable
    let mut init = CodeWriter::new();
    init.i32_const(heap_start as i32);
    globals.extend_from_slice(init.bytes());
    globals.push(encoder::op::END);
    module.extend_from_slice(&encoder::section(encoder::SECTION_GLOBAL, &globals));

    // ── Export section ───────────────────────────────────────────────────
    let mut exports = encoder::uleb128(2);
    exports.extend_from_slice(&encoder::encode_string("main"));
    exports.push(encoder::EXTERNAL_FUNC);
    exports.extend_from_slice(&encoder::uleb128(main_index));
    exports.extend_from_slice(&encoder::encode_string("memory"));
    exports.push(encoder::EXTERNAL_MEMORY);
    exports.extend_from_slice(&encoder::uleb128(0));
    module.extend_from_slice(&encoder::section(encoder::SECTION_EXPORT, &exports));

    // ── Code section ─────────────────────────────────────────────────────
    // Runtime helpers in declaration order, then user functions in
    // declaration order, then `main`.
    let mut code = encoder::uleb128(RT_FUNC_COUNT + user_count + 1);
    for body in &helper_entries {
        code.extend_from_slice(body);
    }
    for func in &user_funcs {
        code.extend_from_slice(&func.entry);
    }
    code.extend_from_slice(&main_entry);
    module.extend_from_slice(&encoder::section(encoder::SECTION_CODE, &code));

    // ── Data section ─────────────────────────────────────────────────────
    // One active segment at memory offset 0 with the interned strings.
    let blob = strings.bytes();
    let mut data = encoder::uleb128(1);
    data.extend_from_slice(&encoder::uleb128(0)); // active, memory 0
    let mut offset = CodeWriter::new();
    offset.i32_const(0);
    data.extend_from_slice(offset.bytes());
    data.push(encoder::op::END);
    data.extend_from_slice(&encoder::uleb128(blob.len() as u32));
    data.extend_from_slice(blob);
    module.extend_from_slice(&encoder::section(encoder::SECTION_DATA, &data));

    Ok(CompiledModule {
        bytes: module,
        strings: blob.to_vec(),
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// CompileCtx — per-invocation compiler state
// ══════════════════════════════════════════════════════════════════════════════

/// All working state for one compilation.
///
/// Owned by the `compile` call and passed by exclusive reference through the
/// lowering layer, so concurrent compilations share nothing.
pub struct CompileCtx {
    /// Literal string interning / data segment.
    pub strings: StringTable,
    /// Deduplicated function signatures.
    pub types: TypeTable,
    /// Scopes and local slots of the function currently being lowered.
    pub scopes: ScopeStack,
    /// User-defined function registry.
    pub funcs: FuncRegistry,
    /// Whether lowering is inside a user function body (affects `ret`).
    pub in_function: bool,

    /// Type index of `(i32) -> ()` used by both imports.
    import_type: u32,
    /// Type index of each runtime helper, in helper order.
    helper_types: Vec<u32>,
    /// Type index of `() -> ()` used by `main`.
    main_type: u32,
}

impl CompileCtx {
    fn new() -> Self {
        let mut types = TypeTable::new();
        let import_type = types.key(vec![ValType::I32], vec![]);
        let helper_types = runtime::signatures()
            .into_iter()
            .map(|(params, results)| types.key(params, results))
            .collect();
        let main_type = types.key(vec![], vec![]);
        Self {
            strings: StringTable::new(),
            types,
            scopes: ScopeStack::new(),
            funcs: FuncRegistry::default(),
            in_function: false,
            import_type,
            helper_types,
            main_type,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// TypeTable — deduplicated function signatures
// ══════════════════════════════════════════════════════════════════════════════

type FuncType = (Vec<ValType>, Vec<ValType>);

/// Order-preserving signature pool for the type section.
#[derive(Debug, Default)]
pub struct TypeTable {
    types: Vec<FuncType>,
    index: HashMap<FuncType, u32>,
}

impl TypeTable {
    fn new() -> Self {
        Self::default()
    }

    /// Return the type index for a signature, registering it on first use.
    pub fn key(&mut self, params: Vec<ValType>, results: Vec<ValType>) -> u32 {
        let ty = (params, results);
        if let Some(&idx) = self.index.get(&ty) {
            return idx;
        }
        let idx = self.types.len() as u32;
        self.index.insert(ty.clone(), idx);
        self.types.push(ty);
        idx
    }

    /// The type-section payload.
    fn section_payload(&self) -> Vec<u8> {
        let mut payload = encoder::uleb128(self.types.len() as u32);
        for (params, results) in &self.types {
            payload.extend_from_slice(&encoder::func_type(params, results));
        }
        payload
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// FuncRegistry — user-defined functions
// ══════════════════════════════════════════════════════════════════════════════

/// A registered user function's call surface.
#[derive(Debug, Clone, Copy)]
pub struct FuncInfo {
    /// Absolute WASM function index.
    pub index: u32,
    /// Declared parameter count.
    pub arity: usize,
}

/// A finished user function body.
#[derive(Debug)]
pub struct UserFunc {
    pub type_idx: u32,
    /// Complete code-section entry (size prefix, locals, body, end).
    pub entry: Vec<u8>,
}

/// Registry of user-defined functions.
///
/// A function's name, index and arity are registered before its body is
/// lowered, so directly recursive calls resolve. The body slot is filled in
/// once lowering completes; an unfilled slot at assembly time is an internal
/// error.
#[derive(Debug, Default)]
pub struct FuncRegistry {
    by_name: HashMap<String, FuncInfo>,
    bodies: Vec<Option<UserFunc>>,
}

impl FuncRegistry {
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<FuncInfo> {
        self.by_name.get(name).copied()
    }

    /// Reserve the next function index for `name`; returns the body slot.
    pub fn register(&mut self, name: &str, arity: usize) -> usize {
        let ordinal = self.bodies.len();
        let index = IMPORT_COUNT + RT_FUNC_COUNT + ordinal as u32;
        self.by_name
            .insert(name.to_string(), FuncInfo { index, arity });
        self.bodies.push(None);
        ordinal
    }

    /// Fill in a reserved body slot.
    pub fn finish(&mut self, ordinal: usize, func: UserFunc) {
        self.bodies[ordinal] = Some(func);
    }

    fn into_bodies(self) -> CompileResult<Vec<UserFunc>> {
        self.bodies
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or_else(|| {
                    CompileError::Internal(format!("missing function body for index {i}"))
                })
            })
            .collect()
    }
}
