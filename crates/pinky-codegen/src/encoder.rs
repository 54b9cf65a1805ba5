//! Binary encoding primitives for the WASM module format.
//!
//! Pure byte-vector producers: variable-length integers per the DWARF LEB128
//! rules, IEEE-754 f64 little-endian, length-prefixed UTF-8 strings, section
//! framing, and an instruction writer over the opcode subset the compiler
//! emits.

// ── Section ids ──────────────────────────────────────────────────────────────

pub const SECTION_TYPE: u8 = 1;
pub const SECTION_IMPORT: u8 = 2;
pub const SECTION_FUNCTION: u8 = 3;
pub const SECTION_MEMORY: u8 = 5;
pub const SECTION_GLOBAL: u8 = 6;
pub const SECTION_EXPORT: u8 = 7;
pub const SECTION_CODE: u8 = 10;
pub const SECTION_DATA: u8 = 11;

/// `\0asm` magic plus version 1.
pub const MODULE_HEADER: [u8; 8] = [0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00];

/// Marks a function entity in import/export sections.
pub const EXTERNAL_FUNC: u8 = 0x00;
/// Marks a memory entity in import/export sections.
pub const EXTERNAL_MEMORY: u8 = 0x02;

/// Leading byte of a function type in the type section.
pub const FUNC_TYPE: u8 = 0x60;

// ── Value types ──────────────────────────────────────────────────────────────

/// WASM value types used by this compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValType {
    I32,
    I64,
    F64,
}

impl ValType {
    pub fn byte(self) -> u8 {
        match self {
            Self::I32 => 0x7F,
            Self::I64 => 0x7E,
            Self::F64 => 0x7C,
        }
    }
}

// ── Opcodes ──────────────────────────────────────────────────────────────────

/// The opcode bytes emitted by this compiler.
pub mod op {
    pub const UNREACHABLE: u8 = 0x00;
    pub const BLOCK: u8 = 0x02;
    pub const LOOP: u8 = 0x03;
    pub const IF: u8 = 0x04;
    pub const ELSE: u8 = 0x05;
    pub const END: u8 = 0x0B;
    pub const BR: u8 = 0x0C;
    pub const BR_IF: u8 = 0x0D;
    pub const RETURN: u8 = 0x0F;
    pub const CALL: u8 = 0x10;
    pub const DROP: u8 = 0x1A;

    pub const LOCAL_GET: u8 = 0x20;
    pub const LOCAL_SET: u8 = 0x21;
    pub const GLOBAL_GET: u8 = 0x23;
    pub const GLOBAL_SET: u8 = 0x24;

    pub const I32_LOAD: u8 = 0x28;
    pub const F64_LOAD: u8 = 0x2B;
    pub const I32_LOAD8_U: u8 = 0x2D;
    pub const I32_STORE: u8 = 0x36;
    pub const F64_STORE: u8 = 0x39;
    pub const I32_STORE8: u8 = 0x3A;

    pub const I32_CONST: u8 = 0x41;
    pub const I64_CONST: u8 = 0x42;
    pub const F64_CONST: u8 = 0x44;

    pub const I32_EQZ: u8 = 0x45;
    pub const I32_EQ: u8 = 0x46;
    pub const I32_NE: u8 = 0x47;
    pub const I32_LT_U: u8 = 0x49;
    pub const I32_GT_U: u8 = 0x4B;
    pub const I32_LE_U: u8 = 0x4D;
    pub const I32_GE_U: u8 = 0x4F;

    pub const I64_EQZ: u8 = 0x50;

    pub const F64_EQ: u8 = 0x61;
    pub const F64_NE: u8 = 0x62;
    pub const F64_LT: u8 = 0x63;
    pub const F64_GT: u8 = 0x64;
    pub const F64_LE: u8 = 0x65;
    pub const F64_GE: u8 = 0x66;

    pub const I32_ADD: u8 = 0x6A;
    pub const I32_SUB: u8 = 0x6B;
    pub const I32_OR: u8 = 0x72;

    pub const I64_DIV_U: u8 = 0x80;
    pub const I64_REM_U: u8 = 0x82;
    pub const I64_AND: u8 = 0x83;
    pub const I64_SHR_U: u8 = 0x88;

    pub const F64_ABS: u8 = 0x99;
    pub const F64_NEG: u8 = 0x9A;
    pub const F64_FLOOR: u8 = 0x9C;
    pub const F64_ADD: u8 = 0xA0;
    pub const F64_SUB: u8 = 0xA1;
    pub const F64_MUL: u8 = 0xA2;
    pub const F64_DIV: u8 = 0xA3;

    pub const I32_WRAP_I64: u8 = 0xA7;
    pub const I32_TRUNC_F64_S: u8 = 0xAA;
    pub const I64_TRUNC_F64_S: u8 = 0xB0;
    pub const F64_CONVERT_I32_S: u8 = 0xB7;
    pub const F64_CONVERT_I32_U: u8 = 0xB8;

    /// Block type byte for `block`/`loop`/`if` with no result.
    pub const BLOCKTYPE_EMPTY: u8 = 0x40;
}

// ── Integer encodings ────────────────────────────────────────────────────────

/// Unsigned LEB128.
pub fn uleb128(mut n: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    loop {
        let mut byte = (n & 0x7F) as u8;
        n >>= 7;
        if n != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if n == 0 {
            break;
        }
    }
    buf
}

/// Signed LEB128.
pub fn sleb128(mut n: i64) -> Vec<u8> {
    let mut buf = Vec::new();
    loop {
        let mut byte = (n & 0x7F) as u8;
        n >>= 7;
        if (n == 0 && (byte & 0x40) == 0) || (n == -1 && (byte & 0x40) != 0) {
            buf.push(byte);
            break;
        }
        byte |= 0x80;
        buf.push(byte);
    }
    buf
}

/// A name or data string: `uleb128(byte_length)` followed by raw UTF-8.
pub fn encode_string(s: &str) -> Vec<u8> {
    let mut buf = uleb128(s.len() as u32);
    buf.extend_from_slice(s.as_bytes());
    buf
}

/// Frame a section: `[id, uleb128(len(payload)), payload…]`.
pub fn section(id: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![id];
    buf.extend_from_slice(&uleb128(payload.len() as u32));
    buf.extend_from_slice(payload);
    buf
}

/// Encode a function type: `0x60`, params, results.
pub fn func_type(params: &[ValType], results: &[ValType]) -> Vec<u8> {
    let mut buf = vec![FUNC_TYPE];
    buf.extend_from_slice(&uleb128(params.len() as u32));
    buf.extend(params.iter().map(|t| t.byte()));
    buf.extend_from_slice(&uleb128(results.len() as u32));
    buf.extend(results.iter().map(|t| t.byte()));
    buf
}

/// Encode a local-declaration prelude from (count, type) groups.
pub fn locals_prelude(groups: &[(u32, ValType)]) -> Vec<u8> {
    let mut buf = uleb128(groups.len() as u32);
    for &(count, ty) in groups {
        buf.extend_from_slice(&uleb128(count));
        buf.push(ty.byte());
    }
    buf
}

/// Encode one code-section entry: size-prefixed locals prelude, instruction
/// bytes and the terminating `end`.
pub fn function_entry(locals: &[u8], code: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(locals.len() + code.len() + 1);
    body.extend_from_slice(locals);
    body.extend_from_slice(code);
    body.push(op::END);
    let mut entry = uleb128(body.len() as u32);
    entry.extend_from_slice(&body);
    entry
}

// ── Instruction writer ───────────────────────────────────────────────────────

/// Accumulates instruction bytes for one function body.
///
/// Every structured construct opened through this writer must be closed with
/// [`CodeWriter::end`] at the same depth; the final function-level `end` is
/// appended by [`function_entry`], not here.
#[derive(Debug, Default)]
pub struct CodeWriter {
    bytes: Vec<u8>,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    fn push(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    fn push_uleb(&mut self, n: u32) {
        self.bytes.extend_from_slice(&uleb128(n));
    }

    /// `memarg`: alignment exponent then offset. Alignment 0 (byte) is valid
    /// for every access width and matches the unaligned payload layout.
    fn push_memarg(&mut self, offset: u32) {
        self.push_uleb(0);
        self.push_uleb(offset);
    }

    // ── Control ──────────────────────────────────────────────────────────

    pub fn unreachable(&mut self) {
        self.push(op::UNREACHABLE);
    }

    pub fn block(&mut self) {
        self.push(op::BLOCK);
        self.push(op::BLOCKTYPE_EMPTY);
    }

    pub fn loop_(&mut self) {
        self.push(op::LOOP);
        self.push(op::BLOCKTYPE_EMPTY);
    }

    pub fn if_empty(&mut self) {
        self.push(op::IF);
        self.push(op::BLOCKTYPE_EMPTY);
    }

    pub fn if_result(&mut self, ty: ValType) {
        self.push(op::IF);
        self.push(ty.byte());
    }

    pub fn else_(&mut self) {
        self.push(op::ELSE);
    }

    pub fn end(&mut self) {
        self.push(op::END);
    }

    pub fn br(&mut self, depth: u32) {
        self.push(op::BR);
        self.push_uleb(depth);
    }

    pub fn br_if(&mut self, depth: u32) {
        self.push(op::BR_IF);
        self.push_uleb(depth);
    }

    pub fn return_(&mut self) {
        self.push(op::RETURN);
    }

    pub fn call(&mut self, func_index: u32) {
        self.push(op::CALL);
        self.push_uleb(func_index);
    }

    pub fn drop_(&mut self) {
        self.push(op::DROP);
    }

    // ── Variables ────────────────────────────────────────────────────────

    pub fn local_get(&mut self, idx: u32) {
        self.push(op::LOCAL_GET);
        self.push_uleb(idx);
    }

    pub fn local_set(&mut self, idx: u32) {
        self.push(op::LOCAL_SET);
        self.push_uleb(idx);
    }

    pub fn global_get(&mut self, idx: u32) {
        self.push(op::GLOBAL_GET);
        self.push_uleb(idx);
    }

    pub fn global_set(&mut self, idx: u32) {
        self.push(op::GLOBAL_SET);
        self.push_uleb(idx);
    }

    // ── Memory ───────────────────────────────────────────────────────────

    pub fn i32_load(&mut self, offset: u32) {
        self.push(op::I32_LOAD);
        self.push_memarg(offset);
    }

    pub fn f64_load(&mut self, offset: u32) {
        self.push(op::F64_LOAD);
        self.push_memarg(offset);
    }

    pub fn i32_load8_u(&mut self, offset: u32) {
        self.push(op::I32_LOAD8_U);
        self.push_memarg(offset);
    }

    pub fn i32_store(&mut self, offset: u32) {
        self.push(op::I32_STORE);
        self.push_memarg(offset);
    }

    pub fn f64_store(&mut self, offset: u32) {
        self.push(op::F64_STORE);
        self.push_memarg(offset);
    }

    pub fn i32_store8(&mut self, offset: u32) {
        self.push(op::I32_STORE8);
        self.push_memarg(offset);
    }

    // ── Constants ────────────────────────────────────────────────────────

    pub fn i32_const(&mut self, v: i32) {
        self.push(op::I32_CONST);
        self.bytes.extend_from_slice(&sleb128(v as i64));
    }

    pub fn i64_const(&mut self, v: i64) {
        self.push(op::I64_CONST);
        self.bytes.extend_from_slice(&sleb128(v));
    }

    pub fn f64_const(&mut self, v: f64) {
        self.push(op::F64_CONST);
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    // ── i32 ──────────────────────────────────────────────────────────────

    pub fn i32_eqz(&mut self) {
        self.push(op::I32_EQZ);
    }

    pub fn i32_eq(&mut self) {
        self.push(op::I32_EQ);
    }

    pub fn i32_ne(&mut self) {
        self.push(op::I32_NE);
    }

    pub fn i32_lt_u(&mut self) {
        self.push(op::I32_LT_U);
    }

    pub fn i32_gt_u(&mut self) {
        self.push(op::I32_GT_U);
    }

    pub fn i32_le_u(&mut self) {
        self.push(op::I32_LE_U);
    }

    pub fn i32_ge_u(&mut self) {
        self.push(op::I32_GE_U);
    }

    pub fn i32_add(&mut self) {
        self.push(op::I32_ADD);
    }

    pub fn i32_sub(&mut self) {
        self.push(op::I32_SUB);
    }

    pub fn i32_or(&mut self) {
        self.push(op::I32_OR);
    }

    // ── i64 ──────────────────────────────────────────────────────────────

    pub fn i64_eqz(&mut self) {
        self.push(op::I64_EQZ);
    }

    pub fn i64_div_u(&mut self) {
        self.push(op::I64_DIV_U);
    }

    pub fn i64_rem_u(&mut self) {
        self.push(op::I64_REM_U);
    }

    pub fn i64_and(&mut self) {
        self.push(op::I64_AND);
    }

    pub fn i64_shr_u(&mut self) {
        self.push(op::I64_SHR_U);
    }

    // ── f64 ──────────────────────────────────────────────────────────────

    pub fn f64_eq(&mut self) {
        self.push(op::F64_EQ);
    }

    pub fn f64_ne(&mut self) {
        self.push(op::F64_NE);
    }

    pub fn f64_lt(&mut self) {
        self.push(op::F64_LT);
    }

    pub fn f64_gt(&mut self) {
        self.push(op::F64_GT);
    }

    pub fn f64_le(&mut self) {
        self.push(op::F64_LE);
    }

    pub fn f64_ge(&mut self) {
        self.push(op::F64_GE);
    }

    pub fn f64_abs(&mut self) {
        self.push(op::F64_ABS);
    }

    pub fn f64_neg(&mut self) {
        self.push(op::F64_NEG);
    }

    pub fn f64_floor(&mut self) {
        self.push(op::F64_FLOOR);
    }

    pub fn f64_add(&mut self) {
        self.push(op::F64_ADD);
    }

    pub fn f64_sub(&mut self) {
        self.push(op::F64_SUB);
    }

    pub fn f64_mul(&mut self) {
        self.push(op::F64_MUL);
    }

    pub fn f64_div(&mut self) {
        self.push(op::F64_DIV);
    }

    // ── Conversions ──────────────────────────────────────────────────────

    pub fn i32_wrap_i64(&mut self) {
        self.push(op::I32_WRAP_I64);
    }

    pub fn i32_trunc_f64_s(&mut self) {
        self.push(op::I32_TRUNC_F64_S);
    }

    pub fn i64_trunc_f64_s(&mut self) {
        self.push(op::I64_TRUNC_F64_S);
    }

    pub fn f64_convert_i32_s(&mut self) {
        self.push(op::F64_CONVERT_I32_S);
    }

    pub fn f64_convert_i32_u(&mut self) {
        self.push(op::F64_CONVERT_I32_U);
    }
}
