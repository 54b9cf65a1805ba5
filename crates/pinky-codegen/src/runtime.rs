//! Runtime helper functions emitted into every compiled module.
//!
//! These provide the dynamic-typing primitives that expression and statement
//! lowering builds upon: boxing/unboxing, type predicates, truthiness,
//! coercion, concatenation, modulus and exponentiation. Every helper's index
//! and signature is fixed at compile start and referenced symbolically by
//! the lowering layer.
//!
//! Three helpers are internal plumbing rather than part of the language
//! surface: `alloc` (the heap bump), `copy_bytes` (the module is WASM 1.0
//! MVP, so string copies are byte loops) and `stringify` (value → string
//! box, the workhorse of `concat`).

use crate::encoder::{self, CodeWriter, ValType};
use crate::strings::StringTable;
use crate::types::*;

// ══════════════════════════════════════════════════════════════════════════════
// Runtime function index offsets (relative to IMPORT_COUNT)
// ══════════════════════════════════════════════════════════════════════════════

/// Bump-allocate `size` bytes; returns the old heap pointer.
///
/// `alloc(size: i32) -> i32`
pub const RT_ALLOC: u32 = 0;

/// `box_nil() -> i32`
pub const RT_BOX_NIL: u32 = 1;

/// `box_bool(b: i32) -> i32`
pub const RT_BOX_BOOL: u32 = 2;

/// `box_number(x: f64) -> i32`
pub const RT_BOX_NUMBER: u32 = 3;

/// `box_string(offset: i32, len: i32) -> i32`
pub const RT_BOX_STRING: u32 = 4;

/// `unbox_number(ptr: i32) -> f64` — reads the f64 payload. Behaviour on a
/// non-number tag is undefined; lowering inserts `to_number` coercions where
/// required.
pub const RT_UNBOX_NUMBER: u32 = 5;

/// Tag predicates; each returns 0/1. `is_nil(ptr: i32) -> i32`, etc.
pub const RT_IS_NIL: u32 = 6;
pub const RT_IS_BOOL: u32 = 7;
pub const RT_IS_NUMBER: u32 = 8;
pub const RT_IS_STRING: u32 = 9;

/// `is_truthy(ptr: i32) -> i32` — false only for nil and for a boolean with
/// payload 0; everything else is truthy.
pub const RT_IS_TRUTHY: u32 = 10;

/// `to_number(ptr: i32) -> i32` (boxed number). Booleans coerce to 0/1,
/// numbers pass through, nil coerces to 0, strings parse as f64 or NaN.
pub const RT_TO_NUMBER: u32 = 11;

/// `copy_bytes(dst: i32, src: i32, len: i32)`
pub const RT_COPY_BYTES: u32 = 12;

/// `stringify(ptr: i32) -> i32` (boxed string). Strings pass through,
/// booleans and nil render their keyword, numbers render in decimal.
pub const RT_STRINGIFY: u32 = 13;

/// `concat(a: i32, b: i32) -> i32` — stringify each operand and concatenate
/// into a fresh heap-allocated string box.
pub const RT_CONCAT: u32 = 14;

/// `mod(a: f64, b: f64) -> f64` — floored modulus: `a - floor(a/b) * b`.
pub const RT_MOD: u32 = 15;

/// `math_pow(base: f64, exp: f64) -> f64`
pub const RT_MATH_POW: u32 = 16;

/// Total number of runtime helper functions.
pub const RT_FUNC_COUNT: u32 = 17;

/// Compute the absolute WASM function index of a runtime helper.
#[inline]
pub const fn rt_func_idx(rt_offset: u32) -> u32 {
    IMPORT_COUNT + rt_offset
}

/// Helper signatures in index order, for type-section registration.
pub fn signatures() -> Vec<(Vec<ValType>, Vec<ValType>)> {
    use ValType::{F64, I32};
    vec![
        (vec![I32], vec![I32]),           // alloc
        (vec![], vec![I32]),              // box_nil
        (vec![I32], vec![I32]),           // box_bool
        (vec![F64], vec![I32]),           // box_number
        (vec![I32, I32], vec![I32]),      // box_string
        (vec![I32], vec![F64]),           // unbox_number
        (vec![I32], vec![I32]),           // is_nil
        (vec![I32], vec![I32]),           // is_bool
        (vec![I32], vec![I32]),           // is_number
        (vec![I32], vec![I32]),           // is_string
        (vec![I32], vec![I32]),           // is_truthy
        (vec![I32], vec![I32]),           // to_number
        (vec![I32, I32, I32], vec![]),    // copy_bytes
        (vec![I32], vec![I32]),           // stringify
        (vec![I32, I32], vec![I32]),      // concat
        (vec![F64, F64], vec![F64]),      // mod
        (vec![F64, F64], vec![F64]),      // math_pow
    ]
}

/// Emit every helper body in index order as finished code-section entries.
pub fn emit_all(strings: &mut StringTable) -> Vec<Vec<u8>> {
    vec![
        emit_alloc(),
        emit_box_nil(),
        emit_box_bool(),
        emit_box_number(),
        emit_box_string(),
        emit_unbox_number(),
        emit_is_tag(TAG_NIL),
        emit_is_tag(TAG_BOOL),
        emit_is_tag(TAG_NUMBER),
        emit_is_tag(TAG_STRING),
        emit_is_truthy(),
        emit_to_number(),
        emit_copy_bytes(),
        emit_stringify(strings),
        emit_concat(),
        emit_mod(),
        emit_math_pow(),
    ]
}

fn entry(groups: &[(u32, ValType)], code: CodeWriter) -> Vec<u8> {
    encoder::function_entry(&encoder::locals_prelude(groups), code.bytes())
}

// ══════════════════════════════════════════════════════════════════════════════
// Allocation & boxing
// ══════════════════════════════════════════════════════════════════════════════

/// `alloc(size) -> i32`: return the heap pointer, then advance it by `size`.
fn emit_alloc() -> Vec<u8> {
    let mut f = CodeWriter::new();
    // local 1: old_ptr
    f.global_get(GLOBAL_HEAP_PTR);
    f.local_set(1);
    f.global_get(GLOBAL_HEAP_PTR);
    f.local_get(0);
    f.i32_add();
    f.global_set(GLOBAL_HEAP_PTR);
    f.local_get(1);
    entry(&[(1, ValType::I32)], f)
}

fn emit_box_nil() -> Vec<u8> {
    let mut f = CodeWriter::new();
    // local 0: ptr
    f.i32_const(SIZE_NIL);
    f.call(rt_func_idx(RT_ALLOC));
    f.local_set(0);
    f.local_get(0);
    f.i32_const(TAG_NIL);
    f.i32_store8(0);
    f.local_get(0);
    entry(&[(1, ValType::I32)], f)
}

fn emit_box_bool() -> Vec<u8> {
    let mut f = CodeWriter::new();
    // local 1: ptr
    f.i32_const(SIZE_BOOL);
    f.call(rt_func_idx(RT_ALLOC));
    f.local_set(1);
    f.local_get(1);
    f.i32_const(TAG_BOOL);
    f.i32_store8(0);
    f.local_get(1);
    f.local_get(0);
    f.i32_store8(PAYLOAD);
    f.local_get(1);
    entry(&[(1, ValType::I32)], f)
}

fn emit_box_number() -> Vec<u8> {
    let mut f = CodeWriter::new();
    // local 1: ptr
    f.i32_const(SIZE_NUMBER);
    f.call(rt_func_idx(RT_ALLOC));
    f.local_set(1);
    f.local_get(1);
    f.i32_const(TAG_NUMBER);
    f.i32_store8(0);
    f.local_get(1);
    f.local_get(0);
    f.f64_store(PAYLOAD);
    f.local_get(1);
    entry(&[(1, ValType::I32)], f)
}

fn emit_box_string() -> Vec<u8> {
    let mut f = CodeWriter::new();
    // local 2: ptr
    f.i32_const(SIZE_STRING);
    f.call(rt_func_idx(RT_ALLOC));
    f.local_set(2);
    f.local_get(2);
    f.i32_const(TAG_STRING);
    f.i32_store8(0);
    f.local_get(2);
    f.local_get(0);
    f.i32_store(PAYLOAD);
    f.local_get(2);
    f.local_get(1);
    f.i32_store(STRING_LEN);
    f.local_get(2);
    entry(&[(1, ValType::I32)], f)
}

fn emit_unbox_number() -> Vec<u8> {
    let mut f = CodeWriter::new();
    f.local_get(0);
    f.f64_load(PAYLOAD);
    entry(&[], f)
}

// ══════════════════════════════════════════════════════════════════════════════
// Predicates & truthiness
// ══════════════════════════════════════════════════════════════════════════════

fn emit_is_tag(tag: i32) -> Vec<u8> {
    let mut f = CodeWriter::new();
    f.local_get(0);
    f.i32_load8_u(0);
    f.i32_const(tag);
    f.i32_eq();
    entry(&[], f)
}

fn emit_is_truthy() -> Vec<u8> {
    let mut f = CodeWriter::new();
    // local 1: tag
    f.local_get(0);
    f.i32_load8_u(0);
    f.local_set(1);

    // nil → false
    f.local_get(1);
    f.i32_eqz();
    f.if_empty();
    f.i32_const(0);
    f.return_();
    f.end();

    // bool → payload != 0
    f.local_get(1);
    f.i32_const(TAG_BOOL);
    f.i32_eq();
    f.if_empty();
    f.local_get(0);
    f.i32_load8_u(PAYLOAD);
    f.i32_const(0);
    f.i32_ne();
    f.return_();
    f.end();

    // numbers and strings are always truthy
    f.i32_const(1);
    entry(&[(1, ValType::I32)], f)
}

// ══════════════════════════════════════════════════════════════════════════════
// Coercion
// ══════════════════════════════════════════════════════════════════════════════

/// `to_number`: the string path parses an optional sign, integer digits and
/// a fractional part. Anything else (trailing junk, empty content) yields
/// NaN. No exponent syntax.
fn emit_to_number() -> Vec<u8> {
    let mut f = CodeWriter::new();
    // locals: 1=tag, 2=pos, 3=end, 4=neg, 5=seen_digit, 6=ch (i32);
    //         7=val, 8=scale (f64)
    f.local_get(0);
    f.i32_load8_u(0);
    f.local_set(1);

    // number passes through
    f.local_get(1);
    f.i32_const(TAG_NUMBER);
    f.i32_eq();
    f.if_empty();
    f.local_get(0);
    f.return_();
    f.end();

    // bool → 0/1
    f.local_get(1);
    f.i32_const(TAG_BOOL);
    f.i32_eq();
    f.if_empty();
    f.local_get(0);
    f.i32_load8_u(PAYLOAD);
    f.f64_convert_i32_u();
    f.call(rt_func_idx(RT_BOX_NUMBER));
    f.return_();
    f.end();

    // nil → 0
    f.local_get(1);
    f.i32_const(TAG_NIL);
    f.i32_eq();
    f.if_empty();
    f.f64_const(0.0);
    f.call(rt_func_idx(RT_BOX_NUMBER));
    f.return_();
    f.end();

    // string → parse
    f.local_get(0);
    f.i32_load(PAYLOAD);
    f.local_set(2);
    f.local_get(2);
    f.local_get(0);
    f.i32_load(STRING_LEN);
    f.i32_add();
    f.local_set(3);

    // optional sign
    f.local_get(2);
    f.local_get(3);
    f.i32_lt_u();
    f.if_empty();
    f.local_get(2);
    f.i32_load8_u(0);
    f.local_set(6);
    f.local_get(6);
    f.i32_const(b'-' as i32);
    f.i32_eq();
    f.if_empty();
    f.i32_const(1);
    f.local_set(4);
    f.local_get(2);
    f.i32_const(1);
    f.i32_add();
    f.local_set(2);
    f.else_();
    f.local_get(6);
    f.i32_const(b'+' as i32);
    f.i32_eq();
    f.if_empty();
    f.local_get(2);
    f.i32_const(1);
    f.i32_add();
    f.local_set(2);
    f.end();
    f.end();
    f.end();

    // integer digits
    f.block();
    f.loop_();
    f.local_get(2);
    f.local_get(3);
    f.i32_ge_u();
    f.br_if(1);
    f.local_get(2);
    f.i32_load8_u(0);
    f.local_set(6);
    f.local_get(6);
    f.i32_const(b'0' as i32);
    f.i32_lt_u();
    f.br_if(1);
    f.local_get(6);
    f.i32_const(b'9' as i32);
    f.i32_gt_u();
    f.br_if(1);
    f.local_get(7);
    f.f64_const(10.0);
    f.f64_mul();
    f.local_get(6);
    f.i32_const(b'0' as i32);
    f.i32_sub();
    f.f64_convert_i32_s();
    f.f64_add();
    f.local_set(7);
    f.i32_const(1);
    f.local_set(5);
    f.local_get(2);
    f.i32_const(1);
    f.i32_add();
    f.local_set(2);
    f.br(0);
    f.end();
    f.end();

    // fractional digits
    f.local_get(2);
    f.local_get(3);
    f.i32_lt_u();
    f.if_empty();
    f.local_get(2);
    f.i32_load8_u(0);
    f.i32_const(b'.' as i32);
    f.i32_eq();
    f.if_empty();
    f.local_get(2);
    f.i32_const(1);
    f.i32_add();
    f.local_set(2);
    f.f64_const(0.1);
    f.local_set(8);
    f.block();
    f.loop_();
    f.local_get(2);
    f.local_get(3);
    f.i32_ge_u();
    f.br_if(1);
    f.local_get(2);
    f.i32_load8_u(0);
    f.local_set(6);
    f.local_get(6);
    f.i32_const(b'0' as i32);
    f.i32_lt_u();
    f.br_if(1);
    f.local_get(6);
    f.i32_const(b'9' as i32);
    f.i32_gt_u();
    f.br_if(1);
    f.local_get(7);
    f.local_get(6);
    f.i32_const(b'0' as i32);
    f.i32_sub();
    f.f64_convert_i32_s();
    f.local_get(8);
    f.f64_mul();
    f.f64_add();
    f.local_set(7);
    f.local_get(8);
    f.f64_const(0.1);
    f.f64_mul();
    f.local_set(8);
    f.i32_const(1);
    f.local_set(5);
    f.local_get(2);
    f.i32_const(1);
    f.i32_add();
    f.local_set(2);
    f.br(0);
    f.end();
    f.end();
    f.end();
    f.end();

    // trailing junk or no digits → NaN
    f.local_get(2);
    f.local_get(3);
    f.i32_ne();
    f.local_get(5);
    f.i32_eqz();
    f.i32_or();
    f.if_empty();
    f.f64_const(f64::NAN);
    f.call(rt_func_idx(RT_BOX_NUMBER));
    f.return_();
    f.end();

    // apply sign
    f.local_get(4);
    f.if_empty();
    f.local_get(7);
    f.f64_neg();
    f.local_set(7);
    f.end();
    f.local_get(7);
    f.call(rt_func_idx(RT_BOX_NUMBER));
    entry(&[(6, ValType::I32), (2, ValType::F64)], f)
}

// ══════════════════════════════════════════════════════════════════════════════
// Strings
// ══════════════════════════════════════════════════════════════════════════════

fn emit_copy_bytes() -> Vec<u8> {
    let mut f = CodeWriter::new();
    // params: 0=dst, 1=src, 2=len; local 3: i
    f.block();
    f.loop_();
    f.local_get(3);
    f.local_get(2);
    f.i32_ge_u();
    f.br_if(1);
    f.local_get(0);
    f.local_get(3);
    f.i32_add();
    f.local_get(1);
    f.local_get(3);
    f.i32_add();
    f.i32_load8_u(0);
    f.i32_store8(0);
    f.local_get(3);
    f.i32_const(1);
    f.i32_add();
    f.local_set(3);
    f.br(0);
    f.end();
    f.end();
    entry(&[(1, ValType::I32)], f)
}

/// `stringify`: strings pass through; booleans and nil render their keyword
/// from the data segment; numbers render right-to-left into a 32-byte
/// scratch buffer. Integral values (up to 2^63) render exactly; fractional
/// values carry at most six fractional digits, trailing zeros trimmed,
/// truncated not rounded. NaN renders "nan"; magnitudes at or beyond the
/// i64 range render "inf".
fn emit_stringify(strings: &mut StringTable) -> Vec<u8> {
    let (true_ptr, true_len) = strings.intern_with_len("true");
    let (false_ptr, false_len) = strings.intern_with_len("false");
    let (nil_ptr, nil_len) = strings.intern_with_len("nil");
    let (nan_ptr, nan_len) = strings.intern_with_len("nan");
    let (inf_ptr, inf_len) = strings.intern_with_len("inf");

    let mut f = CodeWriter::new();
    // locals: 1=tag (then frac-digit counter), 2=buf, 3=wpos, 4=is_neg,
    //         5=epos, 6=digit (i32); 7=ival (i64); 8=x, 9=frac (f64)
    f.local_get(0);
    f.i32_load8_u(0);
    f.local_set(1);

    // string passes through
    f.local_get(1);
    f.i32_const(TAG_STRING);
    f.i32_eq();
    f.if_empty();
    f.local_get(0);
    f.return_();
    f.end();

    // bool → "true" / "false"
    f.local_get(1);
    f.i32_const(TAG_BOOL);
    f.i32_eq();
    f.if_empty();
    f.local_get(0);
    f.i32_load8_u(PAYLOAD);
    f.if_empty();
    f.i32_const(true_ptr as i32);
    f.i32_const(true_len as i32);
    f.call(rt_func_idx(RT_BOX_STRING));
    f.return_();
    f.end();
    f.i32_const(false_ptr as i32);
    f.i32_const(false_len as i32);
    f.call(rt_func_idx(RT_BOX_STRING));
    f.return_();
    f.end();

    // nil → "nil"
    f.local_get(1);
    f.i32_const(TAG_NIL);
    f.i32_eq();
    f.if_empty();
    f.i32_const(nil_ptr as i32);
    f.i32_const(nil_len as i32);
    f.call(rt_func_idx(RT_BOX_STRING));
    f.return_();
    f.end();

    // number
    f.local_get(0);
    f.f64_load(PAYLOAD);
    f.local_set(8);

    // NaN → "nan"
    f.local_get(8);
    f.local_get(8);
    f.f64_ne();
    f.if_empty();
    f.i32_const(nan_ptr as i32);
    f.i32_const(nan_len as i32);
    f.call(rt_func_idx(RT_BOX_STRING));
    f.return_();
    f.end();

    // beyond i64 range → "inf"
    f.local_get(8);
    f.f64_abs();
    f.f64_const(9.2e18);
    f.f64_ge();
    f.if_empty();
    f.i32_const(inf_ptr as i32);
    f.i32_const(inf_len as i32);
    f.call(rt_func_idx(RT_BOX_STRING));
    f.return_();
    f.end();

    // is_neg = x < 0
    f.local_get(8);
    f.f64_const(0.0);
    f.f64_lt();
    f.local_set(4);

    // ival = trunc(|x|)
    f.local_get(8);
    f.f64_abs();
    f.f64_floor();
    f.i64_trunc_f64_s();
    f.local_set(7);

    // buf = alloc(32); integer digits go right-to-left ending at buf+24
    f.i32_const(32);
    f.call(rt_func_idx(RT_ALLOC));
    f.local_set(2);
    f.local_get(2);
    f.i32_const(24);
    f.i32_add();
    f.local_set(3);

    f.local_get(7);
    f.i64_eqz();
    f.if_empty();
    f.local_get(3);
    f.i32_const(1);
    f.i32_sub();
    f.local_set(3);
    f.local_get(3);
    f.i32_const(b'0' as i32);
    f.i32_store8(0);
    f.else_();
    f.block();
    f.loop_();
    f.local_get(7);
    f.i64_eqz();
    f.br_if(1);
    f.local_get(3);
    f.i32_const(1);
    f.i32_sub();
    f.local_set(3);
    f.local_get(3);
    f.local_get(7);
    f.i64_const(10);
    f.i64_rem_u();
    f.i32_wrap_i64();
    f.i32_const(b'0' as i32);
    f.i32_add();
    f.i32_store8(0);
    f.local_get(7);
    f.i64_const(10);
    f.i64_div_u();
    f.local_set(7);
    f.br(0);
    f.end();
    f.end();
    f.end();

    // frac = |x| - floor(|x|); epos tracks the write position past the dot
    f.local_get(2);
    f.i32_const(24);
    f.i32_add();
    f.local_set(5);
    f.local_get(8);
    f.f64_abs();
    f.local_get(8);
    f.f64_abs();
    f.f64_floor();
    f.f64_sub();
    f.local_set(9);

    f.local_get(9);
    f.f64_const(0.0);
    f.f64_gt();
    f.if_empty();
    f.local_get(5);
    f.i32_const(b'.' as i32);
    f.i32_store8(0);
    f.local_get(5);
    f.i32_const(1);
    f.i32_add();
    f.local_set(5);
    // six fractional digits; local 1 is free now and becomes the counter
    f.i32_const(0);
    f.local_set(1);
    f.block();
    f.loop_();
    f.local_get(1);
    f.i32_const(6);
    f.i32_ge_u();
    f.br_if(1);
    f.local_get(9);
    f.f64_const(10.0);
    f.f64_mul();
    f.local_set(9);
    f.local_get(9);
    f.i32_trunc_f64_s();
    f.local_set(6);
    f.local_get(5);
    f.local_get(6);
    f.i32_const(b'0' as i32);
    f.i32_add();
    f.i32_store8(0);
    f.local_get(5);
    f.i32_const(1);
    f.i32_add();
    f.local_set(5);
    f.local_get(9);
    f.local_get(6);
    f.f64_convert_i32_s();
    f.f64_sub();
    f.local_set(9);
    f.local_get(1);
    f.i32_const(1);
    f.i32_add();
    f.local_set(1);
    f.br(0);
    f.end();
    f.end();
    // trim trailing zeros, keeping one digit after the dot
    f.block();
    f.loop_();
    f.local_get(5);
    f.local_get(2);
    f.i32_const(26);
    f.i32_add();
    f.i32_le_u();
    f.br_if(1);
    f.local_get(5);
    f.i32_const(1);
    f.i32_sub();
    f.i32_load8_u(0);
    f.i32_const(b'0' as i32);
    f.i32_ne();
    f.br_if(1);
    f.local_get(5);
    f.i32_const(1);
    f.i32_sub();
    f.local_set(5);
    f.br(0);
    f.end();
    f.end();
    f.end();

    // minus sign
    f.local_get(4);
    f.if_empty();
    f.local_get(3);
    f.i32_const(1);
    f.i32_sub();
    f.local_set(3);
    f.local_get(3);
    f.i32_const(b'-' as i32);
    f.i32_store8(0);
    f.end();

    // box_string(wpos, epos - wpos)
    f.local_get(3);
    f.local_get(5);
    f.local_get(3);
    f.i32_sub();
    f.call(rt_func_idx(RT_BOX_STRING));
    entry(
        &[(6, ValType::I32), (1, ValType::I64), (2, ValType::F64)],
        f,
    )
}

fn emit_concat() -> Vec<u8> {
    let mut f = CodeWriter::new();
    // locals: 2=sa, 3=sb, 4=len_a, 5=len_b, 6=buf
    f.local_get(0);
    f.call(rt_func_idx(RT_STRINGIFY));
    f.local_set(2);
    f.local_get(1);
    f.call(rt_func_idx(RT_STRINGIFY));
    f.local_set(3);

    f.local_get(2);
    f.i32_load(STRING_LEN);
    f.local_set(4);
    f.local_get(3);
    f.i32_load(STRING_LEN);
    f.local_set(5);

    f.local_get(4);
    f.local_get(5);
    f.i32_add();
    f.call(rt_func_idx(RT_ALLOC));
    f.local_set(6);

    f.local_get(6);
    f.local_get(2);
    f.i32_load(PAYLOAD);
    f.local_get(4);
    f.call(rt_func_idx(RT_COPY_BYTES));

    f.local_get(6);
    f.local_get(4);
    f.i32_add();
    f.local_get(3);
    f.i32_load(PAYLOAD);
    f.local_get(5);
    f.call(rt_func_idx(RT_COPY_BYTES));

    f.local_get(6);
    f.local_get(4);
    f.local_get(5);
    f.i32_add();
    f.call(rt_func_idx(RT_BOX_STRING));
    entry(&[(5, ValType::I32)], f)
}

// ══════════════════════════════════════════════════════════════════════════════
// Arithmetic
// ══════════════════════════════════════════════════════════════════════════════

/// Floored modulus: the result takes the divisor's sign.
fn emit_mod() -> Vec<u8> {
    let mut f = CodeWriter::new();
    f.local_get(0);
    f.local_get(0);
    f.local_get(1);
    f.f64_div();
    f.f64_floor();
    f.local_get(1);
    f.f64_mul();
    f.f64_sub();
    entry(&[], f)
}

/// Binary exponentiation for integral exponents; negative exponents via the
/// reciprocal. A non-integral or out-of-range exponent yields NaN — WASM 1.0
/// has no transcendental opcodes to do better with.
fn emit_math_pow() -> Vec<u8> {
    let mut f = CodeWriter::new();
    // locals: 2=n (i64); 3=result, 4=b (f64)
    f.local_get(1);
    f.f64_floor();
    f.local_get(1);
    f.f64_ne();
    f.if_empty();
    f.f64_const(f64::NAN);
    f.return_();
    f.end();

    f.local_get(1);
    f.f64_abs();
    f.f64_const(1e15);
    f.f64_gt();
    f.if_empty();
    f.f64_const(f64::NAN);
    f.return_();
    f.end();

    f.local_get(1);
    f.f64_abs();
    f.i64_trunc_f64_s();
    f.local_set(2);
    f.f64_const(1.0);
    f.local_set(3);
    f.local_get(0);
    f.local_set(4);

    f.block();
    f.loop_();
    f.local_get(2);
    f.i64_eqz();
    f.br_if(1);
    f.local_get(2);
    f.i64_const(1);
    f.i64_and();
    f.i64_eqz();
    f.i32_eqz();
    f.if_empty();
    f.local_get(3);
    f.local_get(4);
    f.f64_mul();
    f.local_set(3);
    f.end();
    f.local_get(4);
    f.local_get(4);
    f.f64_mul();
    f.local_set(4);
    f.local_get(2);
    f.i64_const(1);
    f.i64_shr_u();
    f.local_set(2);
    f.br(0);
    f.end();
    f.end();

    f.local_get(1);
    f.f64_const(0.0);
    f.f64_lt();
    f.if_empty();
    f.f64_const(1.0);
    f.local_get(3);
    f.f64_div();
    f.local_set(3);
    f.end();
    f.local_get(3);
    entry(&[(1, ValType::I64), (2, ValType::F64)], f)
}
