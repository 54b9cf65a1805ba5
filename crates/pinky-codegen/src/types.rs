//! Boxed-value layout constants and module-level indices.
//!
//! Every Pinky value is stored on the linear-memory heap as a type tag byte
//! followed by a payload:
//!
//! ```text
//! offset+0 : u8 — tag (see TAG_* constants)
//! offset+1 : payload
//! ```
//!
//! | Tag      | Payload                                               |
//! |----------|-------------------------------------------------------|
//! | NIL      | none (1-byte box)                                     |
//! | BOOL     | 1 byte, 0 or 1                                        |
//! | NUMBER   | 8-byte IEEE-754 f64, little-endian                    |
//! | STRING   | 4-byte data offset + 4-byte byte length               |

// ── Value tags ───────────────────────────────────────────────────────────────

pub const TAG_NIL: i32 = 0;
pub const TAG_BOOL: i32 = 1;
pub const TAG_NUMBER: i32 = 2;
pub const TAG_STRING: i32 = 3;

// ── Box sizes (tag byte included) ────────────────────────────────────────────

pub const SIZE_NIL: i32 = 1;
pub const SIZE_BOOL: i32 = 2;
pub const SIZE_NUMBER: i32 = 9;
pub const SIZE_STRING: i32 = 9;

// ── Payload offsets within a box ─────────────────────────────────────────────

/// All payloads start right after the tag byte.
pub const PAYLOAD: u32 = 1;
/// A string box stores its byte length after the 4-byte data offset.
pub const STRING_LEN: u32 = 5;

// ── Globals ──────────────────────────────────────────────────────────────────

/// Heap bump pointer — the only global; next free byte in linear memory.
/// Initialised to `string_table_byte_length + 1`.
pub const GLOBAL_HEAP_PTR: u32 = 0;

// ── Imported function indices ────────────────────────────────────────────────
// (order must match the import section emission in compiler.rs)

/// `env.print(value_ptr: i32)`
pub const IMPORT_PRINT: u32 = 0;
/// `env.println(value_ptr: i32)`
pub const IMPORT_PRINTLN: u32 = 1;
/// Number of imported functions (offset for locally-defined indices).
pub const IMPORT_COUNT: u32 = 2;

// ── Memory ───────────────────────────────────────────────────────────────────

/// Linear memory minimum, in 64 KiB pages. No maximum is declared.
pub const MEMORY_MIN_PAGES: u32 = 16;
