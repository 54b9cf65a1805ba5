//! Loop iteration cap.
//!
//! Every `while` and `for` loop carries an i32 counter checked at the head
//! of each iteration. Crossing the cap executes `unreachable`, trapping the
//! module, which gives untrusted scripts predictable termination.

use crate::encoder::CodeWriter;

/// Hard cap on the iterations of any single loop.
pub const MAX_ITERATIONS: u32 = 10_000;

/// Emit the per-iteration guard: trap once `counter` reaches the cap, then
/// advance it.
///
/// ```text
/// if counter >= MAX_ITERATIONS { unreachable }
/// counter += 1
/// ```
pub fn emit_iteration_guard(code: &mut CodeWriter, counter: u32) {
    code.local_get(counter);
    code.i32_const(MAX_ITERATIONS as i32);
    code.i32_ge_u();
    code.if_empty();
    code.unreachable();
    code.end();

    code.local_get(counter);
    code.i32_const(1);
    code.i32_add();
    code.local_set(counter);
}
