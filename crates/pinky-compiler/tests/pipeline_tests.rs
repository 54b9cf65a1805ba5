//! End-to-end pipeline tests: compile Pinky source and execute the module
//! under the host shim, asserting on the collected output.

use pinky_compiler::compile_from_source;
use pinky_runtime::{run, RuntimeError};

/// Compile, run and join the ordered output list.
fn run_source(source: &str) -> String {
    let module = compile_from_source(source, "test.pinky")
        .unwrap_or_else(|e| panic!("compile failed: {e}"));
    let out = run(&module.bytes).unwrap_or_else(|e| panic!("run failed: {e}"));
    out.concat()
}

/// Compile successfully, then run expecting a trap.
fn run_source_trap(source: &str) -> RuntimeError {
    let module = compile_from_source(source, "test.pinky")
        .unwrap_or_else(|e| panic!("compile failed: {e}"));
    run(&module.bytes).expect_err("run should have trapped")
}

// ══════════════════════════════════════════════════════════════════════════════
// Canonical scenarios
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn hello() {
    assert_eq!(run_source("println \"hello\""), "hello\n");
}

#[test]
fn variable_and_addition() {
    assert_eq!(run_source("x := 5\nprintln x + 10"), "15\n");
}

#[test]
fn string_number_concat() {
    assert_eq!(run_source("println \"a\" + 1"), "a1\n");
}

#[test]
fn if_else() {
    assert_eq!(
        run_source("if 1 < 2 then println \"y\" else println \"n\" end"),
        "y\n"
    );
}

#[test]
fn while_loop() {
    assert_eq!(
        run_source("i := 1\nwhile i <= 3 do print i\ni := i + 1\nend"),
        "123"
    );
}

#[test]
fn function_call() {
    assert_eq!(run_source("func sq(x) ret x * x end\nprintln sq(4)"), "16\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// Printing values
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn print_value_kinds() {
    assert_eq!(run_source("println true"), "true\n");
    assert_eq!(run_source("println false"), "false\n");
    assert_eq!(run_source("println nil"), "nil\n");
    assert_eq!(run_source("println 3.5"), "3.5\n");
    assert_eq!(run_source("println -7"), "-7\n");
}

#[test]
fn print_has_no_newline() {
    assert_eq!(run_source("print \"a\"\nprint \"b\""), "ab");
}

// ══════════════════════════════════════════════════════════════════════════════
// Arithmetic & comparisons
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn arithmetic_precedence() {
    assert_eq!(run_source("println 1 + 2 * 3"), "7\n");
    assert_eq!(run_source("println (1 + 2) * 3"), "9\n");
    assert_eq!(run_source("println 10 / 4"), "2.5\n");
}

#[test]
fn comparisons_box_booleans() {
    assert_eq!(run_source("println 1 < 2"), "true\n");
    assert_eq!(run_source("println 2 <= 1"), "false\n");
    assert_eq!(run_source("println 3 == 3"), "true\n");
    assert_eq!(run_source("println 3 ~= 3"), "false\n");
}

#[test]
fn floored_modulus() {
    assert_eq!(run_source("println 7 % 3"), "1\n");
    // Floored: the result takes the divisor's sign.
    assert_eq!(run_source("println -7 % 3"), "2\n");
    assert_eq!(run_source("println 7 % -3"), "-2\n");
}

#[test]
fn integral_exponentiation() {
    assert_eq!(run_source("println 2 ^ 10"), "1024\n");
    assert_eq!(run_source("println 2 ^ 0"), "1\n");
    assert_eq!(run_source("println 2 ^ -2"), "0.25\n");
    assert_eq!(run_source("println -2 ^ 2"), "-4\n");
}

#[test]
fn unary_operators() {
    assert_eq!(run_source("x := 5\nprintln -x"), "-5\n");
    assert_eq!(run_source("println ~true"), "false\n");
    assert_eq!(run_source("println ~nil"), "true\n");
    assert_eq!(run_source("println ~0"), "false\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// `+` dispatch
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn plus_dispatch_matrix() {
    assert_eq!(run_source("println 1 + 2"), "3\n");
    assert_eq!(run_source("println \"a\" + \"b\""), "ab\n");
    assert_eq!(run_source("println 1 + \"a\""), "1a\n");
    assert_eq!(run_source("println true + 1"), "2\n");
    assert_eq!(run_source("println false + true"), "1\n");
}

#[test]
fn concat_stringifies_every_tag() {
    assert_eq!(run_source("println \"v=\" + nil"), "v=nil\n");
    assert_eq!(run_source("println \"v=\" + true"), "v=true\n");
    assert_eq!(run_source("println \"v=\" + 1.5"), "v=1.5\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// Truthiness & short-circuit
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn truthiness_table() {
    assert_eq!(run_source("if nil then print \"t\" else print \"f\" end"), "f");
    assert_eq!(
        run_source("if false then print \"t\" else print \"f\" end"),
        "f"
    );
    assert_eq!(run_source("if 0 then print \"t\" else print \"f\" end"), "t");
    assert_eq!(
        run_source("if \"\" then print \"t\" else print \"f\" end"),
        "t"
    );
}

#[test]
fn and_short_circuits() {
    let out = run_source(
        "func noisy() println \"side\" ret true end\nx := false and noisy()\nprintln x",
    );
    assert_eq!(out, "false\n");
}

#[test]
fn or_short_circuits() {
    let out = run_source(
        "func noisy() println \"side\" ret true end\nx := true or noisy()\nprintln x",
    );
    assert_eq!(out, "true\n");
}

#[test]
fn and_or_evaluate_right_when_needed() {
    assert_eq!(
        run_source("func noisy() print \"side\" ret 7 end\nprintln true and noisy()"),
        "side7\n"
    );
    assert_eq!(
        run_source("func noisy() print \"side\" ret 7 end\nprintln false or noisy()"),
        "side7\n"
    );
}

#[test]
fn logical_ops_return_operand_values() {
    assert_eq!(run_source("println 1 and 2"), "2\n");
    assert_eq!(run_source("println nil and 2"), "nil\n");
    assert_eq!(run_source("println 1 or 2"), "1\n");
    assert_eq!(run_source("println nil or 2"), "2\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// Control flow
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn elif_chain() {
    let source = "\
x := 2
if x == 1 then println \"one\"
elif x == 2 then println \"two\"
elif x == 3 then println \"three\"
else println \"many\"
end";
    assert_eq!(run_source(source), "two\n");
    let source_else = source.replace("x := 2", "x := 9");
    assert_eq!(run_source(&source_else), "many\n");
}

#[test]
fn for_ascending() {
    assert_eq!(run_source("for i := 1, 5 do print i end"), "12345");
}

#[test]
fn for_descending() {
    assert_eq!(run_source("for i := 3, 1, -1 do print i end"), "321");
}

#[test]
fn for_with_stride() {
    assert_eq!(run_source("for i := 1, 10, 3 do print i end"), "14710");
}

#[test]
fn for_zero_iterations_when_stop_below_start() {
    // Default step +1 with stop < start crosses immediately.
    assert_eq!(run_source("for i := 3, 1 do print i end"), "");
}

#[test]
fn for_zero_step_exits_immediately_when_crossed() {
    // Zero step counts as ascending; a start already past the stop exits
    // before the first iteration.
    assert_eq!(run_source("for i := 5, 1, 0 do print i end"), "");
}

#[test]
fn for_zero_step_hits_iteration_cap() {
    // Zero step with an uncrossed endpoint never advances, so the cap fires.
    let err = run_source_trap("for i := 1, 5, 0 do x := i end");
    assert!(matches!(err, RuntimeError::Trap(_)));
}

#[test]
fn for_inclusive_endpoint() {
    assert_eq!(run_source("for i := 1, 3 do print i end"), "123");
}

#[test]
fn nested_loops() {
    let source = "\
for i := 1, 3 do
  j := 1
  while j <= i do
    print j
    j := j + 1
  end
end";
    assert_eq!(run_source(source), "112123");
}

#[test]
fn while_iteration_cap_traps() {
    let err = run_source_trap("while true do x := 1 end");
    assert!(matches!(err, RuntimeError::Trap(_)));
}

#[test]
fn for_iteration_cap_traps() {
    let err = run_source_trap("for i := 1, 1000000 do x := i end");
    assert!(matches!(err, RuntimeError::Trap(_)));
}

#[test]
fn loop_under_cap_completes() {
    assert_eq!(
        run_source("n := 0\nfor i := 1, 9999 do n := n + 1 end\nprintln n"),
        "9999\n"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Scopes
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn local_shadows_then_unwinds() {
    let source = "\
x := 1
if true then
  local x := 2
  println x
end
println x";
    assert_eq!(run_source(source), "2\n1\n");
}

#[test]
fn plain_assignment_updates_enclosing_binding() {
    let source = "\
x := 1
if true then
  x := 2
end
println x";
    assert_eq!(run_source(source), "2\n");
}

#[test]
fn loop_variable_scoped_to_loop() {
    // The loop body sees the loop variable; mutation inside persists
    // across iterations of the same loop.
    assert_eq!(
        run_source("s := 0\nfor i := 1, 4 do s := s + i end\nprintln s"),
        "10\n"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn fall_through_returns_nil() {
    assert_eq!(run_source("func f() end\nprintln f()"), "nil\n");
    assert_eq!(run_source("func g() x := 1 end\nprintln g()"), "nil\n");
}

#[test]
fn recursion() {
    let source = "\
func fact(n)
  if n <= 1 then ret 1 end
  ret n * fact(n - 1)
end
println fact(5)";
    assert_eq!(run_source(source), "120\n");
}

#[test]
fn fibonacci() {
    let source = "\
func fib(n)
  if n < 2 then ret n end
  ret fib(n - 1) + fib(n - 2)
end
println fib(10)";
    assert_eq!(run_source(source), "55\n");
}

#[test]
fn multi_param_function() {
    assert_eq!(
        run_source("func add3(a, b, c) ret a + b + c end\nprintln add3(1, 2, 3)"),
        "6\n"
    );
}

#[test]
fn arguments_evaluate_left_to_right() {
    let source = "\
func tag(label, v) print label ret v end
func pair(a, b) ret a + b end
println pair(tag(\"L\", 1), tag(\"R\", 2))";
    assert_eq!(run_source(source), "LR3\n");
}

#[test]
fn function_parameters_are_local() {
    let source = "\
x := 10
func f(x) ret x + 1 end
println f(1)
println x";
    assert_eq!(run_source(source), "2\n10\n");
}

#[test]
fn ret_exits_early() {
    let source = "\
func f(n)
  if n > 0 then ret \"pos\" end
  ret \"non-pos\"
end
print f(1)
print f(0)";
    assert_eq!(run_source(source), "posnon-pos");
}

// ══════════════════════════════════════════════════════════════════════════════
// Built-in predicates
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn type_predicates() {
    assert_eq!(run_source("println is_string(\"a\")"), "true\n");
    assert_eq!(run_source("println is_string(1)"), "false\n");
    assert_eq!(run_source("println is_number(1)"), "true\n");
    assert_eq!(run_source("println is_bool(false)"), "true\n");
    assert_eq!(run_source("println is_nil(nil)"), "true\n");
    assert_eq!(run_source("println is_nil(0)"), "false\n");
}

#[test]
fn user_function_shadows_builtin_predicate() {
    assert_eq!(
        run_source("func is_string(x) ret \"mine\" end\nprintln is_string(1)"),
        "mine\n"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Coercion through to_number
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn boolean_coercion_in_addition() {
    assert_eq!(run_source("println true + true"), "2\n");
    assert_eq!(run_source("println false + 10"), "10\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// Determinism end to end
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn byte_identical_modules_across_runs() {
    let source = "func sq(x) ret x * x end\nfor i := 1, 3 do println sq(i) end";
    let a = compile_from_source(source, "a.pinky").unwrap();
    let b = compile_from_source(source, "b.pinky").unwrap();
    assert_eq!(a.bytes, b.bytes);
    assert_eq!(run(&a.bytes).unwrap(), run(&b.bytes).unwrap());
}
