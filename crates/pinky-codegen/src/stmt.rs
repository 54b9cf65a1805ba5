//! Statement code generation.
//!
//! Statements leave nothing on the operand stack; expression results are
//! consumed or dropped.

use pinky_types::ast::{ElifBranch, Expr, Stmt};

use crate::compiler::{CompileCtx, UserFunc};
use crate::encoder::{self, CodeWriter, ValType};
use crate::error::{CompileError, CompileResult};
use crate::expr::emit_expr;
use crate::limit;
use crate::runtime::*;
use crate::scope::ScopeStack;
use crate::types::{IMPORT_PRINT, IMPORT_PRINTLN};

/// Emit a slice of statements.
pub fn emit_stmts(
    stmts: &[Stmt],
    ctx: &mut CompileCtx,
    code: &mut CodeWriter,
) -> CompileResult<()> {
    for stmt in stmts {
        emit_stmt(stmt, ctx, code)?;
    }
    Ok(())
}

/// Emit a single statement.
pub fn emit_stmt(stmt: &Stmt, ctx: &mut CompileCtx, code: &mut CodeWriter) -> CompileResult<()> {
    match stmt {
        Stmt::Print { expr, .. } => {
            emit_expr(expr, ctx, code)?;
            code.call(IMPORT_PRINT);
            Ok(())
        }
        Stmt::Println { expr, .. } => {
            emit_expr(expr, ctx, code)?;
            code.call(IMPORT_PRINTLN);
            Ok(())
        }
        Stmt::Assign { name, value } => emit_assign(name, value, false, ctx, code),
        Stmt::LocalAssign { name, value } => emit_assign(name, value, true, ctx, code),
        Stmt::Expr(expr) => {
            emit_expr(expr, ctx, code)?;
            code.drop_();
            Ok(())
        }
        Stmt::Ret { expr, .. } => {
            emit_expr(expr, ctx, code)?;
            if !ctx.in_function {
                // `main` has no result; a top-level `ret` just stops it.
                code.drop_();
            }
            code.return_();
            Ok(())
        }
        Stmt::If {
            cond,
            then_body,
            elifs,
            else_body,
            ..
        } => emit_if(cond, then_body, elifs, else_body.as_deref(), ctx, code),
        Stmt::While { cond, body, .. } => emit_while(cond, body, ctx, code),
        Stmt::For {
            var,
            start,
            stop,
            step,
            body,
            ..
        } => emit_for(var, start, stop, step.as_ref(), body, ctx, code),
        Stmt::FuncDecl {
            name, params, body, ..
        } => emit_func_decl(name, params, body, ctx),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Assignment
// ══════════════════════════════════════════════════════════════════════════════

fn emit_assign(
    name: &pinky_types::ast::Ident,
    value: &Expr,
    is_local: bool,
    ctx: &mut CompileCtx,
    code: &mut CodeWriter,
) -> CompileResult<()> {
    emit_expr(value, ctx, code)?;
    let slot = ctx.scopes.declare(&name.name, is_local);
    code.local_set(slot);
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// If / elif / else
// ══════════════════════════════════════════════════════════════════════════════

/// Elif branches nest right-to-left: each `elif` lives in the `else` arm of
/// its predecessor. Then- and else-branches open a fresh scope.
fn emit_if(
    cond: &Expr,
    then_body: &[Stmt],
    elifs: &[ElifBranch],
    else_body: Option<&[Stmt]>,
    ctx: &mut CompileCtx,
    code: &mut CodeWriter,
) -> CompileResult<()> {
    emit_expr(cond, ctx, code)?;
    code.call(rt_func_idx(RT_IS_TRUTHY));
    code.if_empty();

    ctx.scopes.enter_scope();
    emit_stmts(then_body, ctx, code)?;
    ctx.scopes.exit_scope();

    if let Some((first, rest)) = elifs.split_first() {
        code.else_();
        emit_if(&first.cond, &first.body, rest, else_body, ctx, code)?;
    } else if let Some(else_stmts) = else_body {
        code.else_();
        ctx.scopes.enter_scope();
        emit_stmts(else_stmts, ctx, code)?;
        ctx.scopes.exit_scope();
    }

    code.end();
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// While
// ══════════════════════════════════════════════════════════════════════════════

fn emit_while(
    cond: &Expr,
    body: &[Stmt],
    ctx: &mut CompileCtx,
    code: &mut CodeWriter,
) -> CompileResult<()> {
    ctx.scopes.enter_scope();
    let counter = ctx.scopes.consume_scratch();

    code.i32_const(0);
    code.local_set(counter);
    code.block();
    code.loop_();

    limit::emit_iteration_guard(code, counter);

    emit_expr(cond, ctx, code)?;
    code.call(rt_func_idx(RT_IS_TRUTHY));
    code.i32_eqz();
    code.br_if(1);

    ctx.scopes.enter_scope();
    emit_stmts(body, ctx, code)?;
    ctx.scopes.exit_scope();

    code.br(0);
    code.end();
    code.end();

    ctx.scopes.exit_scope();
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// For
// ══════════════════════════════════════════════════════════════════════════════

/// Numeric `for`: the loop variable lives in an outer scope of its own, the
/// body in an inner one. The step defaults to boxed `+1`; descent is decided
/// once from the step's sign, and the loop exits when the comparison
/// (`i < stop` descending, `i > stop` otherwise) is crossed.
fn emit_for(
    var: &pinky_types::ast::Ident,
    start: &Expr,
    stop: &Expr,
    step: Option<&Expr>,
    body: &[Stmt],
    ctx: &mut CompileCtx,
    code: &mut CodeWriter,
) -> CompileResult<()> {
    ctx.scopes.enter_scope();

    emit_expr(start, ctx, code)?;
    let var_slot = ctx.scopes.declare(&var.name, true);
    code.local_set(var_slot);

    let stop_slot = ctx.scopes.consume_scratch();
    emit_expr(stop, ctx, code)?;
    code.local_set(stop_slot);

    let step_slot = ctx.scopes.consume_scratch();
    match step {
        Some(step_expr) => emit_expr(step_expr, ctx, code)?,
        None => {
            code.f64_const(1.0);
            code.call(rt_func_idx(RT_BOX_NUMBER));
        }
    }
    code.local_set(step_slot);

    // is_descending = step < 0, computed once; raw i32 in a scratch slot.
    let desc_slot = ctx.scopes.consume_scratch();
    code.local_get(step_slot);
    code.call(rt_func_idx(RT_UNBOX_NUMBER));
    code.f64_const(0.0);
    code.f64_lt();
    code.local_set(desc_slot);

    let counter = ctx.scopes.consume_scratch();
    code.i32_const(0);
    code.local_set(counter);

    code.block();
    code.loop_();

    limit::emit_iteration_guard(code, counter);

    // exit once the endpoint is crossed
    code.local_get(desc_slot);
    code.if_result(ValType::I32);
    code.local_get(var_slot);
    code.call(rt_func_idx(RT_UNBOX_NUMBER));
    code.local_get(stop_slot);
    code.call(rt_func_idx(RT_UNBOX_NUMBER));
    code.f64_lt();
    code.else_();
    code.local_get(var_slot);
    code.call(rt_func_idx(RT_UNBOX_NUMBER));
    code.local_get(stop_slot);
    code.call(rt_func_idx(RT_UNBOX_NUMBER));
    code.f64_gt();
    code.end();
    code.br_if(1);

    ctx.scopes.enter_scope();
    emit_stmts(body, ctx, code)?;
    ctx.scopes.exit_scope();

    // i ← i + step
    code.local_get(var_slot);
    code.call(rt_func_idx(RT_UNBOX_NUMBER));
    code.local_get(step_slot);
    code.call(rt_func_idx(RT_UNBOX_NUMBER));
    code.f64_add();
    code.call(rt_func_idx(RT_BOX_NUMBER));
    code.local_set(var_slot);

    code.br(0);
    code.end();
    code.end();

    ctx.scopes.exit_scope();
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// Function declarations
// ══════════════════════════════════════════════════════════════════════════════

/// Compile a user function body in a fresh scope stack; the outer stack and
/// slot counter are saved and restored, so functions have no lexical access
/// to enclosing bindings. The function is registered before its body is
/// lowered, so direct recursion resolves.
fn emit_func_decl(
    name: &pinky_types::ast::Ident,
    params: &[pinky_types::ast::Ident],
    body: &[Stmt],
    ctx: &mut CompileCtx,
) -> CompileResult<()> {
    if ctx.funcs.contains(&name.name) {
        return Err(CompileError::DuplicateFunction {
            name: name.name.clone(),
            span: name.span,
        });
    }

    let type_idx = ctx
        .types
        .key(vec![ValType::I32; params.len()], vec![ValType::I32]);
    let ordinal = ctx.funcs.register(&name.name, params.len());

    let saved_scopes = std::mem::replace(&mut ctx.scopes, ScopeStack::new());
    let saved_in_function = std::mem::replace(&mut ctx.in_function, true);

    for param in params {
        ctx.scopes.declare(&param.name, true);
    }
    ctx.scopes.set_param_count(params.len() as u32);

    let mut body_code = CodeWriter::new();
    emit_stmts(body, ctx, &mut body_code)?;
    // Fall-through returns boxed nil.
    body_code.call(rt_func_idx(RT_BOX_NIL));
    body_code.return_();

    let entry = encoder::function_entry(&ctx.scopes.local_decls(), body_code.bytes());

    ctx.scopes = saved_scopes;
    ctx.in_function = saved_in_function;

    ctx.funcs.finish(ordinal, UserFunc { type_idx, entry });
    Ok(())
}
