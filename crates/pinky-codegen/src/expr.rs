//! Expression code generation.
//!
//! Every expression lowers to a sequence leaving exactly one boxed pointer
//! (i32) on the WASM operand stack.

use pinky_types::ast::{BinOp, Expr, ExprKind, Ident, UnOp};

use crate::compiler::CompileCtx;
use crate::encoder::{CodeWriter, ValType};
use crate::error::{CompileError, CompileResult};
use crate::runtime::*;

/// Emit instructions for an expression. Leaves one boxed pointer on stack.
pub fn emit_expr(expr: &Expr, ctx: &mut CompileCtx, code: &mut CodeWriter) -> CompileResult<()> {
    match &expr.kind {
        ExprKind::Number(n) => {
            code.f64_const(*n);
            code.call(rt_func_idx(RT_BOX_NUMBER));
            Ok(())
        }
        ExprKind::Bool(b) => {
            code.i32_const(if *b { 1 } else { 0 });
            code.call(rt_func_idx(RT_BOX_BOOL));
            Ok(())
        }
        ExprKind::Str(s) => {
            let (offset, len) = ctx.strings.intern_with_len(s);
            code.i32_const(offset as i32);
            code.i32_const(len as i32);
            code.call(rt_func_idx(RT_BOX_STRING));
            Ok(())
        }
        ExprKind::Nil => {
            code.call(rt_func_idx(RT_BOX_NIL));
            Ok(())
        }
        ExprKind::Ident(name) => match ctx.scopes.lookup(name) {
            Some(slot) => {
                code.local_get(slot);
                Ok(())
            }
            None => Err(CompileError::UndeclaredVariable {
                name: name.clone(),
                span: expr.span,
            }),
        },
        ExprKind::Grouping(inner) => emit_expr(inner, ctx, code),
        ExprKind::Unary { op, operand } => emit_unary(*op, operand, ctx, code),
        ExprKind::Binary { op, left, right } => emit_binary(*op, left, right, ctx, code),
        ExprKind::Call { name, args } => emit_call(name, args, ctx, code),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Unary operators
// ══════════════════════════════════════════════════════════════════════════════

fn emit_unary(
    op: UnOp,
    operand: &Expr,
    ctx: &mut CompileCtx,
    code: &mut CodeWriter,
) -> CompileResult<()> {
    match op {
        UnOp::Pos => emit_expr(operand, ctx, code),
        UnOp::Neg => {
            // Fold a negated number literal into a single constant.
            if let ExprKind::Number(n) = &operand.kind {
                code.f64_const(-*n);
                code.call(rt_func_idx(RT_BOX_NUMBER));
                return Ok(());
            }
            emit_expr(operand, ctx, code)?;
            code.call(rt_func_idx(RT_UNBOX_NUMBER));
            code.f64_neg();
            code.call(rt_func_idx(RT_BOX_NUMBER));
            Ok(())
        }
        UnOp::Not => {
            // Logical not on truthiness, well-defined for every tag.
            emit_expr(operand, ctx, code)?;
            code.call(rt_func_idx(RT_IS_TRUTHY));
            code.i32_eqz();
            code.call(rt_func_idx(RT_BOX_BOOL));
            Ok(())
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Binary operators
// ══════════════════════════════════════════════════════════════════════════════

fn emit_binary(
    op: BinOp,
    left: &Expr,
    right: &Expr,
    ctx: &mut CompileCtx,
    code: &mut CodeWriter,
) -> CompileResult<()> {
    match op {
        BinOp::Add => emit_add(left, right, ctx, code),
        BinOp::And | BinOp::Or => emit_logical(op, left, right, ctx, code),
        BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod | BinOp::Pow => {
            emit_unboxed_operands(left, right, ctx, code)?;
            match op {
                BinOp::Sub => code.f64_sub(),
                BinOp::Mul => code.f64_mul(),
                BinOp::Div => code.f64_div(),
                BinOp::Mod => code.call(rt_func_idx(RT_MOD)),
                BinOp::Pow => code.call(rt_func_idx(RT_MATH_POW)),
                _ => unreachable!(),
            }
            code.call(rt_func_idx(RT_BOX_NUMBER));
            Ok(())
        }
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::Eq | BinOp::Ne => {
            emit_unboxed_operands(left, right, ctx, code)?;
            match op {
                BinOp::Lt => code.f64_lt(),
                BinOp::Le => code.f64_le(),
                BinOp::Gt => code.f64_gt(),
                BinOp::Ge => code.f64_ge(),
                BinOp::Eq => code.f64_eq(),
                BinOp::Ne => code.f64_ne(),
                _ => unreachable!(),
            }
            code.call(rt_func_idx(RT_BOX_BOOL));
            Ok(())
        }
    }
}

/// Evaluate both operands and unbox each as f64.
fn emit_unboxed_operands(
    left: &Expr,
    right: &Expr,
    ctx: &mut CompileCtx,
    code: &mut CodeWriter,
) -> CompileResult<()> {
    emit_expr(left, ctx, code)?;
    code.call(rt_func_idx(RT_UNBOX_NUMBER));
    emit_expr(right, ctx, code)?;
    code.call(rt_func_idx(RT_UNBOX_NUMBER));
    Ok(())
}

/// `+` dispatches at run time: string operand → concat; boolean operand →
/// coerce both through `to_number` and add; otherwise plain f64 addition.
fn emit_add(
    left: &Expr,
    right: &Expr,
    ctx: &mut CompileCtx,
    code: &mut CodeWriter,
) -> CompileResult<()> {
    let l = ctx.scopes.consume_scratch();
    let r = ctx.scopes.consume_scratch();
    emit_expr(left, ctx, code)?;
    code.local_set(l);
    emit_expr(right, ctx, code)?;
    code.local_set(r);

    code.local_get(l);
    code.call(rt_func_idx(RT_IS_STRING));
    code.local_get(r);
    code.call(rt_func_idx(RT_IS_STRING));
    code.i32_or();
    code.if_result(ValType::I32);
    {
        code.local_get(l);
        code.local_get(r);
        code.call(rt_func_idx(RT_CONCAT));
    }
    code.else_();
    {
        code.local_get(l);
        code.call(rt_func_idx(RT_IS_BOOL));
        code.local_get(r);
        code.call(rt_func_idx(RT_IS_BOOL));
        code.i32_or();
        code.if_result(ValType::I32);
        {
            code.local_get(l);
            code.call(rt_func_idx(RT_TO_NUMBER));
            code.call(rt_func_idx(RT_UNBOX_NUMBER));
            code.local_get(r);
            code.call(rt_func_idx(RT_TO_NUMBER));
            code.call(rt_func_idx(RT_UNBOX_NUMBER));
            code.f64_add();
            code.call(rt_func_idx(RT_BOX_NUMBER));
        }
        code.else_();
        {
            code.local_get(l);
            code.call(rt_func_idx(RT_UNBOX_NUMBER));
            code.local_get(r);
            code.call(rt_func_idx(RT_UNBOX_NUMBER));
            code.f64_add();
            code.call(rt_func_idx(RT_BOX_NUMBER));
        }
        code.end();
    }
    code.end();
    Ok(())
}

/// Short-circuit `and` / `or`: stash the left value in a scratch slot and
/// evaluate the right operand in one arm of a value-producing `if`.
fn emit_logical(
    op: BinOp,
    left: &Expr,
    right: &Expr,
    ctx: &mut CompileCtx,
    code: &mut CodeWriter,
) -> CompileResult<()> {
    let scratch = ctx.scopes.consume_scratch();
    emit_expr(left, ctx, code)?;
    code.local_set(scratch);
    code.local_get(scratch);
    code.call(rt_func_idx(RT_IS_TRUTHY));
    code.if_result(ValType::I32);
    if op == BinOp::And {
        emit_expr(right, ctx, code)?;
    } else {
        code.local_get(scratch);
    }
    code.else_();
    if op == BinOp::And {
        code.local_get(scratch);
    } else {
        emit_expr(right, ctx, code)?;
    }
    code.end();
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// Calls
// ══════════════════════════════════════════════════════════════════════════════

/// Type predicates exposed as user-callable built-ins. Each returns a raw
/// 0/1 which is boxed exactly once at the call site.
fn builtin_predicate(name: &str) -> Option<u32> {
    match name {
        "is_string" => Some(RT_IS_STRING),
        "is_number" => Some(RT_IS_NUMBER),
        "is_bool" => Some(RT_IS_BOOL),
        "is_nil" => Some(RT_IS_NIL),
        _ => None,
    }
}

fn emit_call(
    name: &Ident,
    args: &[Expr],
    ctx: &mut CompileCtx,
    code: &mut CodeWriter,
) -> CompileResult<()> {
    // User definitions shadow the built-in predicates.
    if let Some(info) = ctx.funcs.get(&name.name) {
        if info.arity != args.len() {
            return Err(CompileError::ArityMismatch {
                name: name.name.clone(),
                expected: info.arity,
                found: args.len(),
                span: name.span,
            });
        }
        for arg in args {
            emit_expr(arg, ctx, code)?;
        }
        code.call(info.index);
        return Ok(());
    }

    if let Some(rt) = builtin_predicate(&name.name) {
        if args.len() != 1 {
            return Err(CompileError::ArityMismatch {
                name: name.name.clone(),
                expected: 1,
                found: args.len(),
                span: name.span,
            });
        }
        emit_expr(&args[0], ctx, code)?;
        code.call(rt_func_idx(rt));
        code.call(rt_func_idx(RT_BOX_BOOL));
        return Ok(());
    }

    Err(CompileError::UndefinedFunction {
        name: name.name.clone(),
        span: name.span,
    })
}
