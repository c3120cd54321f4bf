//! The type annotator and checker (§4.4): a single bottom-up pass that fills
//! in every `Expr::ty`, assigns static types to declared symbols, and
//! rejects operand-shape, arity, and assignment-type mismatches.
//!
//! Runs before the security labeller; `Expr::secure` is untouched here.

use palisade_ast::walk::map_expr;
use palisade_ast::{
    AssignTarget, Expr, ExprKind, File, OpGroup, Stmt, StmtKind, Type,
};
use palisade_common::{Sink, Span, Spanned};

pub fn check_stmts(stmts: Vec<Stmt>, file: &mut File, sink: &Sink) -> Vec<Stmt> {
    stmts.into_iter().map(|stmt| check_stmt(stmt, file, sink)).collect()
}

fn check_stmt(stmt: Stmt, file: &mut File, sink: &Sink) -> Stmt {
    let Stmt { kind, span } = stmt;
    let kind = match kind {
        StmtKind::Scope(inner) => StmtKind::Scope(check_stmts(inner, file, sink)),

        StmtKind::VarDef { name, symbol, array_length: None, value } => {
            let value = check_expr(value, file, sink);
            file.symbols.set_type(symbol.expect("bound"), value.ty.clone());
            StmtKind::VarDef { name, symbol, array_length: None, value }
        }

        StmtKind::VarDef { name, symbol, array_length: Some(n), value } => {
            let value = check_expr(value, file, sink);
            let ExprKind::ArrayLiteral(items) = &value.kind else {
                sink.error("an array declaration's value must be an array literal", value.span())
            };
            if items.len() as u32 != n {
                sink.error(
                    format!("array literal has {} elements, declared length is {n}", items.len()),
                    value.span(),
                );
            }
            let element_ty = homogeneous_element_type(items, sink, value.span());
            let array_ty = Type::array(element_ty, n);
            file.symbols.set_type(symbol.expect("bound"), array_ty.clone());
            StmtKind::VarDef { name, symbol, array_length: Some(n), value }
        }

        StmtKind::FnDef(id) => {
            check_fn_def(id, file, sink);
            StmtKind::FnDef(id)
        }

        StmtKind::Assign { target, value } => {
            let value = check_expr(value, file, sink);
            let target = check_assign_target(target, &value, file, sink);
            StmtKind::Assign { target, value }
        }

        StmtKind::If { cond, then_branch, else_branch } => {
            let cond = check_expr(cond, file, sink);
            require_bool(&cond, sink, "an `if` condition");
            let then_branch = Box::new(check_stmt(*then_branch, file, sink));
            let else_branch = else_branch.map(|e| Box::new(check_stmt(*e, file, sink)));
            StmtKind::If { cond, then_branch, else_branch }
        }

        StmtKind::While { cond, body } => {
            let cond = check_expr(cond, file, sink);
            require_bool(&cond, sink, "a `while` condition");
            let body = Box::new(check_stmt(*body, file, sink));
            StmtKind::While { cond, body }
        }

        StmtKind::TryCatch { try_block, catch_block } => {
            let try_block = Box::new(check_stmt(*try_block, file, sink));
            let catch_block = Box::new(check_stmt(*catch_block, file, sink));
            StmtKind::TryCatch { try_block, catch_block }
        }

        StmtKind::Throw => StmtKind::Throw,

        StmtKind::Return(e) => StmtKind::Return(check_expr(e, file, sink)),
        StmtKind::Debug(e) => StmtKind::Debug(check_expr(e, file, sink)),

        // Already given its static type by `SGlobal`'s own declaration;
        // nothing left to infer.
        StmtKind::Global { name, symbol, direction, decl_label, ty, array_length } => {
            file.symbols.set_type(symbol.expect("bound"), ty.clone());
            StmtKind::Global { name, symbol, direction, decl_label, ty, array_length }
        }
    };
    Stmt::new(kind, span)
}

fn check_fn_def(id: palisade_ast::FnDefId, file: &mut File, sink: &Sink) {
    let (fn_symbol, ret_ty, param_count) = {
        let def = file.fn_defs.get(id);
        (def.symbol, def.ret_ty.clone(), def.params.len())
    };
    let mut param_tys = Vec::with_capacity(param_count);
    for i in 0..param_count {
        let (psym, pty) = {
            let p = &file.fn_defs.get(id).params[i];
            (p.symbol.expect("bound"), p.ty.clone())
        };
        file.symbols.set_type(psym, pty.clone());
        param_tys.push(pty);
    }
    // Registered before the body is checked, so a self-recursive call inside
    // it resolves to a fully-typed `Type::Fn`.
    file.symbols.set_type(
        fn_symbol,
        Type::Fn { ret: Box::new(ret_ty.clone()), params: param_tys, def: id },
    );

    let body = std::mem::replace(&mut file.fn_defs.get_mut(id).body, Stmt::new(StmtKind::Throw, Span::dummy()));
    let body = check_stmt(body, file, sink);
    check_returns(&body, &ret_ty, sink);
    file.fn_defs.get_mut(id).body = body;
}

/// Recursively scans `body` for every `SReturn`, stopping at a nested
/// `SFnDef` boundary (its own returns are checked against its own signature
/// when its `SFnDef` is visited).
fn check_returns(stmt: &Stmt, ret_ty: &Type, sink: &Sink) {
    match &stmt.kind {
        StmtKind::Scope(stmts) => stmts.iter().for_each(|s| check_returns(s, ret_ty, sink)),
        StmtKind::FnDef(_) => {}
        StmtKind::If { then_branch, else_branch, .. } => {
            check_returns(then_branch, ret_ty, sink);
            if let Some(e) = else_branch {
                check_returns(e, ret_ty, sink);
            }
        }
        StmtKind::While { body, .. } => check_returns(body, ret_ty, sink),
        StmtKind::TryCatch { try_block, catch_block } => {
            check_returns(try_block, ret_ty, sink);
            check_returns(catch_block, ret_ty, sink);
        }
        StmtKind::Return(e) => {
            if !e.ty.structurally_eq(ret_ty) {
                sink.error(
                    format!("return type `{}` does not match the declared return type `{ret_ty}`", e.ty),
                    e.span(),
                );
            }
        }
        StmtKind::VarDef { .. }
        | StmtKind::Assign { .. }
        | StmtKind::Throw
        | StmtKind::Debug(_)
        | StmtKind::Global { .. } => {}
    }
}

fn check_assign_target(target: AssignTarget, value: &Expr, file: &mut File, sink: &Sink) -> AssignTarget {
    match target {
        AssignTarget::Scalar { name, symbol } => {
            let sym = symbol.expect("bound");
            let declared = file.symbols.get(sym).ty.clone();
            if !declared.is_unresolved() && !value.ty.structurally_eq(&declared) {
                sink.error(
                    format!("cannot assign `{}` to `{name}` of type `{declared}`", value.ty),
                    value.span(),
                );
            }
            AssignTarget::Scalar { name, symbol }
        }
        AssignTarget::Index { name, symbol, index } => {
            let sym = symbol.expect("bound");
            let index = check_expr(index, file, sink);
            if !matches!(index.ty, Type::Int) {
                sink.error(format!("array index must be `int`, found `{}`", index.ty), index.span());
            }
            let array_ty = file.symbols.get(sym).ty.clone();
            let element_ty = match array_ty {
                Type::Array { of, .. } => *of,
                other => sink.error(format!("`{name}` of type `{other}` is not an array"), index.span()),
            };
            if !value.ty.structurally_eq(&element_ty) {
                sink.error(
                    format!("cannot assign `{}` to an element of type `{element_ty}`", value.ty),
                    value.span(),
                );
            }
            AssignTarget::Index { name, symbol, index }
        }
    }
}

fn homogeneous_element_type(items: &[Expr], sink: &Sink, span: Span) -> Type {
    let first = items.first().map(|e| e.ty.clone()).unwrap_or(Type::Int);
    for item in items {
        if !item.ty.structurally_eq(&first) {
            sink.error("array literal elements must all share the same type", span);
        }
    }
    first
}

fn require_bool(expr: &Expr, sink: &Sink, what: &str) {
    if !matches!(expr.ty, Type::Bool) {
        sink.error(format!("{what} must be `bool`, found `{}`", expr.ty), expr.span());
    }
}

fn check_expr(expr: Expr, file: &mut File, sink: &Sink) -> Expr {
    map_expr(expr, &mut |e| check_expr_leaf(e, file, sink))
}

fn check_expr_leaf(expr: Expr, file: &mut File, sink: &Sink) -> Expr {
    let Expr { kind, span, secure, .. } = expr;
    let (kind, ty) = match kind {
        ExprKind::Int(n) => (ExprKind::Int(n), Type::Int),
        ExprKind::Bool(b) => (ExprKind::Bool(b), Type::Bool),

        ExprKind::Id { name, symbol } => {
            let ty = file.symbols.get(symbol.expect("bound")).ty.clone();
            (ExprKind::Id { name, symbol }, ty)
        }

        ExprKind::Index { name, symbol, index } => {
            let array_ty = file.symbols.get(symbol.expect("bound")).ty.clone();
            if !matches!(index.ty, Type::Int) {
                sink.error(format!("array index must be `int`, found `{}`", index.ty), index.span());
            }
            let element_ty = match array_ty {
                Type::Array { of, .. } => *of,
                other => sink.error(format!("`{name}` of type `{other}` is not an array"), span),
            };
            (ExprKind::Index { name, symbol, index }, element_ty)
        }

        ExprKind::ArrayLiteral(items) => {
            let ty = homogeneous_element_type(&items, sink, span);
            let len = items.len() as u32;
            (ExprKind::ArrayLiteral(items), Type::array(ty, len))
        }

        ExprKind::UnOp { op, operand } => {
            use palisade_ast::UnOp;
            let ty = match op {
                UnOp::Neg | UnOp::Plus | UnOp::BitNot => {
                    require_int(&operand, sink, "this operator");
                    Type::Int
                }
                UnOp::Not => {
                    require_bool(&operand, sink, "this operator");
                    Type::Bool
                }
            };
            (ExprKind::UnOp { op, operand }, ty)
        }

        ExprKind::BinOp { op, lhs, rhs } => {
            let ty = match op.group() {
                OpGroup::Arithmetic => {
                    require_int(&lhs, sink, "this operator");
                    require_int(&rhs, sink, "this operator");
                    Type::Int
                }
                OpGroup::Boolean => {
                    require_bool(&lhs, sink, "this operator");
                    require_bool(&rhs, sink, "this operator");
                    Type::Bool
                }
                OpGroup::Comparison => {
                    require_int(&lhs, sink, "this operator");
                    require_int(&rhs, sink, "this operator");
                    Type::Bool
                }
            };
            (ExprKind::BinOp { op, lhs, rhs }, ty)
        }

        ExprKind::Call { name, symbol, args } => {
            let fn_ty = file.symbols.get(symbol.expect("bound")).ty.clone();
            let Type::Fn { ret, params, def } = fn_ty else {
                sink.error(format!("`{name}` is not callable"), span)
            };
            if args.len() != params.len() {
                sink.error(
                    format!("`{name}` takes {} argument(s), {} supplied", params.len(), args.len()),
                    span,
                );
            }
            for (arg, param_ty) in args.iter().zip(&params) {
                if !arg.ty.structurally_eq(param_ty) {
                    sink.error(
                        format!("argument of type `{}` does not match parameter type `{param_ty}`", arg.ty),
                        arg.span(),
                    );
                }
            }
            let _ = def;
            (ExprKind::Call { name, symbol, args }, *ret)
        }

        ExprKind::Declassify(inner) => {
            let ty = inner.ty.clone();
            (ExprKind::Declassify(inner), ty)
        }
    };
    Expr { kind, ty, secure, span }
}

fn require_int(expr: &Expr, sink: &Sink, what: &str) {
    if !matches!(expr.ty, Type::Int) {
        sink.error(format!("{what} requires `int`, found `{}`", expr.ty), expr.span());
    }
}
