use palisade_ast::walk::map_expr;
use palisade_ast::{
    AssignTarget, Expr, ExprKind, File, GlobalDirection, Label, ScopeArena, ScopeId, Stmt, StmtKind,
    SymbolId,
};
use palisade_common::{Sink, Span, Spanned};

pub fn bind_stmts(stmts: Vec<Stmt>, scope: ScopeId, file: &mut File, sink: &Sink) -> Vec<Stmt> {
    stmts
        .into_iter()
        .map(|stmt| bind_stmt(stmt, scope, file, sink))
        .collect()
}

/// Declares a fresh symbol for `name` in `scope` and registers it there,
/// emitting *redefinition of N* with a *previously defined here* note if
/// `scope` already has a local binding for it. Shared by every declaration
/// form: `SVarDef`, `SFnDef`'s own name and parameters, and `SGlobal`.
fn declare_and_register(
    name: &str,
    span: Span,
    decl_label: Label,
    scope: ScopeId,
    file: &mut File,
    sink: &Sink,
) -> SymbolId {
    if let Some(existing) = file.scopes.local(scope, name) {
        let prev_span = file.symbols.get(existing).span;
        sink.error_continue(format!("redefinition of `{name}`"), span);
        sink.note("previously defined here", prev_span);
        sink.terminate();
    }
    let sym = file.symbols.declare(name.to_string(), decl_label, span);
    file.scopes.register(scope, name, sym);
    sym
}

fn lookup_or_fatal(name: &str, span: Span, scope: ScopeId, scopes: &ScopeArena, sink: &Sink) -> SymbolId {
    scopes
        .lookup(scope, name)
        .unwrap_or_else(|| sink.error(format!("use of undefined variable `{name}`"), span))
}

fn bind_stmt(stmt: Stmt, scope: ScopeId, file: &mut File, sink: &Sink) -> Stmt {
    let Stmt { kind, span } = stmt;
    let kind = match kind {
        StmtKind::Scope(inner) => {
            let child = file.scopes.child_of(scope);
            StmtKind::Scope(bind_stmts(inner, child, file, sink))
        }

        StmtKind::VarDef { name, array_length: None, value, .. } => {
            // Symbolise the right-hand side first, in the *enclosing* scope,
            // so a fresh `x := x + 1;` does not see its own not-yet-declared
            // `x` (§4.3). This also makes `y := y + 1;` for an already
            // in-scope `y` resolve correctly below.
            let value = bind_expr(value, scope, &file.scopes, sink);
            if let Some(sym) = file.scopes.lookup(scope, &name) {
                return Stmt::new(
                    StmtKind::Assign {
                        target: AssignTarget::Scalar { name, symbol: Some(sym) },
                        value,
                    },
                    span,
                );
            }
            let sym = declare_and_register(&name, span, Label::High, scope, file, sink);
            StmtKind::VarDef { name, symbol: Some(sym), array_length: None, value }
        }

        StmtKind::VarDef { name, array_length: Some(n), value, .. } => {
            let value = bind_expr(value, scope, &file.scopes, sink);
            let sym = declare_and_register(&name, span, Label::High, scope, file, sink);
            StmtKind::VarDef { name, symbol: Some(sym), array_length: Some(n), value }
        }

        StmtKind::FnDef(id) => {
            bind_fn_def(id, scope, file, sink);
            StmtKind::FnDef(id)
        }

        StmtKind::Assign { target, value } => {
            let value = bind_expr(value, scope, &file.scopes, sink);
            let target = bind_assign_target(target, span, scope, file, sink);
            StmtKind::Assign { target, value }
        }

        StmtKind::If { cond, then_branch, else_branch } => {
            let cond = bind_expr(cond, scope, &file.scopes, sink);
            let then_branch = Box::new(bind_stmt(*then_branch, scope, file, sink));
            let else_branch = else_branch.map(|e| Box::new(bind_stmt(*e, scope, file, sink)));
            StmtKind::If { cond, then_branch, else_branch }
        }

        StmtKind::While { cond, body } => {
            let cond = bind_expr(cond, scope, &file.scopes, sink);
            let body = Box::new(bind_stmt(*body, scope, file, sink));
            StmtKind::While { cond, body }
        }

        StmtKind::TryCatch { try_block, catch_block } => {
            let try_block = Box::new(bind_stmt(*try_block, scope, file, sink));
            let catch_block = Box::new(bind_stmt(*catch_block, scope, file, sink));
            StmtKind::TryCatch { try_block, catch_block }
        }

        StmtKind::Throw => StmtKind::Throw,

        StmtKind::Return(e) => StmtKind::Return(bind_expr(e, scope, &file.scopes, sink)),
        StmtKind::Debug(e) => StmtKind::Debug(bind_expr(e, scope, &file.scopes, sink)),

        StmtKind::Global { name, direction, decl_label, ty, array_length, .. } => {
            let sym = declare_and_register(&name, span, decl_label, scope, file, sink);
            match direction {
                GlobalDirection::In => file.inputs.push(sym),
                GlobalDirection::Out => file.outputs.push(sym),
            }
            StmtKind::Global { name, symbol: Some(sym), direction, decl_label, ty, array_length }
        }
    };
    Stmt::new(kind, span)
}

fn bind_assign_target(target: AssignTarget, span: Span, scope: ScopeId, file: &mut File, sink: &Sink) -> AssignTarget {
    match target {
        AssignTarget::Scalar { name, symbol } => {
            let symbol = symbol.unwrap_or_else(|| lookup_or_fatal(&name, span, scope, &file.scopes, sink));
            AssignTarget::Scalar { name, symbol: Some(symbol) }
        }
        AssignTarget::Index { name, symbol, index } => {
            let index_span = index.span();
            let index = bind_expr(index, scope, &file.scopes, sink);
            let symbol = symbol.unwrap_or_else(|| lookup_or_fatal(&name, index_span, scope, &file.scopes, sink));
            AssignTarget::Index { name, symbol: Some(symbol), index }
        }
    }
}

fn bind_fn_def(id: palisade_ast::FnDefId, outer_scope: ScopeId, file: &mut File, sink: &Sink) {
    let (name, fn_span, ret_label) = {
        let def = file.fn_defs.get(id);
        (def.name.clone(), def.span, def.ret_label)
    };
    // Registered in the *outer* scope before the body is visited, so the
    // function can call itself.
    let fn_symbol = declare_and_register(&name, fn_span, ret_label, outer_scope, file, sink);
    file.fn_defs.get_mut(id).symbol = fn_symbol;

    let fn_scope = file.scopes.child_of(outer_scope);
    let param_count = file.fn_defs.get(id).params.len();
    for i in 0..param_count {
        let (pname, plabel, pspan) = {
            let p = &file.fn_defs.get(id).params[i];
            (p.name.clone(), p.label, p.span)
        };
        let sym = declare_and_register(&pname, pspan, plabel, fn_scope, file, sink);
        file.fn_defs.get_mut(id).params[i].symbol = Some(sym);
    }

    let body = std::mem::replace(&mut file.fn_defs.get_mut(id).body, Stmt::new(StmtKind::Throw, Span::dummy()));
    let bound_body = bind_stmt(body, fn_scope, file, sink);
    file.fn_defs.get_mut(id).body = bound_body;
}

fn bind_expr(expr: Expr, scope: ScopeId, scopes: &ScopeArena, sink: &Sink) -> Expr {
    map_expr(expr, &mut |e| bind_expr_leaf(e, scope, scopes, sink))
}

fn bind_expr_leaf(expr: Expr, scope: ScopeId, scopes: &ScopeArena, sink: &Sink) -> Expr {
    let Expr { kind, ty, secure, span } = expr;
    let kind = match kind {
        ExprKind::Id { name, symbol: None } => {
            let sym = lookup_or_fatal(&name, span, scope, scopes, sink);
            ExprKind::Id { name, symbol: Some(sym) }
        }
        ExprKind::Index { name, symbol: None, index } => {
            let sym = lookup_or_fatal(&name, span, scope, scopes, sink);
            ExprKind::Index { name, symbol: Some(sym), index }
        }
        ExprKind::Call { name, symbol: None, args } => {
            let sym = lookup_or_fatal(&name, span, scope, scopes, sink);
            ExprKind::Call { name, symbol: Some(sym), args }
        }
        other => other,
    };
    Expr { kind, ty, secure, span }
}
