//! The security labeller (§4.5): a flow-*insensitive*, purely bottom-up pass
//! that fills in every `Expr::secure` from the declaration labels already on
//! symbols. It says nothing about control flow — that's the flow analyser's
//! job (§4.7) — so an expression's `secure` here is a conservative
//! over-approximation, re-derived precisely per call site later.

use palisade_ast::walk::map_expr;
use palisade_ast::{join, AssignTarget, Expr, ExprKind, File, Label, Stmt, StmtKind};
use palisade_common::Sink;

pub fn label_stmts(stmts: Vec<Stmt>, file: &mut File, sink: &Sink) -> Vec<Stmt> {
    stmts.into_iter().map(|stmt| label_stmt(stmt, file, sink)).collect()
}

fn label_stmt(stmt: Stmt, file: &mut File, sink: &Sink) -> Stmt {
    let Stmt { kind, span } = stmt;
    let kind = match kind {
        StmtKind::Scope(inner) => StmtKind::Scope(label_stmts(inner, file, sink)),

        StmtKind::VarDef { name, symbol, array_length, value } => {
            let value = label_expr(value, file, sink);
            StmtKind::VarDef { name, symbol, array_length, value }
        }

        StmtKind::FnDef(id) => {
            let body = std::mem::replace(&mut file.fn_defs.get_mut(id).body, Stmt::new(StmtKind::Throw, span));
            let body = label_stmt(body, file, sink);
            file.fn_defs.get_mut(id).body = body;
            StmtKind::FnDef(id)
        }

        StmtKind::Assign { target, value } => {
            let value = label_expr(value, file, sink);
            let target = match target {
                AssignTarget::Scalar { name, symbol } => AssignTarget::Scalar { name, symbol },
                AssignTarget::Index { name, symbol, index } => {
                    AssignTarget::Index { name, symbol, index: label_expr(index, file, sink) }
                }
            };
            StmtKind::Assign { target, value }
        }

        StmtKind::If { cond, then_branch, else_branch } => {
            let cond = label_expr(cond, file, sink);
            let then_branch = Box::new(label_stmt(*then_branch, file, sink));
            let else_branch = else_branch.map(|e| Box::new(label_stmt(*e, file, sink)));
            StmtKind::If { cond, then_branch, else_branch }
        }

        StmtKind::While { cond, body } => {
            let cond = label_expr(cond, file, sink);
            let body = Box::new(label_stmt(*body, file, sink));
            StmtKind::While { cond, body }
        }

        StmtKind::TryCatch { try_block, catch_block } => {
            let try_block = Box::new(label_stmt(*try_block, file, sink));
            let catch_block = Box::new(label_stmt(*catch_block, file, sink));
            StmtKind::TryCatch { try_block, catch_block }
        }

        StmtKind::Throw => StmtKind::Throw,
        StmtKind::Return(e) => StmtKind::Return(label_expr(e, file, sink)),
        StmtKind::Debug(e) => StmtKind::Debug(label_expr(e, file, sink)),
        StmtKind::Global { name, symbol, direction, decl_label, ty, array_length } => {
            StmtKind::Global { name, symbol, direction, decl_label, ty, array_length }
        }
    };
    Stmt::new(kind, span)
}

fn label_expr(expr: Expr, file: &File, sink: &Sink) -> Expr {
    map_expr(expr, &mut |e| label_expr_leaf(e, file, sink))
}

fn label_expr_leaf(expr: Expr, file: &File, sink: &Sink) -> Expr {
    let Expr { kind, ty, span, .. } = expr;
    let secure = match &kind {
        ExprKind::Int(_) | ExprKind::Bool(_) => Label::Low,
        ExprKind::Id { symbol, .. } => file.symbols.get(symbol.expect("bound")).decl_label,
        ExprKind::Index { symbol, index, .. } => {
            join([index.secure, file.symbols.get(symbol.expect("bound")).decl_label])
        }
        ExprKind::ArrayLiteral(items) => join(items.iter().map(|e| e.secure)),
        ExprKind::UnOp { operand, .. } => operand.secure,
        ExprKind::BinOp { lhs, rhs, .. } => join([lhs.secure, rhs.secure]),
        ExprKind::Call { symbol, args, .. } => {
            // §4.5 labels a call with the join of its argument labels only;
            // the declared return label plays no part here, and the actual
            // result label is refined in §4.7 from the callee's reached
            // `SReturn`s.
            match &file.symbols.get(symbol.expect("bound")).ty {
                palisade_ast::Type::Fn { .. } => {}
                _ => sink.error("call to a non-function", span),
            };
            join(args.iter().map(|e| e.secure))
        }
        // Always `Low`: declassifying an expression that is not actually
        // `High` is rejected later, once the flow analyser re-derives the
        // operand's *flow-sensitive* label (§4.7).
        ExprKind::Declassify(_) => Label::Low,
    };
    Expr { kind, ty, secure, span }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_common::SourceFile;

    fn labelled(src: &str) -> File {
        let source = SourceFile::new("t.pls", src);
        let sink = Sink::new(&source).without_color();
        let mut file = palisade_parser::parse(&source, &sink);
        palisade_binder::bind(&mut file, &sink);
        let statements = std::mem::take(&mut file.statements);
        file.statements = crate::type_check::check_stmts(statements, &mut file, &sink);
        let statements = std::mem::take(&mut file.statements);
        file.statements = label_stmts(statements, &mut file, &sink);
        file
    }

    #[test]
    fn binop_joins_operand_labels() {
        let file = labelled("in{high s:int;low x:int;} out{low y:int;} y := declassify (s + x);");
        let StmtKind::VarDef { value, .. } = &file.statements[2].kind else {
            panic!("expected a var def");
        };
        let ExprKind::Declassify(inner) = &value.kind else {
            panic!("expected a declassify");
        };
        assert_eq!(inner.secure, Label::High);
        assert_eq!(value.secure, Label::Low);
    }

    #[test]
    fn array_index_joins_index_and_array_labels() {
        let file = labelled("in{low a:int[2];high i:int;} out{high y:int;} y := a[i];");
        let StmtKind::VarDef { value, .. } = &file.statements[2].kind else {
            panic!("expected a var def");
        };
        assert_eq!(value.secure, Label::High);
    }
}
